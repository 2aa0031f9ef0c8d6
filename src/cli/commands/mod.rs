//! The CLI's three subcommands — `preprocess`, `lex`, `parse` — dispatched
//! through a closed `Subcommand` enum the way the teacher's
//! `cli::commands::SubCommand` dispatches `run`/`set`/`new`/`add`.

pub mod lex;
pub mod parse;
pub mod preprocess;

use std::path::{Path, PathBuf};

use lex::LexCommand;
use parse::ParseCommand;
use preprocess::PreprocessCommand;

use crate::{config::EngineConfig, dialect::CStandard};

#[enum_dispatch::enum_dispatch]
pub trait CcFrontendCommand {
	/// Executes this subcommand, returning an error only for I/O or
	/// configuration failures — a translation unit with diagnostics is
	/// still a successful run; `execute` reports them and returns `Ok(())`
	/// unless `--fail-on-error` was passed, in which case a nonzero exit is
	/// signalled through the returned error.
	fn execute(self) -> anyhow::Result<()>;
}

#[derive(clap::Subcommand)]
#[enum_dispatch::enum_dispatch(CcFrontendCommand)]
pub enum Subcommand {
	/// Emit the fully macro-expanded translation unit and its position map.
	Preprocess(PreprocessCommand),
	/// Tokenize (after preprocessing) and dump the resulting token stream.
	Lex(LexCommand),
	/// Parse and dump the resulting AST, via the printer or compact printer.
	Parse(ParseCommand),
}

/// Flags shared by every subcommand — the closed configuration surface of
/// §6, exposed as CLI flags layered over `cc-frontend.toml` and then over
/// built-in defaults (`EngineConfig::default()`), mirroring the teacher's
/// config-file-then-CLI-flags layering in `api/config_files.rs`.
#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
	/// One or more `.c`/`.h` files, or a directory to discover them in.
	pub paths: Vec<PathBuf>,

	/// The C dialect to target.
	#[arg(long, value_name = "DIALECT", default_value = "c17")]
	pub standard: CStandard,

	/// Seeds a predefined macro as `NAME=BODY` (or bare `NAME` for an empty
	/// body). May be repeated.
	#[arg(short = 'D', long = "define", value_name = "NAME[=BODY]")]
	pub defines: Vec<String>,

	/// A directory to search for `#include`s. Accepted for CLI-surface
	/// completeness even though resolution is out of scope (§1); stored on
	/// `EngineConfig::include_paths` and otherwise unused.
	#[arg(short = 'I', long = "include-path", value_name = "DIR")]
	pub include_paths: Vec<PathBuf>,

	/// Path to a `cc-frontend.toml` project file layered under these flags.
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// The maximum number of errors accepted before halting (§6).
	#[arg(long, value_name = "N")]
	pub max_errors: Option<u32>,

	/// Rejects nonstandard extensions.
	#[arg(long)]
	pub strict: bool,

	/// Disables parser error recovery (stop at the first syntax error).
	#[arg(long)]
	pub no_recover: bool,

	/// Suppresses the per-file progress banner.
	#[arg(short, long)]
	pub quiet: bool,

	/// Disables ANSI coloring of diagnostics.
	#[arg(long)]
	pub no_color: bool,
}

impl CommonArgs {
	/// Builds the `EngineConfig` this invocation implies: defaults,
	/// overridden by `--config`'s TOML file, overridden by these flags —
	/// the same three-layer precedence SPEC_FULL §B describes.
	pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
		let mut config = EngineConfig::default();
		if let Some(path) = &self.config {
			config = config.merge_toml_file(path)?;
		} else {
			config = config.merge_toml_file(Path::new("cc-frontend.toml"))?;
		}

		config.c_standard = self.standard;
		config.include_paths.extend(self.include_paths.iter().cloned());
		if let Some(max_errors) = self.max_errors {
			config.max_errors = max_errors;
		}
		if self.strict {
			config.strict_mode = true;
		}
		if self.no_recover {
			config.recovery_enabled = false;
		}
		for define in &self.defines {
			let (name, body) = define.split_once('=').map_or((define.as_str(), ""), |(name, body)| (name, body));
			config.predefined_macros.push((name.to_owned(), body.to_owned()));
		}

		Ok(config)
	}

	/// Expands `self.paths` into the concrete list of files to process:
	/// files are taken as-is, directories are walked (via `walkdir`) for
	/// `*.c`/`*.h` entries, mirroring `cabin format`'s directory handling.
	#[must_use]
	pub fn resolve_files(&self) -> Vec<PathBuf> {
		let mut files = Vec::new();
		for path in &self.paths {
			if path.is_dir() {
				for entry in walkdir::WalkDir::new(path).into_iter().filter_map(Result::ok) {
					let is_source = entry.path().extension().is_some_and(|extension| extension == "c" || extension == "h");
					if entry.file_type().is_file() && is_source {
						files.push(entry.path().to_path_buf());
					}
				}
			} else {
				files.push(path.clone());
			}
		}
		files
	}
}

pub(crate) fn read_source(path: &Path) -> anyhow::Result<String> {
	std::fs::read_to_string(path).map_err(|error| anyhow::anyhow!("failed to read '{}': {error}", path.display()))
}
