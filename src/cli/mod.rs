//! The `cc-frontend` command-line front end: a `clap`-derived argument
//! parser dispatching to the three subcommands in [`commands`], following
//! the teacher's own `cli::commands::SubCommand` + `enum_dispatch` layout.

pub mod commands;
pub mod theme;

use commands::{CcFrontendCommand as _, Subcommand};

/// The long `--help` body, authored as an indented literal for readability
/// in this file and unindented once at startup, the same way the teacher
/// keeps multi-line Cabin snippets indented in source.
fn long_about() -> String {
	unindent::unindent(
		"
		A configurable C89/C99/C11/C17/C23 preprocessor, lexer, and
		recursive-descent parser.

		`preprocess` emits the fully macro-expanded translation unit;
		`lex` additionally tokenizes it; `parse` additionally builds
		and prints the AST. Each subcommand accepts the same
		`--standard`/`--define`/`--include-path` configuration surface.
		",
	)
}

/// The top-level CLI, parsed directly from `std::env::args` by `main`.
#[derive(clap::Parser)]
#[command(name = "cc-frontend", version, about = "A configurable C89/C99/C11/C17/C23 preprocessor, lexer, and parser.")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Subcommand,
}

impl Cli {
	/// Parses `std::env::args` and runs the selected subcommand. The
	/// generated `clap::Command` is given its long-form `--help` body here
	/// (rather than via the derive attribute) so it can be authored as a
	/// readable indented literal and unindented once at startup.
	pub fn run() -> anyhow::Result<()> {
		use clap::{CommandFactory as _, FromArgMatches as _};

		let matches = Self::command().long_about(long_about()).get_matches();
		let cli = Self::from_arg_matches(&matches).unwrap_or_else(|error| error.exit());
		cli.command.execute()
	}
}
