use colored::Colorize as _;

use super::{read_source, CcFrontendCommand, CommonArgs};
use crate::{
	ast::{CompactPrinter, Printer},
	cli::theme::Theme,
	engine::{Engine, Stage},
};

/// `cc-frontend parse FILE...` — preprocesses, tokenizes, and parses each
/// file, printing the resulting AST via the indented printer (default) or
/// the single-line compact printer (`--compact`).
#[derive(clap::Parser)]
pub struct ParseCommand {
	#[command(flatten)]
	pub common: CommonArgs,

	/// Render the AST as a single-line, source-like expression instead of
	/// an indented tree.
	#[arg(long)]
	pub compact: bool,
}

impl CcFrontendCommand for ParseCommand {
	fn execute(self) -> anyhow::Result<()> {
		let config = self.common.engine_config()?;
		let theme = Theme::new(!self.common.no_color);
		let engine = Engine::new(config);
		let files = self.common.resolve_files();
		let mut had_errors = false;

		for path in &files {
			if !self.common.quiet {
				println!("{} {}", "Parsing".bold().green(), path.display());
			}
			let source = read_source(path)?;
			let file_name = path.display().to_string();
			let result = engine.process(&source, &file_name, Stage::Parse);

			if let (Some(ast), Some(root)) = (&result.ast, result.ast_root) {
				let rendered = if self.compact { CompactPrinter::new().print(ast, root) } else { Printer::new().print(ast, root) };
				println!("{rendered}");
			}

			if let Some(stats) = result.parser_stats {
				if !self.common.quiet {
					println!(
						"{} tokens={} nodes={} recoveries={}",
						"stats".dimmed(),
						stats.tokens_processed,
						stats.nodes_created,
						stats.recovery_attempts
					);
				}
			}

			for diagnostic in result.diagnostics.all() {
				eprintln!("{}", theme.render(diagnostic, None));
			}
			had_errors |= !result.succeeded();
		}

		if had_errors {
			anyhow::bail!("parsing produced errors");
		}
		Ok(())
	}
}
