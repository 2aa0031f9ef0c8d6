use colored::Colorize as _;

use super::{read_source, CcFrontendCommand, CommonArgs};
use crate::{
	cli::theme::Theme,
	engine::{Engine, Stage},
};

/// `cc-frontend lex FILE...` — preprocesses then tokenizes each file and
/// dumps the resulting token stream, one token per line.
#[derive(clap::Parser)]
pub struct LexCommand {
	#[command(flatten)]
	pub common: CommonArgs,
}

impl CcFrontendCommand for LexCommand {
	fn execute(self) -> anyhow::Result<()> {
		let config = self.common.engine_config()?;
		let theme = Theme::new(!self.common.no_color);
		let engine = Engine::new(config);
		let files = self.common.resolve_files();
		let mut had_errors = false;

		for path in &files {
			if !self.common.quiet {
				println!("{} {}", "Lexing".bold().green(), path.display());
			}
			let source = read_source(path)?;
			let file_name = path.display().to_string();
			let result = engine.process(&source, &file_name, Stage::Lex);

			for token in result.tokens.as_deref().unwrap_or_default() {
				match &token.value {
					Some(value) => println!("{:<4} {:<16} {:?} {:?}", token.position.line, token.kind, token.lexeme, value),
					None => println!("{:<4} {:<16} {:?}", token.position.line, token.kind, token.lexeme),
				}
			}

			for diagnostic in result.diagnostics.all() {
				eprintln!("{}", theme.render(diagnostic, None));
			}
			had_errors |= !result.succeeded();
		}

		if had_errors {
			anyhow::bail!("lexing produced errors");
		}
		Ok(())
	}
}
