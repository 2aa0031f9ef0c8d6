use colored::Colorize as _;

use super::{read_source, CcFrontendCommand, CommonArgs};
use crate::{
	cli::theme::Theme,
	engine::{Engine, Stage},
};

/// `cc-frontend preprocess FILE...` — emits the fully macro-expanded
/// translation unit text for each file.
#[derive(clap::Parser)]
pub struct PreprocessCommand {
	#[command(flatten)]
	pub common: CommonArgs,
}

impl CcFrontendCommand for PreprocessCommand {
	fn execute(self) -> anyhow::Result<()> {
		let config = self.common.engine_config()?;
		let theme = Theme::new(!self.common.no_color);
		let engine = Engine::new(config);
		let files = self.common.resolve_files();
		let mut had_errors = false;

		for path in &files {
			if !self.common.quiet {
				println!("{} {}", "Preprocessing".bold().green(), path.display());
			}
			let source = read_source(path)?;
			let file_name = path.display().to_string();
			let result = engine.process(&source, &file_name, Stage::Preprocess);

			print!("{}", result.expanded_text);

			for diagnostic in result.diagnostics.all() {
				eprintln!("{}", theme.render(diagnostic, None));
			}
			had_errors |= !result.succeeded();
		}

		if had_errors {
			anyhow::bail!("preprocessing produced errors");
		}
		Ok(())
	}
}
