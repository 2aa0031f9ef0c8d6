//! Thin binary entry point: delegates straight to [`cc_frontend::cli::Cli`].

fn main() -> anyhow::Result<()> {
	cc_frontend::cli::Cli::run()
}
