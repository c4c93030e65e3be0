use anyhow::Result;
use clap::Parser;
use story_gan::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("story_gan=info".parse()?),
        )
        // stdout is reserved for the JSON printed by `generate` and `status`
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.run()
}
