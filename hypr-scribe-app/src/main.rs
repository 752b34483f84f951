mod bootstrap;
mod prompt;
mod repl;
mod settings;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = settings::Settings::load()?;
    init_tracing(settings.agent.debug);

    let runtime = bootstrap::build(&settings)?;

    println!("hypr-scribe — conversational Hyprland configuration assistant");
    println!("Detected backend: {}", runtime.kind);
    println!("Type :quit to exit, :reset to clear the conversation.\n");

    repl::run(runtime.agent, runtime.updates).await
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
