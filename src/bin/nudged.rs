use clap::Parser;
use nudge::config::Config;
use nudge::daemon;
use nudge::error::Result;

#[derive(Parser, Debug)]
#[command(name = "nudged")]
#[command(about = "Nudge reminder daemon")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 7979)]
    port: u16,

    #[arg(long, default_value = "nudge.db")]
    db: String,

    #[arg(long, env = "NUDGE_CONFIG")]
    config: Option<String>,

    #[arg(long, env = "NUDGE_TOKEN")]
    token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    nudge::logging::init_tracing("nudged");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::convention_defaults(&cli.db),
    }
    .resolve_env();

    daemon::run(&cli.host, cli.port, config, &cli.token).await
}
