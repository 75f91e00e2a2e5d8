use anyhow::Context;
use clap::Parser;
use fitplan::server::{run_server, AppState};
use fitplan::store::PlanArchive;
use fitplan::Config;

#[derive(Parser)]
#[command(name = "fitplan-server", about = "Personalized fitness plan service")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "FITPLAN_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::info!(
        order = ?config.provider_order,
        demo_mode = config.demo_mode,
        prompt_style = ?config.prompt_style,
        "configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let archive = match config.database_url.as_deref() {
        Some(url) => Some(
            PlanArchive::connect(url)
                .await
                .with_context(|| format!("failed to open plan database {url}"))?,
        ),
        None => {
            tracing::info!("DATABASE_URL not set, saved plans disabled");
            None
        }
    };

    run_server(AppState::new(config, client, archive), &cli.bind, cli.port).await
}
