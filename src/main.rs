use std::sync::Arc;

use anyhow::Context;

use campus_bot::backend::BackendClient;
use campus_bot::bot::Bot;
use campus_bot::channels::{Channel, CliChannel, MaxChannel};
use campus_bot::config::{BotConfig, ChannelKind};
use campus_bot::router::EventRouter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("invalid configuration")?;

    eprintln!("🎓 Campus Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend_url);
    eprintln!("   Mini-app: {}", config.webapp_url);
    eprintln!("   University: {}", config.university_id);
    eprintln!(
        "   Backend secret: {}",
        if config.bot_secret.is_some() {
            "set"
        } else {
            "not set"
        }
    );

    let backend = BackendClient::from_config(&config).context("failed to create backend client")?;
    let router = Arc::new(EventRouter::from_config(Arc::new(backend), &config));

    let channel: Arc<dyn Channel> = match config.channel {
        ChannelKind::Max => {
            eprintln!("   Channel: max ({})\n", config.max_api_url);
            Arc::new(MaxChannel::from_config(&config))
        }
        ChannelKind::Cli => {
            eprintln!("   Channel: cli");
            eprintln!("   /command, !button_payload, ?start_payload or free text. Ctrl+D to exit.\n");
            Arc::new(CliChannel::new())
        }
    };

    channel
        .health_check()
        .await
        .with_context(|| format!("channel {} is not reachable", channel.name()))?;

    Bot::new(channel, router).run().await?;

    Ok(())
}
