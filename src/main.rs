use clap::Parser;
use line_ocr::config::{Args, Config};
use line_ocr::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::try_from(args)?;

    tracing::info!("Starting line-ocr-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);
    tracing::info!(
        "Segmentation: height_ratio_threshold={}, sigma={}, activity_fraction={}, min_padding={}",
        config.segmentation.height_ratio_threshold,
        config.segmentation.sigma,
        config.segmentation.activity_fraction,
        config.segmentation.min_padding
    );

    server::run(config).await
}
