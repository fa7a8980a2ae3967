use anyhow::Result;
use clap::Parser;
use newsroom_rs::cli::Args;
use newsroom_rs::launch;
use tracing_subscriber::{EnvFilter, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    // 读取.env中的API KEY等本地配置
    dotenv::dotenv().ok();

    let args = Args::parse();
    let topic = args.topic.clone();
    let config = args.into_config()?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let filter_string = format!(
        "warn,newsroom_rs={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string)?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    launch(&config, topic).await
}
