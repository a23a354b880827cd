use clap::Parser;
use mailstudio_rs::api::ApiServer;
use mailstudio_rs::storage::StorageFactory;
use mailstudio_rs::{seed, Config};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mailstudio", about = "Email template studio backend")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen address from the configuration
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    let level = config
        .logging
        .level
        .parse()
        .unwrap_or(tracing::Level::INFO);
    if config.logging.format == "compact" {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("starting mailstudio backend");

    let storage = StorageFactory::shared(&config.storage).await;
    storage.connect().await?;
    seed::run(&storage).await?;

    let server = ApiServer::new(storage, config.server.listen_addr.clone());
    server.run().await?;

    Ok(())
}
