use std::sync::Arc;

use clap::Parser;
use sealift_store::config::StoreConfig;
use sealift_store::s3::S3Store;
use sealift_store::traits::ObjectStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sealift-server", about = "Signing gateway for multipart uploads")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "3001")]
    port: u16,

    /// Apply a permissive CORS policy to the bucket on startup so browsers
    /// can PUT directly to presigned part URLs.
    #[arg(long, default_value_t = false)]
    configure_cors: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("sealift=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    let config = StoreConfig::from_env()?;
    info!(bucket = %config.bucket, region = %config.region, "store configured");
    let store: Arc<dyn ObjectStore> = Arc::new(S3Store::new(config)?);

    if cli.configure_cors {
        match store.configure_cors().await {
            Ok(()) => info!("bucket CORS configured"),
            Err(err) => warn!(error = %err, "bucket CORS configuration failed"),
        }
    }

    let app = sealift_api::gateway_router(store);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("sealift gateway listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
