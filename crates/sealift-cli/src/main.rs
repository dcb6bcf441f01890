use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sealift_client::{ProgressFn, UploadConfig, Uploader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sealift", about = "Upload a file through a sealift gateway")]
struct Cli {
    /// File to upload.
    file: PathBuf,

    #[arg(long, default_value = "http://127.0.0.1:3001")]
    gateway: String,

    /// Part size in MiB.
    #[arg(long, default_value = "20")]
    chunk_mib: u64,

    /// Parts uploaded concurrently per batch.
    #[arg(long, default_value = "5")]
    concurrency: usize,

    /// Retry attempts per part after the first failure.
    #[arg(long, default_value = "3")]
    retries: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("sealift=warn".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = UploadConfig {
        chunk_size: cli.chunk_mib * 1024 * 1024,
        concurrency_limit: cli.concurrency,
        retry_budget: cli.retries,
    };

    let uploader = Uploader::for_gateway(&cli.gateway, config)?;
    let progress: ProgressFn = Arc::new(|percent: f64| {
        eprint!("\ruploading... {percent:5.1}%");
        let _ = std::io::stderr().flush();
    });

    let uploaded = uploader.upload_file(&cli.file, Some(progress)).await?;
    eprintln!();
    info!(key = %uploaded.key, "upload finished");
    println!("{}", uploaded.location);

    Ok(())
}
