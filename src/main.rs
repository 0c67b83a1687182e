//! PDF Extraction Gateway - Entry point

use clap::Parser;
use pdf_extraction_gateway::{run_server_with_config, ServerConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// HTTP gateway that extracts structured content from PDFs
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "PDF_GATEWAY_ADDR", default_value = "0.0.0.0:8000")]
    addr: String,

    /// Maximum upload size in megabytes
    #[arg(long, env = "PDF_GATEWAY_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: u64,

    /// Per-request extraction timeout in seconds
    #[arg(long, env = "PDF_GATEWAY_TIMEOUT_SECS", default_value_t = 300)]
    timeout_secs: u64,

    /// Docling executable
    #[arg(long, env = "DOCLING_BIN", default_value = "docling")]
    docling_bin: PathBuf,

    /// Extra arguments for every Docling conversion (space separated)
    #[arg(long, env = "DOCLING_ARGS", default_value = "")]
    docling_args: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: args.addr,
            max_upload_bytes: args.max_upload_mb * 1024 * 1024,
            extract_timeout: Duration::from_secs(args.timeout_secs),
            docling_bin: args.docling_bin,
            docling_args: args
                .docling_args
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_extraction_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    tracing::info!(addr = %args.addr, "Starting PDF extraction gateway");

    run_server_with_config(args.into()).await
}
