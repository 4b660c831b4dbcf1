use clap::Parser;
use linkzip::{ArchiveService, Config};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Serve the linkzip REST API
#[derive(Parser, Debug)]
#[command(name = "linkzip", version, about)]
struct Args {
    /// JSON config file; defaults apply when omitted
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override `api.bind_address`
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Override `storage.data_dir`
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override `api.public_url`
    #[arg(long)]
    public_url: Option<String>,
}

impl Args {
    fn load_config(&self) -> linkzip::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(bind) = self.bind {
            config.api.bind_address = bind;
        }
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(url) = &self.public_url {
            config.api.public_url = Some(url.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), linkzip::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("linkzip=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    tracing::info!(
        bind = %config.api.bind_address,
        data_dir = %config.storage.data_dir.display(),
        "starting linkzip"
    );

    let service = ArchiveService::new(config)?;
    linkzip::run_with_shutdown(service).await
}
