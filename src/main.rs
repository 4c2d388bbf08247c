use anyhow::Result;
use clap::Parser;
use danio_classify::{
    config::{Config, LookupConfig},
    web::serve,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "danio-classify")]
#[command(about = "Danio rerio larva defect classification service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8501")]
    bind: String,

    /// Number of runtime worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Wikipedia language used by the lookup sidebar
    #[arg(long, default_value = "pl")]
    lookup_lang: String,

    /// Override the MediaWiki API endpoint
    #[arg(long)]
    lookup_endpoint: Option<String>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Danio rerio classification service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Models directory: {}", args.models_dir);

    let lookup_config = LookupConfig::new(args.lookup_lang, args.lookup_endpoint)?;
    let config = Config::new(args.bind, args.models_dir, args.workers, args.dev, lookup_config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))?;

    Ok(())
}
