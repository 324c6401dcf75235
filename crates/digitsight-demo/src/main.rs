use anyhow::Result;
use clap::Parser;
use digitsight_classifier::{ClassifierConfig, DeviceType, ModelSource, SiglipDigitClassifier};
use digitsight_demo::cli::Cli;
use digitsight_demo::server::run_server;
use digitsight_demo::state::DemoAppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let source = match &cli.model_dir {
        Some(dir) => ModelSource::LocalDir(dir.clone()),
        None => match &cli.model_repo {
            Some(repo) => ModelSource::HuggingFace {
                repo_id: repo.clone(),
                revision: cli.revision.clone(),
            },
            None => ModelSource::default_hub(),
        },
    };
    let device: DeviceType = cli.device.parse()?;
    let config = ClassifierConfig { source, device };

    let addr: SocketAddr = format!("{}:{}", cli.address, cli.port).parse()?;

    println!();
    println!("  Digitsight - handwritten digit recognition demo");
    println!();
    println!("  Model:  {}", config.source.display_name());
    println!("  Device: {}", cli.device);
    println!();
    println!("  Loading model (first start downloads the checkpoint)...");

    let classifier =
        tokio::task::spawn_blocking(move || SiglipDigitClassifier::load(&config)).await??;

    println!("  Ready. Open http://{} in your browser", addr);
    println!();

    let state = DemoAppState::new(Arc::new(classifier));
    run_server(state, addr).await?;

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "digitsight_demo=debug,digitsight_classifier=debug,tower_http=debug"
    } else {
        "digitsight_demo=info,digitsight_classifier=info,tower_http=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
