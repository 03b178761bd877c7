use std::error::Error;
use std::future::IntoFuture;
use std::net::SocketAddr;

use clap::Parser;
use myo_hub::{
    cli::{Cli, Commands, EvaluateArgs, ServeArgs},
    config::detector_params,
    evaluate::evaluate_file,
    open_source, server, Hub, HubConfig, HubResult, Recorder,
};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = env!("CARGO_PKG_VERSION");

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "myo_hub=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Evaluate(args)) => evaluate(args).await,
        Some(Commands::Serve(args)) => serve(args).await,
        None => serve(cli.serve).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn serve(args: ServeArgs) -> Result<(), BoxError> {
    // Mode conflicts are rejected before anything starts.
    let config = HubConfig::from_args(&args)?;

    info!("🚀 Starting Myo Hub v{}", VERSION);
    info!("   Source: {:?}", config.source);
    info!("   Recording: {:?}", config.record_file);
    info!(
        "   Detector: instant={} trailing={} lookback={} threshold={}",
        config.detector.instant_window,
        config.detector.trailing_window,
        config.detector.lookback,
        config.detector.spike_threshold
    );
    info!(
        "   Fan-out: {:?} (queue {}, max {} viewers)",
        config.fanout, config.viewer_queue, config.max_viewers
    );

    let source = open_source(&config.source).await?;

    let (recorder, recorder_task) = match &config.record_file {
        Some(path) => {
            let (handle, task) = Recorder::create(path).await?.spawn();
            (Some(handle), Some(task))
        }
        None => (None, None),
    };

    let (hub, coordinator) = Hub::spawn(config.hub_options(), recorder)?;

    let source_name = source.name();
    let source_task = tokio::spawn({
        let hub = hub.clone();
        async move { source.run(hub).await }
    });

    let addr: SocketAddr = config.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🎧 Listening on {}", addr);
    info!("📡 WebSocket endpoint: ws://{}/ws", addr);

    let app = server::router(hub);

    tokio::select! {
        result = axum::serve(listener, app.into_make_service()).into_future() => {
            result?;
            Ok(())
        }
        result = source_task => Err(stopped(&format!("{} source", source_name), result)),
        result = coordinator => Err(stopped("hub coordinator", result)),
        result = join_optional(recorder_task) => Err(stopped("recorder", result)),
    }
}

/// Every background task runs for the life of the process; finishing at all
/// is a failure.
fn stopped(task: &str, result: Result<HubResult<()>, JoinError>) -> BoxError {
    match result {
        Ok(Ok(())) => format!("{} stopped unexpectedly", task).into(),
        Ok(Err(e)) => format!("{} failed: {}", task, e).into(),
        Err(e) => format!("{} panicked: {}", task, e).into(),
    }
}

async fn join_optional(
    task: Option<JoinHandle<HubResult<()>>>,
) -> Result<HubResult<()>, JoinError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

async fn evaluate(args: EvaluateArgs) -> Result<(), BoxError> {
    let params = detector_params(&args.detector)?;
    let result = evaluate_file(&args.file, params, args.tolerance_ms).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let ratio = |r: Option<f64>| r.map_or_else(|| "-".to_string(), |r| format!("{:.3}", r));
    println!("{:<20} {}", "File", args.file.display());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Samples", result.samples);
    println!("{:<20} {}", "Labels", result.labels);
    println!("{:<20} {}", "Predictions", result.predictions);
    println!("{:<20} {} ms", "Tolerance", result.tolerance_ms);
    println!("{:<20} {}", "True positives", result.counts.true_positives);
    println!("{:<20} {}", "False positives", result.counts.false_positives);
    println!("{:<20} {}", "False negatives", result.counts.false_negatives);
    println!("{:<20} {}", "Precision", ratio(result.precision));
    println!("{:<20} {}", "Recall", ratio(result.recall));
    Ok(())
}
