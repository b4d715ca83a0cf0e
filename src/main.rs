use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loqa_meditation::{
    create_router, AppState, Config, LogNotifier, MonotonicClock, NatsNotifier, PlaybackSource,
    ProgressNotifier, RecordingLibrary, RecordingSource, SchedulerHandle, SchedulerService,
    ServiceSettings, StartSession, TimedPlaybackDriver,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loqa-meditation", version, about = "Interval meditation timer")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/loqa-meditation")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Run a single session in the foreground until it ends or Ctrl-C
    Run {
        /// Recording id to play
        #[arg(short, long, default_value = loqa_meditation::CHANT_RECORDING_ID)]
        recording: String,
        /// Replay interval in minutes (ignored for the chant)
        #[arg(short, long, default_value_t = 3)]
        interval: u32,
        /// Session length in minutes; runs until Ctrl-C when omitted
        #[arg(short, long)]
        duration: Option<u32>,
    },
    /// List available recordings
    Recordings,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loqa Meditation v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    std::fs::create_dir_all(&cfg.library.import_dir).with_context(|| {
        format!(
            "Failed to create import directory {}",
            cfg.library.import_dir.display()
        )
    })?;

    let library = Arc::new(
        RecordingLibrary::open(
            &cfg.library.index_path,
            RecordingLibrary::builtin_defaults(&cfg.library.sounds_dir),
        )
        .context("Failed to open recording library")?
        .with_import_dir(&cfg.library.import_dir),
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cfg, library).await,
        Command::Run {
            recording,
            interval,
            duration,
        } => run_session(&cfg, library, StartSession::new(recording, interval, duration)).await,
        Command::Recordings => {
            for recording in library.list() {
                let kind = if recording.is_default { "built-in" } else { "user" };
                println!(
                    "{:<24} {:<36} {:>8}ms  {}",
                    recording.id, recording.name, recording.duration, kind
                );
            }
            Ok(())
        }
    }
}

async fn serve(cfg: &Config, library: Arc<RecordingLibrary>) -> Result<()> {
    let (scheduler, service_task) = start_scheduler(cfg, library.clone()).await;

    let app = create_router(AppState::new(scheduler, library));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    // The router owned the last scheduler handle; the service winds down on its own
    service_task.await.context("Scheduler service panicked")?;
    Ok(())
}

async fn run_session(
    cfg: &Config,
    library: Arc<RecordingLibrary>,
    request: StartSession,
) -> Result<()> {
    let (scheduler, service_task) = start_scheduler(cfg, library).await;

    let snapshot = scheduler.start_session(request).await?;
    info!(
        "Session started: {} ({:?})",
        snapshot.recording_name, snapshot.mode
    );

    let mut poll = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Stopping session");
                scheduler.stop_session().await?;
                break;
            }
            _ = poll.tick() => {
                if scheduler.snapshot().await?.is_none() {
                    info!("Session complete");
                    break;
                }
            }
        }
    }

    drop(scheduler);
    service_task.await.context("Scheduler service panicked")?;
    Ok(())
}

async fn start_scheduler(
    cfg: &Config,
    library: Arc<RecordingLibrary>,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let driver = TimedPlaybackDriver::new(events_tx);

    let keep_alive = (cfg.playback.keep_alive_volume > 0.0)
        .then(|| library.find_by_id(&cfg.scheduler.chant_recording_id))
        .flatten()
        .map(|r| PlaybackSource::keep_alive(&r, cfg.playback.keep_alive_volume));

    let settings = ServiceSettings {
        progress_interval: cfg.progress_interval(),
        fallback_track_duration: Duration::from_millis(cfg.playback.fallback_track_ms),
        keep_alive,
    };

    let service = SchedulerService::new(
        cfg.scheduler_config(),
        library,
        Box::new(driver),
        create_notifier(cfg).await,
        Arc::new(MonotonicClock::new()),
        settings,
    );

    service.spawn(events_rx)
}

async fn create_notifier(cfg: &Config) -> Arc<dyn ProgressNotifier> {
    if let Some(url) = &cfg.notifier.nats_url {
        match NatsNotifier::connect(url).await {
            Ok(notifier) => return Arc::new(notifier),
            Err(e) => warn!("NATS notifier unavailable, logging progress instead: {:#}", e),
        }
    }
    Arc::new(LogNotifier)
}
