//! Presenter binary for Follow the Money.
//!
//! Wires the investigation source, the audio backend, the rendering
//! bridge, and the timer service around one [`Session`] and runs the
//! event loop until `quit` or `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ftm-config.yaml` (or `FTM_CONFIG`)
//! 2. Initialize structured logging (tracing) at the configured level
//! 3. Build the investigation source and load the publication catalog
//! 4. Open the audio backend
//! 5. Start the rendering bridge (optional)
//! 6. Run the event loop
//!
//! [`Session`]: ftm_core::session::Session

mod console;
mod driver;
mod error;
mod input;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ftm_audio::OutputBackend;
use ftm_core::config::{LoggingConfig, PresenterConfig};
use ftm_core::session::Session;
use ftm_core::timer::TokioTimers;
use ftm_observer::AppState;
use ftm_source::InvestigationSource;
use ftm_types::Publication;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::driver::Driver;
use crate::error::PresenterError;
use crate::input::{HELP, Input};

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "ftm-config.yaml";

/// Capacity of the command channel from the rendering bridge.
const COMMAND_CAPACITY: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration. Logging depends on its level, so this
    //    happens first and reports after step 2.
    let (config, config_source) = load_config().context("failed to load configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("ftm-presenter starting");
    info!(
        source = %config_source,
        source_mode = ?config.source.mode,
        audio_backend = ?config.audio.backend,
        observer_enabled = config.observer.enabled,
        seeded = config.seed.is_some(),
        "Configuration loaded"
    );

    // 3. Build the investigation source and load the catalog.
    let source = InvestigationSource::from_config(&config.source)
        .map_err(PresenterError::from)
        .context("failed to build investigation source")?;
    let catalog = load_catalog(&source).await;
    info!(
        source = source.name(),
        publications = catalog.len(),
        "Publication catalog loaded"
    );

    // 4. Open the audio backend.
    let (ended_tx, ended_rx) = mpsc::unbounded_channel();
    let audio = OutputBackend::from_config(&config.audio, ended_tx)
        .map_err(PresenterError::from)
        .context("failed to open audio backend")?;
    info!(backend = audio.name(), "Audio backend ready");

    // 5. Start the rendering bridge.
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
    let observer = if config.observer.enabled {
        let state = Arc::new(AppState::new(commands_tx));
        state.set_publications(catalog.clone()).await;
        let (addr, _handle) = ftm_observer::spawn_observer(&config.observer, Arc::clone(&state))
            .await
            .map_err(PresenterError::from)
            .context("failed to start rendering bridge")?;
        info!(%addr, "Rendering bridge started");
        Some(state)
    } else {
        drop(commands_tx);
        None
    };

    // 6. Run the event loop.
    let (timers, timer_rx) = TokioTimers::new();
    let session = Session::new(&config, timers, audio);
    let (input_tx, input_rx) = mpsc::channel(COMMAND_CAPACITY);
    std::thread::Builder::new()
        .name("ftm-stdin".to_owned())
        .spawn(move || read_stdin(&input_tx))
        .context("failed to spawn stdin reader")?;

    println!("{HELP}");
    let driver = Driver::new(
        session,
        timer_rx,
        ended_rx,
        Arc::new(source),
        catalog,
        observer,
        true,
    );
    driver.run(commands_rx, input_rx).await;

    info!("ftm-presenter exited");
    Ok(())
}

/// Load configuration from `FTM_CONFIG` or `ftm-config.yaml`.
///
/// A missing file yields defaults with environment overrides applied.
fn load_config() -> Result<(PresenterConfig, String), PresenterError> {
    let path =
        std::env::var("FTM_CONFIG").map_or_else(|_| PathBuf::from(CONFIG_FILE), PathBuf::from);
    if path.exists() {
        let config = PresenterConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = PresenterConfig::default();
        config.apply_env_overrides();
        Ok((config, "defaults".to_owned()))
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Fetch the catalog. A failure leaves the catalog empty.
async fn load_catalog(source: &InvestigationSource) -> Vec<Publication> {
    source.publications().await.unwrap_or_else(|e| {
        warn!(error = %e, "failed to load publication catalog");
        Vec::new()
    })
}

/// Forward parsed stdin lines to the event loop until EOF or `quit`.
///
/// Runs on a plain thread: a blocked stdin read must not hold up
/// runtime shutdown.
fn read_stdin(tx: &mpsc::Sender<Input>) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                return;
            }
        };
        match input::parse(&line) {
            Ok(Some(parsed)) => {
                let quit = parsed == Input::Quit;
                if tx.blocking_send(parsed).is_err() || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => println!("{e}. {HELP}"),
        }
    }
}
