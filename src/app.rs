//! Core application runner (business logic) for `govee-bridge`.
//!
//! This module is intentionally decoupled from CLI parsing and process exit
//! codes so it can be tested deterministically with injected radio and
//! publish-sink implementations.

use crate::config::{ConfigError, ConfigStore};
use crate::mqtt::{MqttPublisher, PublishError, Publisher};
use crate::orchestrator::Orchestrator;
use crate::scanner::{GoveeScanner, Radio, ScanError};
use crate::throttle::Throttle;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Buffer size of the reading channel between the scanner fan-out and the
/// orchestrator. Readings arriving while the queue is full are dropped; the
/// next scan window supplies fresh ones.
pub const READING_CHANNEL_BUFFER_SIZE: usize = 100;

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yml")]
    pub config: PathBuf,

    /// Duration of each active scan window.
    /// Accepts duration with suffix: 10s, 1m, 500ms.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = crate::throttle::parse_duration, default_value = "10s")]
    pub scan_window: Duration,

    /// Idle pause between scan windows.
    #[arg(long, value_parser = crate::throttle::parse_duration, default_value = "10s")]
    pub idle_window: Duration,

    /// Publish at most one reading per device per interval.
    #[arg(long, value_parser = crate::throttle::parse_duration)]
    pub throttle: Option<Duration>,

    /// Verbose output, log duty-cycle transitions and skipped frames
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Main entry point: load configuration, bring up the radio and run the
/// bridge until the process is terminated.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded, the broker
/// address is invalid, or Bluetooth initialization fails.
pub async fn run(options: Options) -> Result<(), RunError> {
    let store = ConfigStore::load(&options.config)?;
    let publisher = MqttPublisher::from_broker(&store.config().mqtt.broker)?;

    #[cfg(feature = "bluer")]
    return {
        let radio = crate::scanner::bluer::BluerRadio::new().await?;
        run_bridge(store, Box::new(radio), Box::new(publisher), &options).await
    };

    #[cfg(not(feature = "bluer"))]
    {
        let _ = (store, publisher);
        Err(RunError::Scan(ScanError::BackendNotAvailable(
            "bluer".to_string(),
        )))
    }
}

/// Run the bridge with injected radio and publisher.
///
/// Wires the pipeline together: scanner fan-out → bounded reading channel →
/// orchestrator, with the duty-cycle driver alternating scan and idle
/// phases beside it. Readings are processed strictly one at a time. Returns
/// only when the duty cycle hits a radio error.
pub async fn run_bridge(
    store: ConfigStore,
    radio: Box<dyn Radio>,
    publisher: Box<dyn Publisher>,
    options: &Options,
) -> Result<(), RunError> {
    let addresses = store.addresses()?;
    log::info!(
        "listening for {} configured device(s), publishing to {}",
        addresses.len(),
        store.config().mqtt.broker
    );

    let mut orchestrator = Orchestrator::new(store, publisher);
    let mut scanner = GoveeScanner::new(radio, addresses);

    let (tx, mut readings) = mpsc::channel(READING_CHANNEL_BUFFER_SIZE);
    scanner.register(Box::new(move |reading| {
        if tx.try_send(reading.clone()).is_err() {
            log::warn!("reading queue full, dropping reading from {}", reading.mac);
        }
    }));

    let mut throttle = options.throttle.map(Throttle::new);

    let duty = run_duty_cycle(&mut scanner, options.scan_window, options.idle_window);
    tokio::pin!(duty);

    loop {
        tokio::select! {
            result = &mut duty => return result.map_err(RunError::from),
            maybe_reading = readings.recv() => match maybe_reading {
                Some(reading) => {
                    let should_emit = throttle
                        .as_mut()
                        .is_none_or(|t: &mut Throttle| t.should_emit(reading.mac));

                    if should_emit && let Err(error) = orchestrator.handle_reading(&reading).await {
                        log::error!("failed to process reading from {}: {error}", reading.mac);
                    }
                }
                None => return Ok(()),
            },
        }
    }
}

/// Alternate scan-active and idle phases forever.
///
/// Suspends only at the fixed-duration pauses between phase transitions.
/// Radio start/stop failures propagate to the caller; there is no retry
/// here — a crashed radio is fatal for the process.
pub async fn run_duty_cycle(
    scanner: &mut GoveeScanner,
    scan_window: Duration,
    idle_window: Duration,
) -> Result<(), ScanError> {
    loop {
        scanner.start_cycle().await?;
        log::debug!("scanning...");
        sleep(scan_window).await;

        log::debug!("stopping...");
        scanner.stop_cycle().await?;

        log::debug!("sleeping...");
        sleep(idle_window).await;
    }
}
