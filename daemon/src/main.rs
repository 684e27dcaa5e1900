use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use tokio::{select, signal, task};

use samdeck_usb::UsbAdapterFactory;

use crate::actions::{MuteKey, PowerKey, VolumeDial};
use crate::cli::{Cli, LevelFilter};
use crate::session::{DeviceError, SessionManager};
use crate::settings::SettingsHandle;
use crate::surface::Surface;

mod actions;
mod cli;
mod session;
mod settings;
mod surface;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    CombinedLogger::init(vec![TermLogger::new(
        match args.log_level {
            LevelFilter::Off => log::LevelFilter::Off,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Trace => log::LevelFilter::Trace,
        },
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .context("Could not configure the logger")?;

    info!("Starting samdeck daemon v{}", VERSION);
    let settings = SettingsHandle::load(args.config).await?;

    // Construction never touches the device; the first command connects.
    let manager = Arc::new(SessionManager::new(
        settings.get_safety_limits().await,
        Box::new(UsbAdapterFactory),
    ));

    let volume_dial = Arc::new(VolumeDial::new(
        manager.clone(),
        settings.get_volume_dial().await,
    ));
    let mute_key = Arc::new(MuteKey::new(manager.clone()));
    let power_key = Arc::new(PowerKey::new(
        manager.clone(),
        settings.get_power_mode().await,
    ));

    if args.connect_on_startup || settings.get_connect_on_startup().await {
        // Deferred initialisation: runs after the surface wiring is in
        // place, and a missing adapter only logs.
        let manager = manager.clone();
        task::spawn_blocking(move || {
            if let Err(error) = manager.initialize() {
                warn!("Startup connect failed, will retry on first use: {}", error);
            }
        });
    }

    let keep_alive = settings.get_keep_alive().await;
    let keep_alive_task = keep_alive.enabled.then(|| {
        let manager = manager.clone();
        tokio::spawn(run_keep_alive(manager, keep_alive.interval_seconds))
    });

    let surface = Surface {
        manager: manager.clone(),
        volume_dial,
        mute_key,
        power_key,
    };

    select! {
        result = surface.run() => {
            if let Err(error) = result {
                warn!("Surface loop stopped: {}", error);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown triggered");
        }
    }

    if let Some(task) = keep_alive_task {
        task.abort();
    }

    let manager = manager.clone();
    task::spawn_blocking(move || manager.disconnect()).await?;
    info!("Shutdown complete");
    Ok(())
}

/// Periodically nudge the monitors so they don't drop off the GLM network
/// between commands. An idle (disconnected) session is left alone.
async fn run_keep_alive(manager: Arc<SessionManager>, interval_seconds: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
    loop {
        interval.tick().await;

        let manager = manager.clone();
        let result = task::spawn_blocking(move || manager.stay_alive()).await;
        match result {
            Ok(Ok(())) => debug!("Keepalive sent"),
            Ok(Err(DeviceError::NotConnected)) => {}
            Ok(Err(error)) => warn!("Keepalive failed: {}", error),
            Err(_) => return,
        }
    }
}
