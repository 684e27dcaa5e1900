//! Console stand-in for the control-surface host. Maps key and dial events
//! arriving on stdin onto the registered actions, one event per line, and
//! prints what the surface would display. The real host calls the same
//! action methods from its own event loop.

use std::sync::Arc;

use anyhow::Result;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task;

use crate::actions::{MuteKey, PowerKey, VolumeDial};
use crate::session::SessionManager;

pub struct Surface {
    pub manager: Arc<SessionManager>,
    pub volume_dial: Arc<VolumeDial>,
    pub mute_key: Arc<MuteKey>,
    pub power_key: Arc<PowerKey>,
}

impl Surface {
    /// Read events until stdin closes. Action calls block on the USB
    /// transaction, so they run on the blocking pool rather than the
    /// reactor.
    pub async fn run(self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        info!("Surface ready: up [n] / down [n] / dial / mute / power / status / disconnect");
        while let Some(line) = lines.next_line().await? {
            let mut words = line.split_whitespace();
            let event = match words.next() {
                Some(event) => event.to_lowercase(),
                None => continue,
            };
            let ticks: i32 = words.next().and_then(|n| n.parse().ok()).unwrap_or(1);

            match event.as_str() {
                "up" => self.rotate(ticks).await?,
                "down" => self.rotate(-ticks).await?,
                "dial" => {
                    let dial = self.volume_dial.clone();
                    report(task::spawn_blocking(move || dial.on_press()).await?);
                    println!("{}", self.volume_dial.label());
                }
                "mute" => {
                    let key = self.mute_key.clone();
                    report(task::spawn_blocking(move || key.on_press()).await?);
                    println!("{}", self.mute_key.label());
                }
                "power" => {
                    let key = self.power_key.clone();
                    report(task::spawn_blocking(move || key.on_press()).await?);
                    println!("{}", self.power_key.label());
                }
                "status" => {
                    let state = self.manager.state();
                    println!(
                        "connected: {}, volume: {:.1}dB, muted: {}, powered: {}",
                        state.connected, state.volume_db, state.muted, state.powered
                    );
                }
                "disconnect" => {
                    let manager = self.manager.clone();
                    task::spawn_blocking(move || manager.disconnect()).await?;
                    println!("disconnected");
                }
                _ => println!("unknown event: {}", event),
            }
        }

        Ok(())
    }

    async fn rotate(&self, ticks: i32) -> Result<()> {
        let dial = self.volume_dial.clone();
        report(task::spawn_blocking(move || dial.on_rotate(ticks)).await?);
        println!("{}", self.volume_dial.label());
        Ok(())
    }
}

fn report<T>(result: Result<T, crate::session::DeviceError>) {
    // Device errors are feedback for the surface, never fatal.
    if let Err(error) = result {
        println!("error: {}", error);
    }
}
