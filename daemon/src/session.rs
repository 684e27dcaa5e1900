use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use samdeck_types::PowerMode;
use samdeck_usb::error::{CommandError, ConnectError};
use samdeck_usb::{AdapterFactory, FullSamAdapter};

/// Nothing above full scale, ever, regardless of configuration.
pub const HARD_CEILING_DB: f32 = 0.0;
/// The GLM attenuation floor.
pub const HARD_FLOOR_DB: f32 = -130.0;

const DEFAULT_VOLUME_DB: f32 = -30.0;

#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("No GLM adapter was found")]
    NotFound,

    #[error("Insufficient permissions to open the GLM adapter")]
    PermissionDenied,

    #[error("Transport failure talking to the GLM adapter")]
    Transport,

    #[error("Not connected to the GLM adapter")]
    NotConnected,
}

impl From<ConnectError> for DeviceError {
    fn from(error: ConnectError) -> Self {
        match error {
            ConnectError::DeviceNotFound => DeviceError::NotFound,
            ConnectError::PermissionDenied => DeviceError::PermissionDenied,
            ConnectError::UsbError(_) => DeviceError::Transport,
        }
    }
}

impl From<CommandError> for DeviceError {
    fn from(_: CommandError) -> Self {
        DeviceError::Transport
    }
}

/// Volume window every mutating call is clamped into. Configured once at
/// startup, re-settable only through [`SessionManager::reconfigure_limits`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SafetyLimits {
    pub max_volume_db: f32,
    pub min_volume_db: f32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_volume_db: -10.0,
            min_volume_db: HARD_FLOOR_DB,
        }
    }
}

impl SafetyLimits {
    pub fn effective_max(&self) -> f32 {
        self.max_volume_db.min(HARD_CEILING_DB)
    }

    pub fn effective_min(&self) -> f32 {
        self.min_volume_db.max(HARD_FLOOR_DB)
    }

    pub fn clamp(&self, db: f32) -> f32 {
        db.min(self.effective_max()).max(self.effective_min())
    }
}

/// Last-known device state. When `connected` is false the remaining fields
/// are stale and only good for display.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DeviceState {
    pub volume_db: f32,
    pub muted: bool,
    pub powered: bool,
    pub connected: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            volume_db: DEFAULT_VOLUME_DB,
            muted: false,
            powered: true,
            connected: false,
        }
    }
}

struct Session {
    adapter: Option<Box<dyn FullSamAdapter>>,
    state: DeviceState,
    limits: SafetyLimits,
}

/// Single point of truth for the GLM connection and last-known monitor
/// state.
///
/// One instance is constructed at startup and shared by every action. All
/// operations run their entire body under the session mutex, so at most one
/// driver transaction is ever in flight, and read-modify-write sequences
/// such as [`adjust_volume`](Self::adjust_volume) cannot race each other.
///
/// Failure policy: any transport failure drops the handle and demotes the
/// session to disconnected. The failed call is never retried internally;
/// the next operation performs a single fresh connect attempt through
/// [`ensure_connected`](Self::ensure_connected).
pub struct SessionManager {
    factory: Box<dyn AdapterFactory>,
    session: Mutex<Session>,
}

impl SessionManager {
    /// Construct without touching the device. The first connect happens on
    /// the first command, or via [`initialize`](Self::initialize).
    pub fn new(limits: SafetyLimits, factory: Box<dyn AdapterFactory>) -> Self {
        Self {
            factory,
            session: Mutex::new(Session {
                adapter: None,
                state: DeviceState::default(),
                limits,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deferred startup hook, to be invoked once the host environment has
    /// finished initialising. Connecting here is optional either way; every
    /// command connects lazily on demand.
    pub fn initialize(&self) -> Result<(), DeviceError> {
        debug!("Running deferred GLM initialisation");
        self.ensure_connected()
    }

    /// Idempotent connect. Returns immediately when a live session exists,
    /// otherwise performs exactly one attach attempt.
    pub fn ensure_connected(&self) -> Result<(), DeviceError> {
        let mut session = self.lock();
        self.connect(&mut session)
    }

    fn connect(&self, session: &mut Session) -> Result<(), DeviceError> {
        if let Some(adapter) = session.adapter.as_mut() {
            if adapter.is_connected() {
                return Ok(());
            }
            debug!("GLM handle went stale, dropping it");
            session.adapter = None;
            session.state.connected = false;
        }

        match self.factory.attach() {
            Ok(mut adapter) => {
                // Populate the cache before we report the session as live.
                let (volume, muted) = adapter.get_state().map_err(|error| {
                    warn!("Connected to GLM adapter but state query failed: {}", error);
                    DeviceError::from(error)
                })?;

                // The state query reports volume and mute only; the cached
                // powered flag survives a reconnect (a shutdown leaves it
                // false so a later Toggle wakes).
                session.state.volume_db = volume;
                session.state.muted = muted;
                session.state.connected = true;
                session.adapter = Some(adapter);

                info!(
                    "GLM session established, volume {:.1}dB, muted: {}",
                    session.state.volume_db, muted
                );
                Ok(())
            }
            Err(error) => {
                session.state.connected = false;
                debug!("GLM connect attempt failed: {}", error);
                Err(error.into())
            }
        }
    }

    /// Run a driver command, demoting the session to disconnected on any
    /// failure so the next call reconnects lazily.
    fn command<R>(
        session: &mut Session,
        op: impl FnOnce(&mut dyn FullSamAdapter) -> Result<R, CommandError>,
    ) -> Result<R, DeviceError> {
        let adapter = session.adapter.as_mut().ok_or(DeviceError::NotConnected)?;
        match op(adapter.as_mut()) {
            Ok(value) => Ok(value),
            Err(error) => {
                warn!("GLM command failed, dropping session: {}", error);
                session.adapter = None;
                session.state.connected = false;
                Err(error.into())
            }
        }
    }

    /// Current master volume, refreshed from the device.
    pub fn get_volume(&self) -> Result<f32, DeviceError> {
        let mut session = self.lock();
        self.connect(&mut session)?;

        let volume = Self::command(&mut session, |adapter| adapter.get_volume_db())?;
        session.state.volume_db = volume;
        Ok(volume)
    }

    /// Set the master volume. Out-of-window requests are clamped, not
    /// rejected; the value actually applied is returned.
    pub fn set_volume(&self, requested_db: f32) -> Result<f32, DeviceError> {
        let mut session = self.lock();
        self.set_volume_locked(&mut session, requested_db)
    }

    fn set_volume_locked(
        &self,
        session: &mut Session,
        requested_db: f32,
    ) -> Result<f32, DeviceError> {
        let clamped = session.limits.clamp(requested_db);
        if clamped != requested_db {
            debug!(
                "Clamped requested volume {:.1}dB to {:.1}dB",
                requested_db, clamped
            );
        }

        self.connect(session)?;
        Self::command(session, |adapter| adapter.set_volume_db(clamped))?;
        session.state.volume_db = clamped;
        Ok(clamped)
    }

    /// Apply a relative volume change. The read-modify-write runs under the
    /// session lock, so concurrent dial ticks serialize instead of racing.
    pub fn adjust_volume(&self, delta_db: f32) -> Result<f32, DeviceError> {
        self.adjust_volume_within(delta_db, HARD_FLOOR_DB, HARD_CEILING_DB)
    }

    /// [`adjust_volume`](Self::adjust_volume) constrained to a narrower
    /// window, e.g. a dial's configured min/max. The safety limits still
    /// apply on top.
    pub fn adjust_volume_within(
        &self,
        delta_db: f32,
        floor_db: f32,
        ceiling_db: f32,
    ) -> Result<f32, DeviceError> {
        let mut session = self.lock();
        self.connect(&mut session)?;

        let target = (session.state.volume_db + delta_db)
            .min(ceiling_db)
            .max(floor_db);
        self.set_volume_locked(&mut session, target)
    }

    pub fn set_mute(&self, mute: bool) -> Result<bool, DeviceError> {
        let mut session = self.lock();
        self.set_mute_locked(&mut session, mute)
    }

    pub fn toggle_mute(&self) -> Result<bool, DeviceError> {
        let mut session = self.lock();
        // Connect before deciding: on a fresh session the cached mute flag
        // is stale until the connect-time state query refreshes it.
        self.connect(&mut session)?;
        let target = !session.state.muted;
        self.set_mute_locked(&mut session, target)
    }

    fn set_mute_locked(&self, session: &mut Session, mute: bool) -> Result<bool, DeviceError> {
        self.connect(session)?;
        Self::command(session, |adapter| adapter.set_mute(mute))?;
        session.state.muted = mute;
        Ok(mute)
    }

    /// Change monitor power state, returning the new powered flag.
    ///
    /// Shutdown is a soft disconnect: the adapter takes the control link
    /// down with the monitors, so the handle is dropped and the session
    /// self-heals on the next command. A transport failure while the
    /// shutdown command is in flight is indistinguishable from that link
    /// drop and is reported as success.
    pub fn set_power(&self, mode: PowerMode) -> Result<bool, DeviceError> {
        let mut session = self.lock();
        self.connect(&mut session)?;

        let wake = match mode {
            PowerMode::Wake => true,
            PowerMode::Shutdown => false,
            PowerMode::Toggle => !session.state.powered,
        };

        if wake {
            Self::command(&mut session, |adapter| adapter.wake_all())?;
            info!("Woke all monitors");
            session.state.powered = true;
            return Ok(true);
        }

        if let Err(error) = Self::command(&mut session, |adapter| adapter.shutdown_all()) {
            warn!("Shutdown response lost, treating link drop as success: {}", error);
        } else {
            info!("Shut down all monitors");
        }

        if let Some(mut adapter) = session.adapter.take() {
            adapter.disconnect();
        }
        session.state.connected = false;
        session.state.powered = false;
        Ok(false)
    }

    /// Keepalive preventing the monitors from timing out of the GLM
    /// network. Unlike the command operations this never connects; an idle
    /// session has nothing to keep alive.
    pub fn stay_alive(&self) -> Result<(), DeviceError> {
        let mut session = self.lock();
        if session.adapter.is_none() {
            return Err(DeviceError::NotConnected);
        }
        Self::command(&mut session, |adapter| adapter.stay_online())
    }

    /// Explicit teardown. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        let mut session = self.lock();
        if let Some(mut adapter) = session.adapter.take() {
            adapter.disconnect();
            info!("Disconnected from GLM adapter");
        }
        session.state = DeviceState::default();
    }

    /// Snapshot of the last-known state, for display purposes. May be
    /// slightly stale, never torn.
    pub fn state(&self) -> DeviceState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.lock().state.connected
    }

    pub fn limits(&self) -> SafetyLimits {
        self.lock().limits
    }

    /// Explicit reconfiguration entry point for the safety limits.
    pub fn reconfigure_limits(&self, limits: SafetyLimits) {
        let mut session = self.lock();
        info!(
            "Safety limits reconfigured: max {:.1}dB, min {:.1}dB",
            limits.effective_max(),
            limits.effective_min()
        );
        session.limits = limits;
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use samdeck_usb::commands::{db_to_attenuation, Command};
    use samdeck_usb::error::{CommandError, ConnectError};
    use samdeck_usb::rusb;
    use samdeck_usb::{
        AdapterFactory, AttachSamAdapter, ExecutableSamAdapter, FullSamAdapter, SamCommands,
    };

    /// Shared mock device, observable from tests while the manager holds
    /// adapters attached to it.
    #[derive(Default)]
    pub struct MockDevice {
        pub volume_db: Mutex<f32>,
        pub muted: AtomicBool,
        pub fail_next: AtomicBool,
        pub commands: AtomicUsize,
    }

    pub struct MockFactory {
        pub device: Arc<MockDevice>,
        pub present: AtomicBool,
        pub attach_attempts: AtomicUsize,
    }

    impl MockFactory {
        pub fn new(volume_db: f32) -> Self {
            let device = Arc::new(MockDevice::default());
            *device.volume_db.lock().unwrap() = volume_db;
            Self {
                device,
                present: AtomicBool::new(true),
                attach_attempts: AtomicUsize::new(0),
            }
        }

        pub fn attempts(&self) -> usize {
            self.attach_attempts.load(Ordering::SeqCst)
        }
    }

    impl AdapterFactory for MockFactory {
        fn attach(&self) -> Result<Box<dyn FullSamAdapter>, ConnectError> {
            self.attach_attempts.fetch_add(1, Ordering::SeqCst);
            if !self.present.load(Ordering::SeqCst) {
                return Err(ConnectError::DeviceNotFound);
            }
            Ok(Box::new(MockAdapter {
                device: self.device.clone(),
            }))
        }
    }

    pub struct MockAdapter {
        device: Arc<MockDevice>,
    }

    impl ExecutableSamAdapter for MockAdapter {
        fn request(&mut self, command: Command) -> Result<Vec<u8>, CommandError> {
            self.device.commands.fetch_add(1, Ordering::SeqCst);
            if self.device.fail_next.swap(false, Ordering::SeqCst) {
                return Err(CommandError::UsbError(rusb::Error::Io));
            }

            match command {
                Command::QueryState => {
                    let raw = db_to_attenuation(*self.device.volume_db.lock().unwrap());
                    let mut payload = raw.to_le_bytes().to_vec();
                    payload.push(u8::from(self.device.muted.load(Ordering::SeqCst)));
                    Ok(payload)
                }
                Command::SetVolume(db) => {
                    *self.device.volume_db.lock().unwrap() = db;
                    Ok(vec![])
                }
                Command::SetMute(mute) => {
                    self.device.muted.store(mute, Ordering::SeqCst);
                    Ok(vec![])
                }
                Command::StayOnline | Command::WakeAll | Command::ShutdownAll => Ok(vec![]),
            }
        }
    }

    impl AttachSamAdapter for MockAdapter {
        fn is_connected(&mut self) -> bool {
            true
        }

        fn disconnect(&mut self) {}
    }

    impl SamCommands for MockAdapter {}
    impl FullSamAdapter for MockAdapter {}
}
