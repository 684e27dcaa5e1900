use crate::commands::{self, Command};
use crate::error::{CommandError, ConnectError};

// This is a basic SuperTrait which defines a fully usable GLM adapter.
pub trait FullSamAdapter: AttachSamAdapter + SamCommands + Send {}

pub trait AttachSamAdapter {
    fn is_connected(&mut self) -> bool;
    fn disconnect(&mut self);
}

pub trait ExecutableSamAdapter {
    /// Perform a single command round-trip, returning the response payload.
    fn request(&mut self, command: Command) -> Result<Vec<u8>, CommandError>;
}

// Commands the GLM network understands, built on top of a raw request.
pub trait SamCommands: ExecutableSamAdapter {
    fn get_volume_db(&mut self) -> Result<f32, CommandError> {
        let payload = self.request(Command::QueryState)?;
        let (volume, _) = commands::parse_state(&payload)?;
        Ok(volume)
    }

    fn set_volume_db(&mut self, db: f32) -> Result<(), CommandError> {
        self.request(Command::SetVolume(db))?;
        Ok(())
    }

    fn get_mute(&mut self) -> Result<bool, CommandError> {
        let payload = self.request(Command::QueryState)?;
        let (_, muted) = commands::parse_state(&payload)?;
        Ok(muted)
    }

    fn set_mute(&mut self, mute: bool) -> Result<(), CommandError> {
        self.request(Command::SetMute(mute))?;
        Ok(())
    }

    fn wake_all(&mut self) -> Result<(), CommandError> {
        self.request(Command::WakeAll)?;
        Ok(())
    }

    fn shutdown_all(&mut self) -> Result<(), CommandError> {
        self.request(Command::ShutdownAll)?;
        Ok(())
    }

    /// Keepalive preventing the monitors from dropping off the GLM network.
    fn stay_online(&mut self) -> Result<(), CommandError> {
        self.request(Command::StayOnline)?;
        Ok(())
    }

    fn get_state(&mut self) -> Result<(f32, bool), CommandError> {
        let payload = self.request(Command::QueryState)?;
        commands::parse_state(&payload)
    }
}

/// Seam through which the session manager obtains a live adapter. The
/// production implementation opens the USB device; tests substitute a mock.
pub trait AdapterFactory: Send + Sync {
    fn attach(&self) -> Result<Box<dyn FullSamAdapter>, ConnectError>;
}
