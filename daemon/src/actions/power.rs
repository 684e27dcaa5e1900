use std::sync::Arc;

use samdeck_types::{PowerActionMode, PowerMode};

use crate::session::{DeviceError, SessionManager};

/// Key waking or shutting down every monitor.
pub struct PowerKey {
    manager: Arc<SessionManager>,
    mode: PowerActionMode,
}

impl PowerKey {
    pub fn new(manager: Arc<SessionManager>, mode: PowerActionMode) -> Self {
        Self { manager, mode }
    }

    /// Key pressed; returns the new powered state.
    pub fn on_press(&self) -> Result<bool, DeviceError> {
        let mode = match self.mode {
            PowerActionMode::Toggle => PowerMode::Toggle,
            PowerActionMode::WakeOnly => PowerMode::Wake,
            PowerActionMode::ShutdownOnly => PowerMode::Shutdown,
        };
        self.manager.set_power(mode)
    }

    pub fn label(&self) -> String {
        match self.manager.state().powered {
            true => "On".to_string(),
            false => "Off".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::mock::MockFactory;
    use crate::session::{SafetyLimits, SessionManager};

    fn key(mode: PowerActionMode) -> (PowerKey, Arc<SessionManager>) {
        let manager = Arc::new(SessionManager::new(
            SafetyLimits::default(),
            Box::new(MockFactory::new(-30.0)),
        ));
        (PowerKey::new(manager.clone(), mode), manager)
    }

    #[test]
    fn toggle_flips_power() {
        let (key, manager) = key(PowerActionMode::Toggle);
        manager.ensure_connected().unwrap();

        assert!(!key.on_press().unwrap());
        assert_eq!(key.label(), "Off");
        assert!(key.on_press().unwrap());
        assert_eq!(key.label(), "On");
    }

    #[test]
    fn wake_only_never_shuts_down() {
        let (key, _) = key(PowerActionMode::WakeOnly);
        assert!(key.on_press().unwrap());
        assert!(key.on_press().unwrap());
    }

    #[test]
    fn shutdown_only_always_shuts_down() {
        let (key, manager) = key(PowerActionMode::ShutdownOnly);
        assert!(!key.on_press().unwrap());
        assert!(!manager.state().powered);
    }
}
