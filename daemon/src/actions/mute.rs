use std::sync::Arc;

use crate::session::{DeviceError, SessionManager};

/// Key toggling mute on every monitor.
pub struct MuteKey {
    manager: Arc<SessionManager>,
}

impl MuteKey {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Key pressed; returns the new mute state.
    pub fn on_press(&self) -> Result<bool, DeviceError> {
        self.manager.toggle_mute()
    }

    pub fn label(&self) -> String {
        let state = self.manager.state();
        if !state.connected {
            return "...".to_string();
        }
        match state.muted {
            true => "Muted".to_string(),
            false => "Live".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::mock::MockFactory;
    use crate::session::{SafetyLimits, SessionManager};

    #[test]
    fn press_toggles_and_label_follows() {
        let manager = Arc::new(SessionManager::new(
            SafetyLimits::default(),
            Box::new(MockFactory::new(-30.0)),
        ));
        let key = MuteKey::new(manager.clone());

        assert_eq!(key.label(), "...");
        assert!(key.on_press().unwrap());
        assert_eq!(key.label(), "Muted");
        assert!(!key.on_press().unwrap());
        assert_eq!(key.label(), "Live");
    }
}
