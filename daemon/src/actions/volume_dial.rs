use std::sync::Arc;

use log::debug;
use samdeck_types::PressAction;

use crate::actions::format_volume;
use crate::session::{DeviceError, SessionManager};
use crate::settings::DialSettings;

/// Rotary dial controlling the master volume. Rotation adjusts by the
/// configured step within the dial's window; pressing either toggles mute
/// or resets to the default volume.
pub struct VolumeDial {
    manager: Arc<SessionManager>,
    settings: DialSettings,
}

impl VolumeDial {
    pub fn new(manager: Arc<SessionManager>, mut settings: DialSettings) -> Self {
        // The configuration surface allows 0.5 to 6.0 dB per tick.
        settings.step_db = settings.step_db.clamp(0.5, 6.0);
        Self { manager, settings }
    }

    /// Dial rotated; positive ticks are clockwise. Returns the volume
    /// actually applied.
    pub fn on_rotate(&self, ticks: i32) -> Result<f32, DeviceError> {
        let delta = ticks as f32 * self.settings.step_db;
        debug!("Dial rotated {} ticks ({:+.1}dB)", ticks, delta);

        self.manager.adjust_volume_within(
            delta,
            self.settings.min_volume_db,
            self.settings.max_volume_db,
        )
    }

    /// Dial pressed down.
    pub fn on_press(&self) -> Result<(), DeviceError> {
        match self.settings.press_action {
            PressAction::ToggleMute => {
                self.manager.toggle_mute()?;
            }
            PressAction::ResetToDefault => {
                self.manager.set_volume(self.settings.default_volume_db)?;
            }
        }
        Ok(())
    }

    /// Text for the dial's centre label.
    pub fn label(&self) -> String {
        let state = self.manager.state();
        if !state.connected {
            return "...".to_string();
        }
        if state.muted {
            return "Muted".to_string();
        }
        format_volume(state.volume_db, self.settings.display_mode)
    }

    /// Position of the dial indicator, normalised to the dial's window.
    pub fn indicator(&self) -> f32 {
        let state = self.manager.state();
        let (min, max) = (self.settings.min_volume_db, self.settings.max_volume_db);
        if max <= min {
            return 0.5;
        }
        ((state.volume_db - min) / (max - min)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use samdeck_types::{DisplayMode, PressAction};

    use super::*;
    use crate::session::mock::MockFactory;
    use crate::session::{SafetyLimits, SessionManager};
    use crate::settings::DialSettings;

    fn dial(settings: DialSettings) -> (VolumeDial, Arc<SessionManager>) {
        let manager = Arc::new(SessionManager::new(
            SafetyLimits::default(),
            Box::new(MockFactory::new(-30.0)),
        ));
        (VolumeDial::new(manager.clone(), settings), manager)
    }

    #[test]
    fn rotation_applies_step_within_window() {
        let (dial, manager) = dial(DialSettings {
            step_db: 2.0,
            ..DialSettings::default()
        });

        assert_eq!(dial.on_rotate(1).unwrap(), -28.0);
        assert_eq!(dial.on_rotate(-3).unwrap(), -34.0);
        assert_eq!(manager.state().volume_db, -34.0);

        // Window floor at -60 wins over the raw delta.
        assert_eq!(dial.on_rotate(-100).unwrap(), -60.0);
    }

    #[test]
    fn oversized_step_is_clamped() {
        let (dial, _) = dial(DialSettings {
            step_db: 50.0,
            ..DialSettings::default()
        });
        assert_eq!(dial.on_rotate(-1).unwrap(), -36.0);
    }

    #[test]
    fn press_toggles_mute() {
        let (dial, manager) = dial(DialSettings::default());
        dial.on_press().unwrap();
        assert!(manager.state().muted);
        assert_eq!(dial.label(), "Muted");
    }

    #[test]
    fn press_resets_to_default() {
        let (dial, manager) = dial(DialSettings {
            press_action: PressAction::ResetToDefault,
            default_volume_db: -25.0,
            ..DialSettings::default()
        });

        dial.on_rotate(5).unwrap();
        dial.on_press().unwrap();
        assert_eq!(manager.state().volume_db, -25.0);
    }

    #[test]
    fn label_reflects_connection_and_display_mode() {
        let (dial, manager) = dial(DialSettings {
            display_mode: DisplayMode::Decibels,
            ..DialSettings::default()
        });

        assert_eq!(dial.label(), "...");
        manager.ensure_connected().unwrap();
        assert_eq!(dial.label(), "-30.0dB");
    }

    #[test]
    fn indicator_normalises_to_window() {
        let (dial, manager) = dial(DialSettings {
            min_volume_db: -60.0,
            max_volume_db: 0.0,
            ..DialSettings::default()
        });
        manager.ensure_connected().unwrap();
        assert!((dial.indicator() - 0.5).abs() < 0.001);
    }
}
