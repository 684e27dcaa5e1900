use samdeck_types::DisplayMode;

pub mod mute;
pub mod power;
pub mod volume_dial;

pub use mute::MuteKey;
pub use power::PowerKey;
pub use volume_dial::VolumeDial;

/// Log-scale conversion for the percentage display: 0 dB is 100%, the
/// -130 dB floor is 0%.
pub fn db_to_percent(db: f32) -> f32 {
    if db <= crate::session::HARD_FLOOR_DB {
        return 0.0;
    }
    (100.0 * 10_f32.powf(db / 20.0)).clamp(0.0, 100.0)
}

pub fn format_volume(db: f32, mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Decibels => format!("{:.1}dB", db),
        DisplayMode::Percentage => format!("{:.0}%", db_to_percent(db)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_conversion() {
        assert_eq!(db_to_percent(0.0), 100.0);
        assert_eq!(db_to_percent(-130.0), 0.0);
        assert!((db_to_percent(-20.0) - 10.0).abs() < 0.01);
    }

    #[test]
    fn volume_formatting() {
        assert_eq!(format_volume(-30.0, DisplayMode::Decibels), "-30.0dB");
        assert_eq!(format_volume(-30.0, DisplayMode::Percentage), "3%");
        assert_eq!(format_volume(0.0, DisplayMode::Percentage), "100%");
    }
}
