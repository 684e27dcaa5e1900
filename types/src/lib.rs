use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Power transition requested of the session manager.
#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub enum PowerMode {
    Toggle,
    Wake,
    Shutdown,
}

/// Configured behaviour of a power key.
#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerActionMode {
    Toggle,
    WakeOnly,
    ShutdownOnly,
}

/// Configured behaviour when the volume dial is pressed.
#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressAction {
    ToggleMute,
    ResetToDefault,
}

/// How a volume value is rendered on the control surface.
#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Decibels,
    Percentage,
}
