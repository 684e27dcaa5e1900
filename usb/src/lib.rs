pub use rusb;
pub mod commands;
pub mod error;

mod device;

pub use device::attach_adapter;
pub use device::base::{
    AdapterFactory, AttachSamAdapter, ExecutableSamAdapter, FullSamAdapter, SamCommands,
};
pub use device::UsbAdapterFactory;

/// Fixed identifiers of the GLM USB network adapter.
pub const VID_GLM_ADAPTER: u16 = 0x1781;
pub const PID_GLM_ADAPTER: u16 = 0x0e39;
