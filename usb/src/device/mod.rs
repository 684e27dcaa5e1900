use crate::device::base::{AdapterFactory, FullSamAdapter};
use crate::error::ConnectError;

pub mod base;
mod libusb;

/// Open the GLM adapter at the fixed vendor / product identifier.
pub fn attach_adapter() -> Result<Box<dyn FullSamAdapter>, ConnectError> {
    libusb::SamUsb::from_usb()
}

/// Production [`AdapterFactory`] backed by libusb.
pub struct UsbAdapterFactory;

impl AdapterFactory for UsbAdapterFactory {
    fn attach(&self) -> Result<Box<dyn FullSamAdapter>, ConnectError> {
        attach_adapter()
    }
}
