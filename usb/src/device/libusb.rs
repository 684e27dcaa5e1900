use std::time::Duration;

use log::{debug, info, warn};
use rusb::{Device, DeviceHandle, GlobalContext};

use crate::commands::{self, Command, REPORT_SIZE};
use crate::device::base::{
    AttachSamAdapter, ExecutableSamAdapter, FullSamAdapter, SamCommands,
};
use crate::error::{CommandError, ConnectError};
use crate::{PID_GLM_ADAPTER, VID_GLM_ADAPTER};

const INTERFACE: u8 = 0;
const ENDPOINT_OUT: u8 = 0x01;
const ENDPOINT_IN: u8 = 0x81;

pub struct SamUsb {
    handle: DeviceHandle<GlobalContext>,
    timeout: Duration,
}

impl SamUsb {
    fn find_device() -> Result<Device<GlobalContext>, ConnectError> {
        for device in rusb::devices()?.iter() {
            if let Ok(descriptor) = device.device_descriptor() {
                if descriptor.vendor_id() == VID_GLM_ADAPTER
                    && descriptor.product_id() == PID_GLM_ADAPTER
                {
                    return Ok(device);
                }
            }
        }
        Err(ConnectError::DeviceNotFound)
    }

    fn transfer(&mut self, report: &[u8]) -> Result<[u8; REPORT_SIZE], rusb::Error> {
        self.handle
            .write_interrupt(ENDPOINT_OUT, report, self.timeout)?;

        let mut response = [0; REPORT_SIZE];
        self.handle
            .read_interrupt(ENDPOINT_IN, &mut response, self.timeout)?;
        Ok(response)
    }

    pub(crate) fn from_usb() -> Result<Box<dyn FullSamAdapter>, ConnectError> {
        let device = SamUsb::find_device()?;

        let mut handle = device.open().map_err(|error| match error {
            rusb::Error::Access => ConnectError::PermissionDenied,
            rusb::Error::NoDevice | rusb::Error::NotFound => ConnectError::DeviceNotFound,
            other => ConnectError::UsbError(other),
        })?;

        // The kernel HID driver owns the interface until we detach it.
        if let Err(error) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", error);
        }

        handle.claim_interface(INTERFACE).map_err(|error| match error {
            rusb::Error::Access => ConnectError::PermissionDenied,
            other => ConnectError::UsbError(other),
        })?;

        if let Ok(languages) = handle.read_languages(Duration::from_millis(100)) {
            if let Some(language) = languages.first() {
                let descriptor = device.device_descriptor().ok();
                if let Some(descriptor) = descriptor {
                    let product = handle
                        .read_product_string(*language, &descriptor, Duration::from_millis(100))
                        .unwrap_or_default();
                    info!("Connected to GLM adapter: {}", product);
                }
            }
        }

        // Keep transfers short so a wedged adapter fails fast instead of
        // stalling the caller.
        Ok(Box::new(SamUsb {
            handle,
            timeout: Duration::from_millis(500),
        }))
    }
}

impl AttachSamAdapter for SamUsb {
    fn is_connected(&mut self) -> bool {
        self.handle.device().device_descriptor().is_ok()
    }

    fn disconnect(&mut self) {
        if let Err(error) = self.handle.release_interface(INTERFACE) {
            debug!("Unable to release GLM adapter interface: {}", error);
        }
    }
}

impl ExecutableSamAdapter for SamUsb {
    fn request(&mut self, command: Command) -> Result<Vec<u8>, CommandError> {
        let report = commands::encode(command);

        let response = match self.transfer(&report) {
            Ok(response) => response,
            Err(rusb::Error::Pipe) => {
                // A stalled endpoint can usually be recovered once.
                warn!("Endpoint stalled, clearing halt and retrying");
                self.handle.clear_halt(ENDPOINT_IN)?;
                self.transfer(&report)?
            }
            Err(error) => return Err(error.into()),
        };

        commands::decode(&response, command.opcode())
    }
}

impl SamCommands for SamUsb {}
impl FullSamAdapter for SamUsb {}
