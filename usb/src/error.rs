#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No GLM adapter was found")]
    DeviceNotFound,

    #[error("Insufficient permissions to open the GLM adapter")]
    PermissionDenied,

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error("Malformed response from the GLM adapter")]
    MalformedResponse,
}
