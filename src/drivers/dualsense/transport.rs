use std::fmt::Display;

use hidapi::{HidApi, HidDevice, HidError};

use super::driver::{DS5_VID, PIDS};

/// The bus a controller is connected over. Output report layout and signing
/// depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Usb,
    Bluetooth,
}

impl TransportKind {
    /// hidapi reports an interface number of -1 for Bluetooth devices
    pub fn from_interface_number(interface_number: i32) -> Self {
        if interface_number == -1 {
            Self::Bluetooth
        } else {
            Self::Usb
        }
    }
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            TransportKind::Usb => "USB",
            TransportKind::Bluetooth => "Bluetooth",
        };
        write!(f, "{value}")
    }
}

/// Raw HID byte transport used to talk to a single opened controller
pub trait Transport {
    /// Read an input report into the buffer, waiting at most `timeout_ms`.
    /// Returns the number of bytes read, 0 on timeout.
    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, HidError>;
    /// Write an output report. The first byte must be the report id.
    fn write(&self, data: &[u8]) -> Result<usize, HidError>;
    /// Get a feature report. The first byte of the buffer must be set to the
    /// report id to request.
    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize, HidError>;
}

impl Transport for HidDevice {
    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, HidError> {
        HidDevice::read_timeout(self, buf, timeout_ms)
    }

    fn write(&self, data: &[u8]) -> Result<usize, HidError> {
        HidDevice::write(self, data)
    }

    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize, HidError> {
        HidDevice::get_feature_report(self, buf)
    }
}

/// A supported controller found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub serial: Option<String>,
    pub product_id: u16,
    pub interface_number: i32,
}

impl DeviceEntry {
    pub fn transport(&self) -> TransportKind {
        TransportKind::from_interface_number(self.interface_number)
    }

    /// Returns true if this entry should be selected for the given serial.
    /// Any device matches if no serial was requested.
    pub fn matches(&self, serial: Option<&str>) -> bool {
        match serial {
            None => true,
            Some(serial) => self.serial.as_deref() == Some(serial),
        }
    }
}

/// Enumerate all connected DualSense and DualSense Edge controllers
pub fn enumerate(api: &HidApi) -> Vec<DeviceEntry> {
    api.device_list()
        .filter(|info| info.vendor_id() == DS5_VID && PIDS.contains(&info.product_id()))
        .map(|info| DeviceEntry {
            serial: info.serial_number().map(|s| s.to_string()),
            product_id: info.product_id(),
            interface_number: info.interface_number(),
        })
        .collect()
}

/// Open the given enumerated controller
pub fn open(api: &HidApi, entry: &DeviceEntry) -> Result<HidDevice, HidError> {
    match entry.serial.as_deref() {
        Some(serial) => api.open_serial(DS5_VID, entry.product_id, serial),
        None => api.open(DS5_VID, entry.product_id),
    }
}
