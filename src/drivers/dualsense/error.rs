use hidapi::HidError;
use packed_struct::PackingError;
use thiserror::Error;

/// Exit status used when a command could not be validated
pub const EXIT_VALIDATION: u8 = 1;
/// Exit status used when the device could not be reached
pub const EXIT_TRANSPORT: u8 = 2;
/// Exit status used when the device replied with something unexpected
pub const EXIT_PROTOCOL: u8 = 3;

/// A parameter given to a command was outside of its documented range. These
/// are always raised before any report is built or written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("{name} must be greater than 0")]
    NotPositive { name: &'static str },
    #[error("strength at zone {index} must be between 0 and 8, got {value}")]
    StrengthOutOfRange { index: usize, value: u8 },
    #[error("invalid player number `{0}`, must be between 0 and 5")]
    PlayerOutOfRange(u32),
    #[error("invalid {name} `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

impl ValidationError {
    /// Check that `value` lies within `min..=max`
    pub fn check_range(name: &'static str, value: u8, min: u8, max: u8) -> Result<(), Self> {
        Self::check_byte(name, u32::from(value), min, max).map(|_| ())
    }

    /// Check that a command line `value` lies within `min..=max` and return
    /// it as a byte
    pub fn check_byte(name: &'static str, value: u32, min: u8, max: u8) -> Result<u8, Self> {
        if value < u32::from(min) || value > u32::from(max) {
            return Err(Self::OutOfRange {
                name,
                min: u32::from(min),
                max: u32::from(max),
                value,
            });
        }
        Ok(value as u8)
    }

    /// Check that `value` is non-zero
    pub fn check_positive(name: &'static str, value: u8) -> Result<(), Self> {
        if value == 0 {
            return Err(Self::NotPositive { name });
        }
        Ok(())
    }
}

/// Possible errors when talking to a DualSense controller
#[derive(Error, Debug)]
pub enum DualSenseError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("no device found")]
    NoDevice,
    #[error("device '{0}' not found")]
    DeviceNotFound(String),
    #[error("transport error: {0}")]
    Transport(#[from] HidError),
    #[error("incomplete write: {written} of {expected} bytes")]
    IncompleteWrite { written: usize, expected: usize },
    #[error("unknown report: {0}")]
    Protocol(String),
    #[error("timeout waiting for report")]
    Timeout,
    #[error("unable to pack report: {0:?}")]
    Packing(#[from] PackingError),
}

impl DualSenseError {
    /// Returns the process exit status that should be reported for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::NoDevice | Self::DeviceNotFound(_) => EXIT_VALIDATION,
            Self::Transport(_) | Self::IncompleteWrite { .. } | Self::Timeout => EXIT_TRANSPORT,
            Self::Protocol(_) | Self::Packing(_) => EXIT_PROTOCOL,
        }
    }
}
