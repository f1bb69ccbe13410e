pub mod driver;
pub mod error;
pub mod hid_report;
pub mod transport;
pub mod trigger;
#[cfg(test)]
pub mod trigger_test;
