use hidapi::HidApi;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::drivers::dualsense::{
    driver::DS5_EDGE_PID,
    error::DualSenseError,
    hid_report::FirmwareInfo,
    transport::{self, DeviceEntry},
};

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Transport")]
    transport: String,
}

impl From<&DeviceEntry> for DeviceRow {
    fn from(entry: &DeviceEntry) -> Self {
        let model = if entry.product_id == DS5_EDGE_PID {
            "DualSense Edge"
        } else {
            "DualSense"
        };
        Self {
            serial: entry.serial.clone().unwrap_or_default(),
            model: model.to_string(),
            transport: entry.transport().to_string(),
        }
    }
}

/// Print a table of all connected controllers
pub fn handle_list(api: &HidApi) -> Result<(), DualSenseError> {
    let devices = transport::enumerate(api);
    if devices.is_empty() {
        return Err(DualSenseError::NoDevice);
    }
    let count = devices.len();
    let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("DualSense Devices"));
    println!("{table}");
    println!("Found {count} device(s)");

    Ok(())
}

/// Print the firmware information of a controller
pub fn print_info(info: &FirmwareInfo) {
    let hw = &info.hardware;
    println!(
        "Hardware: {:x} (variation {}, generation {}, trial {})",
        hw.raw, hw.variation, hw.generation, hw.trial
    );
    println!("Build date: {} {}", info.build_date, info.build_time);
    println!(
        "Firmware: {:x} (type {}, version {})",
        info.firmware_version,
        info.firmware_type,
        info.firmware_version_string()
    );
    let [fw1, fw2, fw3] = info.fw_versions;
    println!("Fw version: {fw1} {fw2} {fw3}");
    println!("Sw series: {}", info.sw_series);
    println!("Update version: {:04x}", info.update_version);
}
