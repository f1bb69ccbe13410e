use hidapi::HidApi;

use super::{
    error::{DualSenseError, ValidationError},
    hid_report::{
        AudioOutputPath, BatteryStatus, FirmwareInfo, LightbarSetup, MuteLight,
        PackedInputDataReport, PackedOutputReport, SetStatePackedOutputData,
    },
    transport::{self, DeviceEntry, Transport, TransportKind},
    trigger::{TriggerEffect, TriggerSide},
};
use packed_struct::prelude::*;

// Source: https://github.com/torvalds/linux/blob/master/drivers/hid/hid-playstation.c
pub const DS5_EDGE_PID: u16 = 0x0df2;

pub const DS5_VID: u16 = 0x054c;
pub const DS5_PID: u16 = 0x0ce6;

pub const PIDS: [u16; 2] = [DS5_PID, DS5_EDGE_PID];

/// Seed value hashed before the data of a signed output report
pub const OUTPUT_CRC32_SEED: u8 = 0xA2;

pub const FEATURE_REPORT_FIRMWARE_INFO: u8 = 0x20;
pub const FEATURE_REPORT_FIRMWARE_INFO_SIZE: usize = 64;

pub const INPUT_REPORT_USB: u8 = 0x01;
pub const INPUT_REPORT_USB_SIZE: usize = 64;
pub const INPUT_REPORT_BT: u8 = 0x31;
pub const INPUT_REPORT_BT_SIZE: usize = 78;
pub const OUTPUT_REPORT_USB: u8 = 0x02;
pub const OUTPUT_REPORT_USB_SIZE: usize = 64;
pub const OUTPUT_REPORT_BT: u8 = 0x31;
pub const OUTPUT_REPORT_BT_SIZE: usize = 79;
/// Magic value required in the tag field of Bluetooth output reports
pub const OUTPUT_REPORT_BT_TAG: u8 = 0x10;

/// How long to wait for an input report when querying the battery
pub const READ_TIMEOUT_MS: i32 = 1000;

/// Player LED patterns for players 0 (off) through 5
pub const PLAYER_LEDS: [u8; 6] = [
    0,
    1 << 2,
    1 << 3 | 1 << 1,
    1 << 4 | 1 << 2 | 1 << 0,
    1 << 4 | 1 << 3 | 1 << 1 | 1 << 0,
    1 << 4 | 1 << 3 | 1 << 2 | 1 << 1 | 1 << 0,
];

/// Serial used when the device does not report a MAC address style serial
const UNKNOWN_MAC_ADDRESS: &str = "00:00:00:00:00:00";

/// PS5 DualSense controller driver for issuing commands to and reading status
/// from a single opened controller.
pub struct Driver<T: Transport> {
    device: T,
    transport: TransportKind,
    mac_address: String,
    output_seq: u8,
}

impl Driver<hidapi::HidDevice> {
    /// Open the controller with the given serial, or the first one found if
    /// no serial is given.
    pub fn open(api: &HidApi, serial: Option<&str>) -> Result<Self, DualSenseError> {
        let devices = transport::enumerate(api);
        let Some(entry) = devices.iter().find(|entry| entry.matches(serial)) else {
            return Err(match serial {
                Some(serial) => DualSenseError::DeviceNotFound(serial.to_string()),
                None => DualSenseError::NoDevice,
            });
        };
        let device = transport::open(api, entry)?;

        Ok(Self::new(device, entry))
    }
}

impl<T: Transport> Driver<T> {
    pub fn new(device: T, entry: &DeviceEntry) -> Self {
        let transport = entry.transport();
        let mac_address = mac_address_from_serial(entry.serial.as_deref().unwrap_or_default());
        log::debug!("Opened DualSense {mac_address} over {transport}");

        Self {
            device,
            transport,
            mac_address,
            output_seq: 0,
        }
    }

    /// Returns the underlying transport of the controller
    #[cfg(test)]
    pub fn device(&self) -> &T {
        &self.device
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn mac_address(&self) -> &str {
        &self.mac_address
    }

    /// Create a new empty output report for this controller. For Bluetooth
    /// this consumes the next sequence number.
    pub fn init_output_report(&mut self) -> PackedOutputReport {
        let report = PackedOutputReport::new(self.transport, self.output_seq);
        if self.transport == TransportKind::Bluetooth {
            self.output_seq = (self.output_seq + 1) % 16;
        }
        report
    }

    /// Sign the given output report if required and write it to the device
    pub fn send_output_report(&self, report: &PackedOutputReport) -> Result<(), DualSenseError> {
        let buf = report.pack_signed()?;
        let expected = match self.transport {
            TransportKind::Usb => OUTPUT_REPORT_USB_SIZE,
            TransportKind::Bluetooth => OUTPUT_REPORT_BT_SIZE,
        };
        log::trace!("Writing output report: {buf:02x?}");
        let bytes_written = self.device.write(&buf)?;
        if bytes_written < expected {
            return Err(DualSenseError::IncompleteWrite {
                written: bytes_written,
                expected,
            });
        }
        log::debug!("Wrote {bytes_written} bytes to {}", self.mac_address);

        Ok(())
    }

    /// Build an output report, let `update` fill in the state and send it
    fn write<F>(&mut self, update: F) -> Result<(), DualSenseError>
    where
        F: FnOnce(&mut SetStatePackedOutputData),
    {
        let mut report = self.init_output_report();
        update(report.state_mut());
        self.send_output_report(&report)
    }

    /// Turn the lightbar on or off
    pub fn set_lightbar_enabled(&mut self, enabled: bool) -> Result<(), DualSenseError> {
        log::debug!("Setting lightbar enabled: {enabled}");
        self.write(|state| {
            state.allow_lightbar_setup = true;
            state.lightbar_setup = if enabled {
                LightbarSetup::LightOn
            } else {
                LightbarSetup::LightOut
            };
        })
    }

    /// Set the color of the lightbar, scaled by the given brightness
    pub fn set_lightbar_color(
        &mut self,
        r: u8,
        g: u8,
        b: u8,
        brightness: u8,
    ) -> Result<(), DualSenseError> {
        log::debug!("Setting LED color to: {r}, {g}, {b} with brightness {brightness}");
        let scale = |value: u8| (u16::from(brightness) * u16::from(value) / 255) as u8;
        self.write(|state| {
            state.allow_led_color = true;
            state.led_red = scale(r);
            state.led_green = scale(g);
            state.led_blue = scale(b);
        })
    }

    /// Light up the player indicator LEDs for the given player number (0-5)
    pub fn set_player_leds(&mut self, player: u8) -> Result<(), DualSenseError> {
        let Some(&pattern) = PLAYER_LEDS.get(player as usize) else {
            return Err(ValidationError::PlayerOutOfRange(u32::from(player)).into());
        };
        self.write(|state| {
            state.allow_player_indicators = true;
            state.player_lights = Integer::from_primitive(pattern);
        })
    }

    /// Enable or disable (mute) the microphone
    pub fn set_microphone_enabled(&mut self, enabled: bool) -> Result<(), DualSenseError> {
        self.write(|state| {
            state.allow_power_save_control = true;
            state.mic_mute = !enabled;
        })
    }

    /// Turn the microphone mute LED on or off
    pub fn set_microphone_led(&mut self, enabled: bool) -> Result<(), DualSenseError> {
        self.write(|state| {
            state.allow_mute_light = true;
            state.mute_light_mode = if enabled { MuteLight::On } else { MuteLight::Off };
        })
    }

    /// Route audio to the internal speaker and/or the headphone jack
    pub fn set_speaker(&mut self, path: AudioOutputPath) -> Result<(), DualSenseError> {
        self.write(|state| {
            state.allow_audio_control = true;
            state.output_path_select = path;
        })
    }

    /// Set the headphone and speaker volume from a single 0-255 volume
    pub fn set_volume(&mut self, volume: u8) -> Result<(), DualSenseError> {
        // The console uses 0x3d-0x64 for the speaker; higher values do not
        // change anything, lower values still reduce the volume.
        let headphone = (u16::from(volume) * 0x7f / 255) as u8;
        let speaker = (u16::from(volume) * 0x64 / 255) as u8;
        self.write(|state| {
            state.allow_headphone_volume = true;
            state.volume_headphones = headphone;
            state.allow_speaker_volume = true;
            state.volume_speakers = speaker;
        })
    }

    /// Set the attenuation (0-7) of the rumble/haptic motors and of the
    /// trigger vibration.
    pub fn set_attenuation(&mut self, rumble: u8, trigger: u8) -> Result<(), DualSenseError> {
        ValidationError::check_range("rumble attenuation", rumble, 0, 7)?;
        ValidationError::check_range("trigger attenuation", trigger, 0, 7)?;
        self.write(|state| {
            state.allow_motor_power_level = true;
            state.rumble_motor_power_reduction = Integer::from_primitive(rumble & 0x07);
            state.trigger_motor_power_reduction = Integer::from_primitive(trigger & 0x07);
        })
    }

    /// Apply the given effect to the adaptive trigger(s)
    pub fn set_trigger_effect(
        &mut self,
        side: TriggerSide,
        effect: &TriggerEffect,
    ) -> Result<(), DualSenseError> {
        let params = effect.encode()?;
        log::debug!("Setting {side:?} trigger effect {effect:?}: {params:?}");
        self.write(|state| params.apply(side, state))
    }

    /// Read an input report and return the battery status
    pub fn battery(&self) -> Result<BatteryStatus, DualSenseError> {
        let mut buf = [0; INPUT_REPORT_BT_SIZE];
        let bytes_read = self.device.read_timeout(&mut buf[..], READ_TIMEOUT_MS)?;
        if bytes_read == 0 {
            return Err(DualSenseError::Timeout);
        }
        let slice = &buf[..bytes_read.min(buf.len())];
        let report = PackedInputDataReport::unpack(slice, self.transport)?;

        Ok(report.state().battery())
    }

    /// Request the firmware info feature report
    pub fn firmware_info(&self) -> Result<FirmwareInfo, DualSenseError> {
        let mut buf = [0; FEATURE_REPORT_FIRMWARE_INFO_SIZE];
        buf[0] = FEATURE_REPORT_FIRMWARE_INFO;
        let bytes_read = self.device.get_feature_report(&mut buf[..])?;
        let slice = &buf[..bytes_read.min(buf.len())];

        FirmwareInfo::unpack(slice)
    }
}

/// Normalize a device serial into an upper case MAC address
pub fn mac_address_from_serial(serial: &str) -> String {
    if serial.chars().count() != UNKNOWN_MAC_ADDRESS.len() {
        log::warn!("Invalid device serial number: {serial}");
        return UNKNOWN_MAC_ADDRESS.to_string();
    }
    serial
        .chars()
        .enumerate()
        .map(|(i, c)| if (i + 1) % 3 != 0 { c.to_ascii_uppercase() } else { c })
        .collect()
}
