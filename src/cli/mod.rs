#[cfg(test)]
pub mod args_test;
pub mod device;
pub mod trigger;

use std::io;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use device::{handle_list, print_info};
use hidapi::HidApi;
use thiserror::Error;
use trigger::{Side, TriggerCommand};

use crate::drivers::dualsense::{
    driver::Driver,
    error::{DualSenseError, ValidationError},
    hid_report::AudioOutputPath,
    trigger::TriggerEffect,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available devices
    #[arg(short, long)]
    pub list: bool,
    /// Serial of the controller to use (defaults to the first one found)
    #[arg(short, long, env = "DS_DEV", value_name = "SERIAL")]
    pub device: Option<String>,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List available devices
    List,
    /// Get the controller battery level and charging state
    Battery,
    /// Get the controller firmware info
    Info,
    /// Set the lightbar state (on|off) or color (RED GREEN BLUE [BRIGHTNESS])
    Lightbar {
        #[arg(num_args = 1..=4, required = true, value_name = "STATE | RED GREEN BLUE [BRIGHTNESS]")]
        values: Vec<String>,
    },
    /// Light up the player LEDs for the given player number (0-5)
    PlayerLeds { number: u32 },
    /// Enable or disable the microphone
    Microphone { state: Toggle },
    /// Turn the microphone mute LED on or off
    MicrophoneLed { state: Toggle },
    /// Select where audio is played
    Speaker { path: Speaker },
    /// Set the audio volume (0-255) of the internal speaker and headphone jack
    Volume { volume: u32 },
    /// Set the attenuation (0-7) of the rumble and trigger vibration
    Attenuation { rumble: u32, trigger: u32 },
    /// Set the effect of the adaptive triggers
    Trigger {
        side: Side,
        #[command(subcommand)]
        cmd: TriggerCommand,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(value: Toggle) -> Self {
        value == Toggle::On
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Speaker {
    /// Internal speaker only
    Internal,
    /// Headphone jack only
    Headphone,
    /// Left channel of the headphone jack only
    #[value(name = "monoheadphone")]
    MonoHeadphone,
    /// Headphone jack and internal speaker
    Both,
}

impl From<Speaker> for AudioOutputPath {
    fn from(value: Speaker) -> Self {
        match value {
            Speaker::Internal => AudioOutputPath::Internal,
            Speaker::Headphone => AudioOutputPath::Headphone,
            Speaker::MonoHeadphone => AudioOutputPath::MonoHeadphone,
            Speaker::Both => AudioOutputPath::Both,
        }
    }
}

/// Lightbar command forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lightbar {
    Enabled(bool),
    Color { r: u8, g: u8, b: u8, brightness: u8 },
}

impl Lightbar {
    /// Parse `on`, `off` or `RED GREEN BLUE [BRIGHTNESS]`
    pub fn parse(values: &[String]) -> Result<Self, ValidationError> {
        match values {
            [state] => match state.as_str() {
                "on" => Ok(Self::Enabled(true)),
                "off" => Ok(Self::Enabled(false)),
                _ => Err(ValidationError::InvalidValue {
                    name: "lightbar state",
                    value: state.clone(),
                }),
            },
            [r, g, b] => Ok(Self::Color {
                r: parse_color("red", r)?,
                g: parse_color("green", g)?,
                b: parse_color("blue", b)?,
                brightness: 255,
            }),
            [r, g, b, brightness] => Ok(Self::Color {
                r: parse_color("red", r)?,
                g: parse_color("green", g)?,
                b: parse_color("blue", b)?,
                brightness: parse_color("brightness", brightness)?,
            }),
            _ => Err(ValidationError::InvalidValue {
                name: "lightbar arguments",
                value: values.join(" "),
            }),
        }
    }
}

fn parse_color(name: &'static str, value: &str) -> Result<u8, ValidationError> {
    let Ok(parsed) = value.parse::<u32>() else {
        return Err(ValidationError::InvalidValue {
            name,
            value: value.to_string(),
        });
    };
    ValidationError::check_byte(name, parsed, 0, 255)
}

/// Possible errors when running a command
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] clap::Error),
    #[error(transparent)]
    Device(#[from] DualSenseError),
}

impl CliError {
    /// Returns the process exit status that should be reported for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(err) => err.exit_code() as u8,
            Self::Device(err) => err.exit_code(),
        }
    }
}

/// Check the arguments of a command. Runs before any device is opened so
/// range errors are reported even without a controller attached.
pub fn validate(cmd: &Commands) -> Result<(), ValidationError> {
    match cmd {
        Commands::Lightbar { values } => {
            Lightbar::parse(values)?;
        }
        Commands::PlayerLeds { number } => {
            ValidationError::check_byte("player number", *number, 0, 5)?;
        }
        Commands::Volume { volume } => {
            ValidationError::check_byte("volume", *volume, 0, 255)?;
        }
        Commands::Attenuation { rumble, trigger } => {
            ValidationError::check_byte("rumble attenuation", *rumble, 0, 7)?;
            ValidationError::check_byte("trigger attenuation", *trigger, 0, 7)?;
        }
        Commands::Trigger { cmd, .. } => {
            TriggerEffect::from(cmd.clone()).encode()?;
        }
        _ => (),
    }
    Ok(())
}

pub fn main_cli(args: Args) -> Result<(), CliError> {
    let cmd = match args.cmd {
        Some(cmd) => cmd,
        None if args.list => Commands::List,
        None => {
            let mut command = Args::command();
            command.print_help().map_err(clap::Error::from)?;
            return Ok(());
        }
    };

    // Commands that do not need a device
    match cmd {
        Commands::Completions { shell } => {
            let mut command = Args::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            return Ok(());
        }
        Commands::List => {
            let api = HidApi::new().map_err(DualSenseError::from)?;
            return Ok(handle_list(&api)?);
        }
        _ => (),
    }

    validate(&cmd).map_err(DualSenseError::from)?;

    let api = HidApi::new().map_err(DualSenseError::from)?;
    let mut driver = Driver::open(&api, args.device.as_deref())?;
    log::debug!(
        "Using controller {} over {}",
        driver.mac_address(),
        driver.transport()
    );

    match cmd {
        Commands::List | Commands::Completions { .. } => (),
        Commands::Battery => {
            let battery = driver.battery()?;
            println!("{battery}");
        }
        Commands::Info => {
            let info = driver.firmware_info()?;
            print_info(&info);
        }
        Commands::Lightbar { values } => {
            match Lightbar::parse(&values).map_err(DualSenseError::from)? {
                Lightbar::Enabled(enabled) => driver.set_lightbar_enabled(enabled)?,
                Lightbar::Color {
                    r,
                    g,
                    b,
                    brightness,
                } => driver.set_lightbar_color(r, g, b, brightness)?,
            }
        }
        Commands::PlayerLeds { number } => {
            let number = ValidationError::check_byte("player number", number, 0, 5)
                .map_err(DualSenseError::from)?;
            driver.set_player_leds(number)?;
        }
        Commands::Microphone { state } => driver.set_microphone_enabled(state.into())?,
        Commands::MicrophoneLed { state } => driver.set_microphone_led(state.into())?,
        Commands::Speaker { path } => driver.set_speaker(path.into())?,
        Commands::Volume { volume } => {
            let volume = ValidationError::check_byte("volume", volume, 0, 255)
                .map_err(DualSenseError::from)?;
            driver.set_volume(volume)?;
        }
        Commands::Attenuation { rumble, trigger } => {
            let rumble = ValidationError::check_byte("rumble attenuation", rumble, 0, 7)
                .map_err(DualSenseError::from)?;
            let trigger = ValidationError::check_byte("trigger attenuation", trigger, 0, 7)
                .map_err(DualSenseError::from)?;
            driver.set_attenuation(rumble, trigger)?;
        }
        Commands::Trigger { side, cmd } => {
            let effect = TriggerEffect::from(cmd);
            driver.set_trigger_effect(side.into(), &effect)?;
        }
    }

    Ok(())
}
