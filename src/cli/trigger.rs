use clap::{Subcommand, ValueEnum};

use crate::drivers::dualsense::trigger::{TriggerEffect, TriggerSide, TRIGGER_ZONES};

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Side {
    Left,
    Right,
    Both,
}

impl From<Side> for TriggerSide {
    fn from(value: Side) -> Self {
        match value {
            Side::Left => TriggerSide::Left,
            Side::Right => TriggerSide::Right,
            Side::Both => TriggerSide::Both,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TriggerCommand {
    /// Remove all effects
    Off,
    /// Raw resistance: one strength (0-8) for each of the 10 zones
    FeedbackRaw {
        #[arg(num_args = TRIGGER_ZONES, required = true)]
        strength: Vec<u8>,
    },
    /// Resistance starting at a position
    Feedback {
        /// Start zone (0-9)
        position: u8,
        /// Resistance (1-8)
        strength: u8,
    },
    /// Trigger that resists until it breaks, like a gun trigger
    Weapon {
        /// Start zone (2-7)
        start: u8,
        /// End zone (START+1 to 8)
        end: u8,
        /// Resistance (1-8)
        strength: u8,
    },
    /// Trigger that snaps back at the end, like drawing a bow
    Bow {
        /// Start zone (0-8)
        start: u8,
        /// End zone (START+1 to 8)
        end: u8,
        /// Resistance (1-8)
        strength: u8,
        /// Force of the snap back (1-8)
        snap_force: u8,
    },
    /// Two-footed galloping rhythm
    Galloping {
        /// Start zone (0-8)
        start: u8,
        /// End zone (START+1 to 9)
        end: u8,
        /// Timing of the first foot (0-6)
        first_foot: u8,
        /// Timing of the second foot (FIRST_FOOT+1 to 7)
        second_foot: u8,
        /// Cycles per second (1-255, best below 8)
        frequency: u8,
    },
    /// Vibration alternating between two amplitudes
    Machine {
        /// Start zone (1-8)
        start: u8,
        /// End zone (START+1 to 9)
        end: u8,
        /// First amplitude (0-7)
        strength_a: u8,
        /// Second amplitude (0-7)
        strength_b: u8,
        /// Vibration frequency (1-255)
        frequency: u8,
        /// Time between amplitude changes in tenths of a second
        period: u8,
    },
    /// Raw vibration: one amplitude (0-8) for each of the 10 zones, then the
    /// frequency
    VibrationRaw {
        #[arg(num_args = TRIGGER_ZONES + 1, required = true, value_name = "AMPLITUDE.. FREQUENCY")]
        values: Vec<u8>,
    },
    /// Vibration starting at a position
    Vibration {
        /// Start zone (0-9)
        position: u8,
        /// Amplitude (1-8)
        amplitude: u8,
        /// Vibration frequency (1-255)
        frequency: u8,
    },
    /// Arbitrary mode byte and up to 9 parameters, sent unchecked
    Raw {
        #[arg(value_parser = parse_byte)]
        mode: u8,
        #[arg(num_args = 0..=9, value_parser = parse_byte)]
        params: Vec<u8>,
    },
}

impl From<TriggerCommand> for TriggerEffect {
    fn from(value: TriggerCommand) -> Self {
        match value {
            TriggerCommand::Off => TriggerEffect::Off,
            TriggerCommand::FeedbackRaw { strength } => TriggerEffect::FeedbackRaw {
                strength: padded(&strength),
            },
            TriggerCommand::Feedback { position, strength } => {
                TriggerEffect::Feedback { position, strength }
            }
            TriggerCommand::Weapon {
                start,
                end,
                strength,
            } => TriggerEffect::Weapon {
                start,
                end,
                strength,
            },
            TriggerCommand::Bow {
                start,
                end,
                strength,
                snap_force,
            } => TriggerEffect::Bow {
                start,
                end,
                strength,
                snap_force,
            },
            TriggerCommand::Galloping {
                start,
                end,
                first_foot,
                second_foot,
                frequency,
            } => TriggerEffect::Galloping {
                start,
                end,
                first_foot,
                second_foot,
                frequency,
            },
            TriggerCommand::Machine {
                start,
                end,
                strength_a,
                strength_b,
                frequency,
                period,
            } => TriggerEffect::Machine {
                start,
                end,
                strength_a,
                strength_b,
                frequency,
                period,
            },
            TriggerCommand::VibrationRaw { values } => {
                let (amplitude, frequency) = match values.split_last() {
                    Some((frequency, amplitude)) => (padded(amplitude), *frequency),
                    None => ([0; TRIGGER_ZONES], 0),
                };
                TriggerEffect::VibrationRaw {
                    amplitude,
                    frequency,
                }
            }
            TriggerCommand::Vibration {
                position,
                amplitude,
                frequency,
            } => TriggerEffect::Vibration {
                position,
                amplitude,
                frequency,
            },
            TriggerCommand::Raw { mode, params } => TriggerEffect::Custom {
                mode,
                params: padded(&params),
            },
        }
    }
}

/// Copy the given values into a zero padded array
fn padded<const N: usize>(values: &[u8]) -> [u8; N] {
    let mut array = [0; N];
    for (dst, src) in array.iter_mut().zip(values) {
        *dst = *src;
    }
    array
}

/// Parse a byte given in decimal or as a `0x` prefixed hex value
pub fn parse_byte(value: &str) -> Result<u8, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid byte '{value}': {e}"))
}
