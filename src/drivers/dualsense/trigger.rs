//! Adaptive trigger effects. Every effect is encoded into the generic trigger
//! motor block of the output report: one mode byte followed by ten parameter
//! bytes.
//! Source: https://gist.github.com/Nielk1/6d54cc2c00d2201ccb8c2720ad7538db
use super::error::ValidationError;
use super::hid_report::SetStatePackedOutputData;

/// Number of discrete zones along the trigger travel
pub const TRIGGER_ZONES: usize = 10;

/// Trigger motor mode codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerMode {
    Off = 0x05,
    Feedback = 0x21,
    Bow = 0x22,
    Galloping = 0x23,
    Weapon = 0x25,
    Vibration = 0x26,
    Machine = 0x27,
}

/// Which trigger(s) an effect applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSide {
    Left,
    Right,
    Both,
}

/// Wire representation of a trigger effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerMotorParams {
    pub mode: u8,
    pub params: [u8; TRIGGER_ZONES],
}

impl TriggerMotorParams {
    fn new(mode: TriggerMode, params: [u8; TRIGGER_ZONES]) -> Self {
        Self {
            mode: mode as u8,
            params,
        }
    }

    /// Write these parameters into the output state for the given side. Both
    /// motor blocks always receive the same bytes; the valid flags select
    /// which trigger(s) the controller actually updates.
    pub fn apply(&self, side: TriggerSide, state: &mut SetStatePackedOutputData) {
        state.allow_right_trigger_ffb = matches!(side, TriggerSide::Right | TriggerSide::Both);
        state.allow_left_trigger_ffb = matches!(side, TriggerSide::Left | TriggerSide::Both);

        state.right_trigger_mode = self.mode;
        state.right_trigger_params = self.params;
        state.left_trigger_mode = self.mode;
        state.left_trigger_params = self.params;
    }
}

/// A named trigger effect with its human facing parameters. Positions are
/// zone indices (0-9), strengths are 1-based unless noted otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEffect {
    /// Remove all effects
    Off,
    /// Resistance starting at `position`
    Feedback { position: u8, strength: u8 },
    /// Gun-like trigger with a break point between `start` and `end`
    Weapon { start: u8, end: u8, strength: u8 },
    /// Bow-like tension with a snap back at `end`
    Bow {
        start: u8,
        end: u8,
        strength: u8,
        snap_force: u8,
    },
    /// Rhythmic two-footed galloping
    Galloping {
        start: u8,
        end: u8,
        first_foot: u8,
        second_foot: u8,
        frequency: u8,
    },
    /// Vibration alternating between two amplitudes (0-7) every `period`
    Machine {
        start: u8,
        end: u8,
        strength_a: u8,
        strength_b: u8,
        frequency: u8,
        period: u8,
    },
    /// Vibration of the motor arm starting at `position`
    Vibration {
        position: u8,
        amplitude: u8,
        frequency: u8,
    },
    /// Resistance per zone (0 = inactive, 1-8)
    FeedbackRaw { strength: [u8; TRIGGER_ZONES] },
    /// Vibration amplitude per zone (0 = inactive, 1-8)
    VibrationRaw {
        amplitude: [u8; TRIGGER_ZONES],
        frequency: u8,
    },
    /// Arbitrary mode byte and parameters, sent without any validation
    Custom { mode: u8, params: [u8; 9] },
}

impl TriggerEffect {
    /// Validate the effect parameters and encode them into the generic mode
    /// and parameter representation.
    pub fn encode(&self) -> Result<TriggerMotorParams, ValidationError> {
        match *self {
            TriggerEffect::Off => Ok(TriggerMotorParams::new(
                TriggerMode::Off,
                [0; TRIGGER_ZONES],
            )),
            TriggerEffect::Feedback { position, strength } => {
                ValidationError::check_range("position", position, 0, 9)?;
                ValidationError::check_range("strength", strength, 1, 8)?;
                let params = pack_zone_strengths(&strengths_from(position, strength), 0)?;
                Ok(TriggerMotorParams::new(TriggerMode::Feedback, params))
            }
            TriggerEffect::Vibration {
                position,
                amplitude,
                frequency,
            } => {
                ValidationError::check_range("position", position, 0, 9)?;
                ValidationError::check_range("amplitude", amplitude, 1, 8)?;
                ValidationError::check_positive("frequency", frequency)?;
                let params = pack_zone_strengths(&strengths_from(position, amplitude), frequency)?;
                Ok(TriggerMotorParams::new(TriggerMode::Vibration, params))
            }
            TriggerEffect::FeedbackRaw { strength } => {
                let params = pack_zone_strengths(&strength, 0)?;
                Ok(TriggerMotorParams::new(TriggerMode::Feedback, params))
            }
            TriggerEffect::VibrationRaw {
                amplitude,
                frequency,
            } => {
                ValidationError::check_positive("frequency", frequency)?;
                let params = pack_zone_strengths(&amplitude, frequency)?;
                Ok(TriggerMotorParams::new(TriggerMode::Vibration, params))
            }
            TriggerEffect::Weapon {
                start,
                end,
                strength,
            } => {
                ValidationError::check_range("start position", start, 2, 7)?;
                ValidationError::check_range("end position", end, start + 1, 8)?;
                ValidationError::check_range("strength", strength, 1, 8)?;
                let [zone_lo, zone_hi] = start_stop_zones(start, end);
                let params = [zone_lo, zone_hi, strength - 1, 0, 0, 0, 0, 0, 0, 0];
                Ok(TriggerMotorParams::new(TriggerMode::Weapon, params))
            }
            TriggerEffect::Bow {
                start,
                end,
                strength,
                snap_force,
            } => {
                ValidationError::check_range("start position", start, 0, 8)?;
                ValidationError::check_range("end position", end, start + 1, 8)?;
                ValidationError::check_range("strength", strength, 1, 8)?;
                ValidationError::check_range("snap force", snap_force, 1, 8)?;
                let [zone_lo, zone_hi] = start_stop_zones(start, end);
                let force_pair = ((strength - 1) & 0x07) | (((snap_force - 1) & 0x07) << 3);
                let params = [zone_lo, zone_hi, force_pair, 0, 0, 0, 0, 0, 0, 0];
                Ok(TriggerMotorParams::new(TriggerMode::Bow, params))
            }
            TriggerEffect::Galloping {
                start,
                end,
                first_foot,
                second_foot,
                frequency,
            } => {
                ValidationError::check_range("start position", start, 0, 8)?;
                ValidationError::check_range("end position", end, start + 1, 9)?;
                ValidationError::check_range("first foot", first_foot, 0, 6)?;
                ValidationError::check_range("second foot", second_foot, first_foot + 1, 7)?;
                ValidationError::check_positive("frequency", frequency)?;
                if frequency > 8 {
                    log::warn!("Galloping frequency has a better effect when lower than 8");
                }
                let [zone_lo, zone_hi] = start_stop_zones(start, end);
                let ratio = (second_foot & 0x07) | ((first_foot & 0x07) << 3);
                let params = [zone_lo, zone_hi, ratio, frequency, 0, 0, 0, 0, 0, 0];
                Ok(TriggerMotorParams::new(TriggerMode::Galloping, params))
            }
            TriggerEffect::Machine {
                start,
                end,
                strength_a,
                strength_b,
                frequency,
                period,
            } => {
                // Nothing happens on the device with a start position of 0
                ValidationError::check_range("start position", start, 1, 8)?;
                ValidationError::check_range("end position", end, start + 1, 9)?;
                ValidationError::check_range("strength a", strength_a, 0, 7)?;
                ValidationError::check_range("strength b", strength_b, 0, 7)?;
                ValidationError::check_positive("frequency", frequency)?;
                let [zone_lo, zone_hi] = start_stop_zones(start, end);
                let force_pair = (strength_a & 0x07) | ((strength_b & 0x07) << 3);
                let params = [zone_lo, zone_hi, force_pair, frequency, period, 0, 0, 0, 0, 0];
                Ok(TriggerMotorParams::new(TriggerMode::Machine, params))
            }
            TriggerEffect::Custom { mode, params } => {
                let mut full = [0; TRIGGER_ZONES];
                full[..params.len()].copy_from_slice(&params);
                Ok(TriggerMotorParams { mode, params: full })
            }
        }
    }
}

/// Strength array with `strength` set for every zone from `position` on
fn strengths_from(position: u8, strength: u8) -> [u8; TRIGGER_ZONES] {
    let mut strengths = [0; TRIGGER_ZONES];
    for value in strengths.iter_mut().skip(position as usize) {
        *value = strength;
    }
    strengths
}

/// Bitmap with only the start and end zones set, as little endian bytes
fn start_stop_zones(start: u8, end: u8) -> [u8; 2] {
    let zones: u16 = (1 << start) | (1 << end);
    zones.to_le_bytes()
}

/// Pack a strength per zone into the active zone bitmap and the 3-bit per
/// zone strength accumulator:
/// `[zones_lo, zones_hi, strength0..=3, 0, 0, frequency, 0]`
pub fn pack_zone_strengths(
    strengths: &[u8; TRIGGER_ZONES],
    frequency: u8,
) -> Result<[u8; TRIGGER_ZONES], ValidationError> {
    let mut active_zones: u16 = 0;
    let mut strength_zones: u32 = 0;
    for (index, &value) in strengths.iter().enumerate() {
        if value > 8 {
            return Err(ValidationError::StrengthOutOfRange { index, value });
        }
        if value > 0 {
            let strength = u32::from((value - 1) & 0x07);
            strength_zones |= strength << (3 * index);
            active_zones |= 1 << index;
        }
    }

    let [zones_lo, zones_hi] = active_zones.to_le_bytes();
    let [s0, s1, s2, s3] = strength_zones.to_le_bytes();
    Ok([zones_lo, zones_hi, s0, s1, s2, s3, 0, 0, frequency, 0])
}
