use std::error::Error;

use crate::drivers::dualsense::{
    error::ValidationError,
    hid_report::SetStatePackedOutputData,
    trigger::{pack_zone_strengths, TriggerEffect, TriggerMode, TriggerSide},
};

/// Unpack the zone bitmap and 3-bit strengths from packed parameters
fn unpack_zones(params: &[u8; 10]) -> (u16, u32) {
    let zones = u16::from_le_bytes([params[0], params[1]]);
    let strengths = u32::from_le_bytes([params[2], params[3], params[4], params[5]]);
    (zones, strengths)
}

#[tokio::test]
async fn test_feedback_zones() -> Result<(), Box<dyn Error>> {
    for position in 0..=9u8 {
        for strength in 1..=8u8 {
            let encoded = TriggerEffect::Feedback { position, strength }.encode()?;
            assert_eq!(encoded.mode, TriggerMode::Feedback as u8);

            let (zones, strengths) = unpack_zones(&encoded.params);
            for zone in 0..10u8 {
                let active = zones & (1 << zone) != 0;
                assert_eq!(
                    active,
                    zone >= position,
                    "zone {zone} active state for position {position}"
                );
                let packed = (strengths >> (3 * u32::from(zone))) & 0x07;
                let expected = if active { u32::from(strength - 1) } else { 0 };
                assert_eq!(packed, expected, "strength of zone {zone}");
            }
            assert_eq!(encoded.params[6..], [0, 0, 0, 0], "frequency should be 0");
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_feedback_invalid() -> Result<(), Box<dyn Error>> {
    let result = TriggerEffect::Feedback {
        position: 10,
        strength: 1,
    }
    .encode();
    assert!(matches!(
        result,
        Err(ValidationError::OutOfRange {
            name: "position",
            ..
        })
    ));

    let result = TriggerEffect::Feedback {
        position: 0,
        strength: 0,
    }
    .encode();
    assert!(matches!(
        result,
        Err(ValidationError::OutOfRange {
            name: "strength",
            ..
        })
    ));

    Ok(())
}

#[tokio::test]
async fn test_zone_packing() -> Result<(), Box<dyn Error>> {
    let params = pack_zone_strengths(&[0, 1, 0, 0, 0, 0, 0, 0, 0, 8], 30)?;
    // Zones 1 and 9 are active
    assert_eq!(params[0], 0b0000_0010);
    assert_eq!(params[1], 0b0000_0010);
    // Zone 9 strength (7) lands at bit 27
    let (_, strengths) = unpack_zones(&params);
    assert_eq!(strengths, 7 << 27);
    assert_eq!(params[6..], [0, 0, 30, 0]);

    let result = pack_zone_strengths(&[0, 0, 0, 9, 0, 0, 0, 0, 0, 0], 0);
    assert_eq!(
        result,
        Err(ValidationError::StrengthOutOfRange { index: 3, value: 9 })
    );

    Ok(())
}

#[tokio::test]
async fn test_vibration() -> Result<(), Box<dyn Error>> {
    let encoded = TriggerEffect::Vibration {
        position: 5,
        amplitude: 8,
        frequency: 40,
    }
    .encode()?;
    assert_eq!(encoded.mode, 0x26);
    let (zones, _) = unpack_zones(&encoded.params);
    assert_eq!(zones, 0b11_1110_0000);
    assert_eq!(encoded.params[8], 40, "frequency should be passed through");

    let result = TriggerEffect::Vibration {
        position: 5,
        amplitude: 8,
        frequency: 0,
    }
    .encode();
    assert_eq!(
        result,
        Err(ValidationError::NotPositive { name: "frequency" })
    );

    Ok(())
}

#[tokio::test]
async fn test_raw_effects() -> Result<(), Box<dyn Error>> {
    let strength = [1, 2, 3, 4, 5, 6, 7, 8, 0, 0];
    let feedback = TriggerEffect::FeedbackRaw { strength }.encode()?;
    assert_eq!(feedback.mode, 0x21);
    assert_eq!(feedback.params, pack_zone_strengths(&strength, 0)?);

    let vibration = TriggerEffect::VibrationRaw {
        amplitude: strength,
        frequency: 10,
    }
    .encode()?;
    assert_eq!(vibration.mode, 0x26);
    assert_eq!(vibration.params, pack_zone_strengths(&strength, 10)?);

    let result = TriggerEffect::VibrationRaw {
        amplitude: strength,
        frequency: 0,
    }
    .encode();
    assert!(result.is_err(), "vibration requires a frequency");

    let result = TriggerEffect::FeedbackRaw {
        strength: [0, 0, 0, 0, 0, 0, 0, 0, 0, 12],
    }
    .encode();
    assert!(result.is_err(), "strengths above 8 are rejected");

    Ok(())
}

#[tokio::test]
async fn test_weapon() -> Result<(), Box<dyn Error>> {
    let encoded = TriggerEffect::Weapon {
        start: 2,
        end: 8,
        strength: 8,
    }
    .encode()?;
    assert_eq!(encoded.mode, 0x25);
    assert_eq!(encoded.params, [0x04, 0x01, 7, 0, 0, 0, 0, 0, 0, 0]);

    let result = TriggerEffect::Weapon {
        start: 1,
        end: 8,
        strength: 8,
    }
    .encode();
    assert_eq!(
        result,
        Err(ValidationError::OutOfRange {
            name: "start position",
            min: 2,
            max: 7,
            value: 1
        })
    );

    let result = TriggerEffect::Weapon {
        start: 4,
        end: 4,
        strength: 8,
    }
    .encode();
    assert!(matches!(
        result,
        Err(ValidationError::OutOfRange {
            name: "end position",
            min: 5,
            ..
        })
    ));

    Ok(())
}

#[tokio::test]
async fn test_bow() -> Result<(), Box<dyn Error>> {
    let encoded = TriggerEffect::Bow {
        start: 1,
        end: 4,
        strength: 3,
        snap_force: 6,
    }
    .encode()?;
    assert_eq!(encoded.mode, 0x22);
    assert_eq!(encoded.params[0], 0b0001_0010);
    assert_eq!(encoded.params[1], 0);
    assert_eq!(encoded.params[2], 2 | (5 << 3));
    assert_eq!(encoded.params[3..], [0; 7]);

    let result = TriggerEffect::Bow {
        start: 1,
        end: 9,
        strength: 3,
        snap_force: 6,
    }
    .encode();
    assert!(result.is_err(), "bow end position is limited to 8");

    let result = TriggerEffect::Bow {
        start: 1,
        end: 4,
        strength: 3,
        snap_force: 0,
    }
    .encode();
    assert!(matches!(
        result,
        Err(ValidationError::OutOfRange {
            name: "snap force",
            ..
        })
    ));

    Ok(())
}

#[tokio::test]
async fn test_galloping() -> Result<(), Box<dyn Error>> {
    let encoded = TriggerEffect::Galloping {
        start: 0,
        end: 9,
        first_foot: 4,
        second_foot: 7,
        frequency: 20,
    }
    .encode()?;
    assert_eq!(encoded.mode, 0x23);
    assert_eq!(encoded.params[..4], [0x01, 0x02, 7 | (4 << 3), 20]);

    let result = TriggerEffect::Galloping {
        start: 0,
        end: 9,
        first_foot: 4,
        second_foot: 4,
        frequency: 2,
    }
    .encode();
    assert!(matches!(
        result,
        Err(ValidationError::OutOfRange {
            name: "second foot",
            ..
        })
    ));

    Ok(())
}

#[tokio::test]
async fn test_machine() -> Result<(), Box<dyn Error>> {
    let encoded = TriggerEffect::Machine {
        start: 1,
        end: 9,
        strength_a: 3,
        strength_b: 7,
        frequency: 5,
        period: 200,
    }
    .encode()?;
    assert_eq!(encoded.mode, 0x27);
    assert_eq!(
        encoded.params,
        [0x02, 0x02, 3 | (7 << 3), 5, 200, 0, 0, 0, 0, 0]
    );

    let result = TriggerEffect::Machine {
        start: 0,
        end: 9,
        strength_a: 3,
        strength_b: 7,
        frequency: 5,
        period: 200,
    }
    .encode();
    assert!(result.is_err(), "machine start position must be at least 1");

    Ok(())
}

#[tokio::test]
async fn test_off_and_custom() -> Result<(), Box<dyn Error>> {
    let encoded = TriggerEffect::Off.encode()?;
    assert_eq!(encoded.mode, 0x05);
    assert_eq!(encoded.params, [0; 10]);

    let encoded = TriggerEffect::Custom {
        mode: 0xFC,
        params: [9, 8, 7, 6, 5, 4, 3, 2, 1],
    }
    .encode()?;
    assert_eq!(encoded.mode, 0xFC);
    assert_eq!(encoded.params, [9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);

    Ok(())
}

#[tokio::test]
async fn test_apply_sides() -> Result<(), Box<dyn Error>> {
    let encoded = TriggerEffect::Feedback {
        position: 3,
        strength: 5,
    }
    .encode()?;

    let mut state = SetStatePackedOutputData::default();
    encoded.apply(TriggerSide::Both, &mut state);
    assert!(state.allow_left_trigger_ffb && state.allow_right_trigger_ffb);
    assert_eq!(state.left_trigger_mode, state.right_trigger_mode);
    assert_eq!(
        state.left_trigger_params, state.right_trigger_params,
        "both triggers should receive identical parameters"
    );

    let mut state = SetStatePackedOutputData::default();
    encoded.apply(TriggerSide::Left, &mut state);
    assert!(state.allow_left_trigger_ffb);
    assert!(!state.allow_right_trigger_ffb);

    let mut state = SetStatePackedOutputData::default();
    encoded.apply(TriggerSide::Right, &mut state);
    assert!(!state.allow_left_trigger_ffb);
    assert!(state.allow_right_trigger_ffb);
    assert_eq!(state.right_trigger_params, encoded.params);

    Ok(())
}
