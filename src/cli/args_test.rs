use std::error::Error;

use clap::{CommandFactory, Parser};

use crate::cli::{
    main_cli, trigger::TriggerCommand, validate, Args, CliError, Commands, Lightbar, Speaker,
    Toggle,
};
use crate::drivers::dualsense::error::{DualSenseError, ValidationError};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_command_definition() -> Result<(), Box<dyn Error>> {
    Args::command().debug_assert();
    Ok(())
}

#[tokio::test]
async fn test_lightbar_parse() -> Result<(), Box<dyn Error>> {
    assert_eq!(Lightbar::parse(&args(&["on"]))?, Lightbar::Enabled(true));
    assert_eq!(Lightbar::parse(&args(&["off"]))?, Lightbar::Enabled(false));
    assert_eq!(
        Lightbar::parse(&args(&["255", "0", "128"]))?,
        Lightbar::Color {
            r: 255,
            g: 0,
            b: 128,
            brightness: 255
        },
        "brightness should default to 255"
    );
    assert_eq!(
        Lightbar::parse(&args(&["1", "2", "3", "4"]))?,
        Lightbar::Color {
            r: 1,
            g: 2,
            b: 3,
            brightness: 4
        }
    );

    assert!(Lightbar::parse(&args(&["blue"])).is_err());
    assert!(Lightbar::parse(&args(&["1", "2"])).is_err());
    assert!(Lightbar::parse(&args(&["1", "2", "300"])).is_err());

    Ok(())
}

#[tokio::test]
async fn test_parse_commands() -> Result<(), Box<dyn Error>> {
    let parsed = Args::try_parse_from(["dualsensectl", "-d", "a0:b1:c2:d3:e4:f5", "battery"])?;
    assert_eq!(parsed.device.as_deref(), Some("a0:b1:c2:d3:e4:f5"));
    assert!(matches!(parsed.cmd, Some(Commands::Battery)));

    let parsed = Args::try_parse_from(["dualsensectl", "-l"])?;
    assert!(parsed.list);
    assert!(parsed.cmd.is_none());

    let parsed = Args::try_parse_from(["dualsensectl", "microphone-led", "on"])?;
    assert!(matches!(
        parsed.cmd,
        Some(Commands::MicrophoneLed { state: Toggle::On })
    ));

    let parsed = Args::try_parse_from(["dualsensectl", "speaker", "monoheadphone"])?;
    assert!(matches!(
        parsed.cmd,
        Some(Commands::Speaker {
            path: Speaker::MonoHeadphone
        })
    ));

    let parsed =
        Args::try_parse_from(["dualsensectl", "trigger", "right", "weapon", "2", "8", "8"])?;
    let Some(Commands::Trigger { cmd, .. }) = parsed.cmd else {
        panic!("expected a trigger command");
    };
    assert!(matches!(
        cmd,
        TriggerCommand::Weapon {
            start: 2,
            end: 8,
            strength: 8
        }
    ));

    let parsed = Args::try_parse_from(["dualsensectl", "trigger", "both", "raw", "0x26", "1"])?;
    let Some(Commands::Trigger { cmd, .. }) = parsed.cmd else {
        panic!("expected a trigger command");
    };
    assert!(matches!(cmd, TriggerCommand::Raw { mode: 0x26, .. }));

    Ok(())
}

#[tokio::test]
async fn test_parse_invalid_commands() -> Result<(), Box<dyn Error>> {
    let result = Args::try_parse_from([
        "dualsensectl",
        "trigger",
        "left",
        "feedback-raw",
        "1",
        "2",
        "3",
    ]);
    assert!(result.is_err(), "feedback-raw needs all 10 zones");

    let result = Args::try_parse_from(["dualsensectl", "speaker", "loud"]);
    assert!(result.is_err());

    Ok(())
}

/// Run the command line and return the exit status of the expected error
fn run_failing(values: &[&str]) -> Result<u8, Box<dyn Error>> {
    let mut argv = vec!["dualsensectl"];
    argv.extend_from_slice(values);
    let parsed = Args::try_parse_from(argv)?;
    let Err(err) = main_cli(parsed) else {
        return Err(format!("command {values:?} should fail").into());
    };
    println!("{values:?}: {err}");
    assert!(
        matches!(err, CliError::Device(DualSenseError::Validation(_))),
        "{values:?} should fail validation, got: {err:?}"
    );
    Ok(err.exit_code())
}

#[tokio::test]
async fn test_out_of_range_exit_status() -> Result<(), Box<dyn Error>> {
    // None of these reach device enumeration
    let commands: &[&[&str]] = &[
        &["volume", "300"],
        &["lightbar", "blue"],
        &["lightbar", "1", "2", "300"],
        &["lightbar", "1", "2"],
        &["lightbar", "1", "2", "3", "x"],
        &["attenuation", "9", "0"],
        &["attenuation", "0", "8"],
        &["player-leds", "6"],
        &["trigger", "right", "weapon", "1", "8", "8"],
    ];
    for command in commands {
        assert_eq!(run_failing(command)?, 1, "exit status of {command:?}");
    }

    Ok(())
}

#[tokio::test]
async fn test_validate_accepts_bounds() -> Result<(), Box<dyn Error>> {
    let commands: &[&[&str]] = &[
        &["volume", "255"],
        &["volume", "0"],
        &["attenuation", "7", "7"],
        &["player-leds", "5"],
        &["lightbar", "off"],
        &["lightbar", "255", "255", "255", "0"],
    ];
    for command in commands {
        let mut argv = vec!["dualsensectl"];
        argv.extend_from_slice(command);
        let Some(cmd) = Args::try_parse_from(argv)?.cmd else {
            panic!("{command:?} should parse into a command");
        };
        assert_eq!(validate(&cmd), Ok(()), "{command:?} should be accepted");
    }

    let cmd = Commands::Attenuation {
        rumble: 9,
        trigger: 0,
    };
    assert_eq!(
        validate(&cmd),
        Err(ValidationError::OutOfRange {
            name: "rumble attenuation",
            min: 0,
            max: 7,
            value: 9
        })
    );

    Ok(())
}
