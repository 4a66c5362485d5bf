/*!
 * End-to-end tests for file level subtitle operations
 */

use anyhow::Result;
use std::fs;
use subburn::app_controller::Controller;
use subburn::{Config, CueTrack, Offset};
use crate::common;

fn controller() -> Controller {
    common::init_test_logger();
    Controller::with_config(Config::default()).expect("default config is valid")
}

/// Test shifting a file end to end
#[test]
fn test_shiftFile_withSampleSubtitle_shouldWriteShiftedNativeFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = temp_dir.path().join("episode_adjusted.vtt");

    controller().shift_file(&input, &output, "-0.5".parse()?)?;

    let content = fs::read_to_string(&output)?;
    assert!(content.starts_with("WEBVTT\n\n00:00:00.500 --> 00:00:03.500\nThis is a test subtitle.\n"));
    assert!(!content.contains("NOTE"));

    let track = CueTrack::parse(&content)?;
    assert_eq!(track.len(), 3);
    assert_eq!(track.cues()[2].end().format(), "00:00:13.500");
    Ok(())
}

/// Test that a failing shift leaves no output file
#[test]
fn test_shiftFile_withTooNegativeOffset_shouldNotCreateOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = temp_dir.path().join("episode_adjusted.vtt");

    let err = controller()
        .shift_file(&input, &output, Offset::from_millis(-2000))
        .unwrap_err();

    assert!(format!("{:#}", err).contains("cue 1"));
    assert!(!output.exists());
    Ok(())
}

/// Test that a malformed input leaves an existing output untouched
#[test]
fn test_shiftFile_withMalformedInput_shouldKeepExistingOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "broken.vtt",
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nok\n\n00:00:03.000 -> 00:00:04.000\nbad\n",
    )?;
    let output = common::create_test_file(temp_dir.path(), "out.vtt", "previous")?;

    let err = controller().shift_file(&input, &output, Offset::ZERO).unwrap_err();

    assert!(format!("{:#}", err).contains("block 2"));
    assert_eq!(fs::read_to_string(&output)?, "previous");
    Ok(())
}

/// Test combining two episode files
#[test]
fn test_combineFiles_shouldAppendSecondEpisode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let first = common::create_test_subtitle(temp_dir.path(), "ep1.vtt")?;
    let second = common::create_test_file(
        temp_dir.path(),
        "ep2.vtt",
        "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nSecond episode\n",
    )?;
    let output = temp_dir.path().join("combined.vtt");

    controller().combine_files(&first, &second, &output, "1420.5".parse()?)?;

    let track = CueTrack::from_file(&output)?;
    assert_eq!(track.len(), 4);
    assert_eq!(track.cues()[0].start().format(), "00:00:01.000");
    assert_eq!(track.cues()[3].start().format(), "00:23:40.500");
    assert_eq!(track.cues()[3].end().format(), "00:23:42.500");
    assert_eq!(track.cues()[3].lines(), ["Second episode"]);
    Ok(())
}

/// Test converting a file to an overlay script
#[test]
fn test_convertFile_shouldWriteOverlayScript() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = temp_dir.path().join("episode.ass");

    controller().convert_file(&input, &output, "1".parse()?)?;

    let script = fs::read_to_string(&output)?;
    assert!(script.starts_with("[Script Info]\n"));
    assert!(script.contains("Dialogue: 0,0:00:02.00,0:00:05.00,TopSubs,,0,0,0,,This is a test subtitle."));
    assert!(script.contains("It contains\\Nmultiple lines."));
    Ok(())
}

/// Test reading a missing input
#[test]
fn test_convertFile_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("missing.vtt");
    let output = temp_dir.path().join("out.ass");

    assert!(controller().convert_file(&input, &output, Offset::ZERO).is_err());
    assert!(!output.exists());
    Ok(())
}

/// Test that an invalid configuration is rejected up front
#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.overlay.alignment = 12;

    let err = Controller::with_config(config).unwrap_err();
    assert!(err.to_string().contains("Configuration validation failed"));
}
