/*!
 * Tests for burning subtitles through the controller
 *
 * The encoder is replaced with a mock so no external program is needed.
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use subburn::app_controller::Controller;
use subburn::{Config, Offset};
use crate::common;
use crate::common::mock_encoder::{MockBehavior, MockEncoder};

fn controller_with(behavior: MockBehavior) -> (Controller, Arc<MockEncoder>) {
    common::init_test_logger();
    let encoder = Arc::new(MockEncoder::new(behavior));
    let controller = Controller::with_encoder(Config::default(), encoder.clone())
        .expect("default config is valid");
    (controller, encoder)
}

/// Test a successful burn and the temporary overlay lifecycle
#[tokio::test]
async fn test_burn_withWorkingEncoder_shouldWriteOutputAndCleanOverlay() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "episode.mp4", "video")?;
    let subtitle = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = temp_dir.path().join("out").join("episode_subbed.mp4");

    let (controller, encoder) = controller_with(MockBehavior::Succeed);
    let written = controller
        .burn(&video, &subtitle, &output, Offset::ZERO, false)
        .await?;

    assert_eq!(written, output);
    assert_eq!(fs::read_to_string(&output)?, "fake video");

    let calls = encoder.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert!(call.overlay_existed);
    assert!(!call.job.preview);
    assert_eq!(call.job.video, video);
    assert!(call.overlay_content.contains("[Events]"));
    assert!(call.overlay_content.contains("0:00:01.00,0:00:04.00,TopSubs"));
    assert!(!call.job.overlay.exists(), "temporary overlay should be removed");
    Ok(())
}

/// Test preview renders go to the debug sibling
#[tokio::test]
async fn test_burn_withPreview_shouldWriteDebugOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "episode.mp4", "video")?;
    let subtitle = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = temp_dir.path().join("episode_subbed.mp4");

    let (controller, encoder) = controller_with(MockBehavior::Succeed);
    let written = controller
        .burn(&video, &subtitle, &output, "2".parse()?, true)
        .await?;

    assert_eq!(written, temp_dir.path().join("episode_subbed_debug.mp4"));
    assert!(written.exists());
    assert!(!output.exists());

    let call = &encoder.calls()[0];
    assert!(call.job.preview);
    assert!(call.overlay_content.contains("0:00:03.00,0:00:06.00,TopSubs"));
    Ok(())
}

/// Test that a failing render removes its partial output
#[test]
fn test_burn_withFailingEncoder_shouldRemovePartialOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "episode.mp4", "video")?;
    let subtitle = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = temp_dir.path().join("episode_subbed.mp4");

    let (controller, encoder) = controller_with(MockBehavior::FailAfterWriting);
    let result = tokio_test::block_on(controller.burn(&video, &subtitle, &output, Offset::ZERO, false));

    let err = result.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Error processing"));
    assert!(message.contains("Invalid data found"));
    assert!(!output.exists());
    assert!(!encoder.calls()[0].job.overlay.exists());
    Ok(())
}

/// Test that an existing output survives an encoder that never started
#[tokio::test]
async fn test_burn_withMissingEncoder_shouldKeepExistingOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "episode.mp4", "video")?;
    let subtitle = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = common::create_test_file(temp_dir.path(), "episode_subbed.mp4", "last week's good render")?;

    let (controller, _) = controller_with(MockBehavior::FailToLaunch);
    let result = controller
        .burn(&video, &subtitle, &output, Offset::ZERO, false)
        .await;

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&output)?, "last week's good render");
    Ok(())
}

/// Test that an existing output rewritten by a failing render is removed
#[tokio::test]
async fn test_burn_withFailingEncoderOverExistingOutput_shouldRemoveIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "episode.mp4", "video")?;
    let subtitle = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = common::create_test_file(temp_dir.path(), "episode_subbed.mp4", "last week's good render")?;

    let (controller, _) = controller_with(MockBehavior::FailAfterWriting);
    let result = controller
        .burn(&video, &subtitle, &output, Offset::ZERO, false)
        .await;

    assert!(result.is_err());
    assert!(!output.exists());
    Ok(())
}

/// Test that a launch failure is reported with context
#[tokio::test]
async fn test_burn_withMissingEncoder_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "episode.mp4", "video")?;
    let subtitle = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let output = temp_dir.path().join("episode_subbed.mp4");

    let (controller, _) = controller_with(MockBehavior::FailToLaunch);
    let err = controller
        .burn(&video, &subtitle, &output, Offset::ZERO, false)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("missing-encoder"));
    assert!(!output.exists());
    Ok(())
}

/// Test inputs that are rejected before the encoder runs
#[tokio::test]
async fn test_burn_withInvalidInputs_shouldNotCallEncoder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_test_subtitle(temp_dir.path(), "episode.vtt")?;
    let video = common::create_test_file(temp_dir.path(), "episode.mp4", "video")?;
    let output = temp_dir.path().join("episode_subbed.mp4");

    let (controller, encoder) = controller_with(MockBehavior::Succeed);

    let missing_video = temp_dir.path().join("missing.mp4");
    let err = controller
        .burn(&missing_video, &subtitle, &output, Offset::ZERO, false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Video file does not exist"));

    let negative = controller
        .burn(&video, &subtitle, &output, Offset::from_millis(-5000), false)
        .await;
    assert!(negative.is_err());

    assert!(encoder.calls().is_empty());
    assert!(!output.exists());
    Ok(())
}
