// Tests for the timer-backed playback driver

use anyhow::Result;
use loqa_meditation::{
    PlaybackDriver, PlaybackEvent, PlaybackHandle, PlaybackSource, TimedPlaybackDriver,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::sleep;

struct Fixture {
    driver: TimedPlaybackDriver,
    events: mpsc::UnboundedReceiver<PlaybackEvent>,
    uri: String,
    _dir: TempDir,
}

fn fixture() -> Result<Fixture> {
    let dir = TempDir::new()?;
    let path = dir.path().join("bowl.wav");
    std::fs::write(&path, b"")?;

    let (events_tx, events) = mpsc::unbounded_channel();
    Ok(Fixture {
        driver: TimedPlaybackDriver::new(events_tx),
        events,
        uri: path.display().to_string(),
        _dir: dir,
    })
}

fn source(uri: &str, secs: u64, looping: bool) -> PlaybackSource {
    PlaybackSource {
        uri: uri.to_string(),
        duration: Duration::from_secs(secs),
        looping,
        volume: 1.0,
    }
}

#[tokio::test(start_paused = true)]
async fn test_track_completes_after_its_duration() -> Result<()> {
    let mut f = fixture()?;
    let handle = f.driver.play(&source(&f.uri, 2, false)).await?;

    sleep(Duration::from_millis(1900)).await;
    assert!(f.events.try_recv().is_err(), "Not finished yet");

    sleep(Duration::from_millis(200)).await;
    assert_eq!(f.events.try_recv()?, PlaybackEvent::Completed(handle));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_suppresses_completion() -> Result<()> {
    let mut f = fixture()?;
    let handle = f.driver.play(&source(&f.uri, 2, false)).await?;

    f.driver.stop(handle).await?;
    sleep(Duration::from_secs(5)).await;

    assert!(f.events.try_recv().is_err());
    assert_eq!(f.driver.active_tracks(), 0);

    // Unknown handles are ignored
    f.driver.stop(handle).await?;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_remaining_time() -> Result<()> {
    let mut f = fixture()?;
    let handle = f.driver.play(&source(&f.uri, 2, false)).await?;

    sleep(Duration::from_secs(1)).await;
    f.driver.pause(handle).await?;
    sleep(Duration::from_secs(10)).await;
    assert!(f.events.try_recv().is_err(), "No completion while paused");

    f.driver.resume(handle).await?;
    sleep(Duration::from_millis(900)).await;
    assert!(f.events.try_recv().is_err());

    sleep(Duration::from_millis(200)).await;
    assert_eq!(f.events.try_recv()?, PlaybackEvent::Completed(handle));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_looping_track_never_completes() -> Result<()> {
    let mut f = fixture()?;
    let handle = f.driver.play(&source(&f.uri, 2, true)).await?;

    sleep(Duration::from_secs(60)).await;
    assert!(f.events.try_recv().is_err());

    f.driver.pause(handle).await?;
    f.driver.resume(handle).await?;
    sleep(Duration::from_secs(60)).await;
    assert!(f.events.try_recv().is_err());
    assert_eq!(f.driver.active_tracks(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_play_rejects_unplayable_sources() -> Result<()> {
    let mut f = fixture()?;

    let missing = source("/nonexistent/bowl.wav", 2, false);
    assert!(f.driver.play(&missing).await.is_err());

    let empty = source(&f.uri, 0, false);
    assert!(f.driver.play(&empty).await.is_err());

    assert_eq!(f.driver.active_tracks(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_pause_unknown_track_fails() -> Result<()> {
    let mut f = fixture()?;
    let handle = f.driver.play(&source(&f.uri, 2, false)).await?;
    f.driver.stop(handle).await?;

    assert!(f.driver.pause(handle).await.is_err());
    assert!(f.driver.resume(handle).await.is_err());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_completed_tracks_are_not_active() -> Result<()> {
    let mut f = fixture()?;

    for _ in 0..5 {
        let handle = f.driver.play(&source(&f.uri, 2, false)).await?;
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(f.events.try_recv()?, PlaybackEvent::Completed(handle));
    }
    assert_eq!(f.driver.active_tracks(), 0);

    let looping = f.driver.play(&source(&f.uri, 2, true)).await?;
    assert_eq!(f.driver.active_tracks(), 1);

    // Completed tracks were evicted by the last play; stopping them is still fine
    f.driver.stop(PlaybackHandle(1)).await?;
    f.driver.stop(looping).await?;
    assert_eq!(f.driver.active_tracks(), 0);

    Ok(())
}
