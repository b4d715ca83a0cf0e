use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use tracing::{debug, info};

/// Format details of an audio clip on disk
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub path: String,
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioInfo {
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Probe a clip's duration and format without decoding its samples
///
/// The container header is used when it carries a frame count; otherwise
/// packet timestamps are walked to the end of the stream.
pub fn probe(path: impl AsRef<Path>) -> Result<AudioInfo> {
    let path = path.as_ref();
    debug!("Probing audio file: {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open audio file {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported or corrupt audio format")?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .context("Audio file has no playable track")?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .context("Audio track does not declare a sample rate")?;
    let channels = params.channels.map(|c| c.count() as u16).unwrap_or(1);

    let duration = match params.n_frames {
        Some(frames) => Duration::from_secs_f64(frames as f64 / sample_rate as f64),
        None => {
            let time_base = params
                .time_base
                .unwrap_or_else(|| TimeBase::new(1, sample_rate));
            scan_duration(format.as_mut(), track_id, time_base)?
        }
    };

    info!(
        "Audio file probed: {} ({:.1}s, {}Hz, {} channels)",
        path.display(),
        duration.as_secs_f64(),
        sample_rate,
        channels
    );

    Ok(AudioInfo {
        path: path.display().to_string(),
        duration,
        sample_rate,
        channels,
    })
}

/// Walk packets to find the end timestamp of a track
fn scan_duration(
    format: &mut dyn FormatReader,
    track_id: u32,
    time_base: TimeBase,
) -> Result<Duration> {
    let mut end_ts: u64 = 0;

    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    end_ts = end_ts.max(packet.ts() + packet.dur());
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("Failed to read audio packets"),
        }
    }

    let time = time_base.calc_time(end_ts);
    Ok(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
}
