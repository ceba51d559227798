//! Clip-limited playback: play the first N seconds of a local file, then
//! go silent and stop decoding.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::Sender;

use crate::decode::{self, SharedAudio};

/// Playback lifecycle notifications for one clip.
#[derive(Debug, Clone)]
pub enum ClipEvent {
    Started,
    Finished,
    Error(String),
}

/// Handle to a clip in flight. Dropping it tears the output stream down.
pub struct ClipHandle {
    shared: Arc<SharedAudio>,
    _stream: cpal::Stream,
}

impl ClipHandle {
    /// Stop early (quit, replay). Idempotent.
    pub fn stop(&self) {
        self.shared.stop();
    }
}

/// Output frames needed to cover `secs` seconds at `out_rate` Hz.
pub fn clip_frame_budget(secs: u32, out_rate: u32) -> u64 {
    u64::from(secs) * u64::from(out_rate)
}

/// Map one source frame onto output channel `dst_ch`.
pub fn mix_channel(src: &[f32], dst_channels: usize, dst_ch: usize) -> f32 {
    let src_channels = src.len();
    match (src_channels, dst_channels) {
        (0, _) => 0.0,
        (1, _) => src[0],
        (2, 1) => 0.5 * (src[0] + src[1]),
        (2, _) => src[dst_ch.min(1)],
        _ => src[dst_ch.min(src_channels - 1)],
    }
}

/// Start playing the first `secs` seconds of `path` on `device`.
///
/// Emits `Started` once the stream runs and `Finished` when the clip window
/// elapses. The budget is enforced twice: the output callback stops pulling
/// samples after `secs × rate` frames, and a watchdog thread stops the
/// decoder at the wall-clock deadline.
///
/// NOTE: plays at the device default config without resampling; if the file
/// sample-rate differs from the device rate, pitch will be off.
pub fn play_clip(
    device: &cpal::Device,
    path: &Path,
    secs: u32,
    events: Sender<ClipEvent>,
) -> Result<ClipHandle> {
    let config = device
        .default_output_config()
        .context("query default output config")?;

    let (src_spec, shared) = decode::start_streaming_decode(path)?;
    tracing::debug!(
        "clip source: {}ch @ {} Hz, device {:?}",
        src_spec.channels.count(),
        src_spec.rate,
        config
    );

    let budget = clip_frame_budget(secs, config.sample_rate());

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(device, &config.into(), shared.clone(), budget, events.clone())?
        }
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(device, &config.into(), shared.clone(), budget, events.clone())?
        }
        cpal::SampleFormat::U16 => {
            build_stream::<u16>(device, &config.into(), shared.clone(), budget, events.clone())?
        }
        other => return Err(anyhow!("unsupported sample format: {other:?}")),
    };

    stream.play().context("start output stream")?;
    events.send(ClipEvent::Started).ok();

    // Timer-scheduled stop, mirroring the callback-side frame budget. The
    // small grace period lets the device flush its last buffers.
    let shared_for_timer = shared.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(u64::from(secs)) + Duration::from_millis(150));
        shared_for_timer.stop();
        events.send(ClipEvent::Finished).ok();
    });

    Ok(ClipHandle {
        shared,
        _stream: stream,
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<SharedAudio>,
    budget_frames: u64,
    events: Sender<ClipEvent>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels_out = config.channels as usize;
    let played = AtomicU64::new(0);

    let err_fn = move |err| {
        events.send(ClipEvent::Error(format!("stream error: {err}"))).ok();
    };

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let frames = data.len() / channels_out;
            let mut src_frame = [0.0f32; 8];
            let src_channels = shared.src_channels.min(src_frame.len());

            for frame in 0..frames {
                let over_budget = played.load(Ordering::Relaxed) >= budget_frames;
                if over_budget {
                    shared.stop();
                }
                let have = !over_budget && pull_frame(&shared, &mut src_frame);

                for ch in 0..channels_out {
                    let sample = if have {
                        mix_channel(&src_frame[..src_channels], channels_out, ch)
                    } else {
                        0.0
                    };
                    data[frame * channels_out + ch] = <T as cpal::Sample>::from_sample::<f32>(sample);
                }

                if have {
                    played.fetch_add(1, Ordering::Relaxed);
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn pull_frame(shared: &SharedAudio, out: &mut [f32; 8]) -> bool {
    let mut q = shared.queue.lock().unwrap();
    if q.len() < shared.src_channels {
        return false;
    }
    for slot in out.iter_mut().take(shared.src_channels) {
        *slot = q.pop_front().unwrap_or(0.0);
    }
    // Layouts wider than the scratch frame: drop the extra channels.
    for _ in out.len()..shared.src_channels {
        q.pop_front();
    }
    shared.not_full.notify_one();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_covers_whole_seconds_at_device_rate() {
        assert_eq!(clip_frame_budget(1, 44_100), 44_100);
        assert_eq!(clip_frame_budget(4, 48_000), 192_000);
        assert_eq!(clip_frame_budget(0, 48_000), 0);
    }

    #[test]
    fn mono_source_duplicates_to_stereo() {
        let src = [0.5];
        assert_eq!(mix_channel(&src, 2, 0), 0.5);
        assert_eq!(mix_channel(&src, 2, 1), 0.5);
    }

    #[test]
    fn stereo_source_downmixes_to_mono() {
        let src = [0.2, 0.6];
        let mixed = mix_channel(&src, 1, 0);
        assert!((mixed - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn stereo_passthrough_keeps_channels() {
        let src = [0.1, 0.9];
        assert_eq!(mix_channel(&src, 2, 0), 0.1);
        assert_eq!(mix_channel(&src, 2, 1), 0.9);
    }

    #[test]
    fn wide_layouts_clamp_to_last_source_channel() {
        let src = [0.1, 0.2, 0.3];
        assert_eq!(mix_channel(&src, 6, 5), 0.3);
    }
}
