//! Streaming decode into a bounded queue of interleaved f32 samples.
//!
//! The decode thread fills the queue and blocks when it is full; the output
//! callback drains it. A stop flag aborts the decoder early when the clip
//! limit fires.

use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use anyhow::{Context, Result, anyhow};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded-sample exchange between the decode thread and the output callback.
pub struct SharedAudio {
    /// Source channel count.
    pub src_channels: usize,

    /// Interleaved f32 samples (src_channels per frame).
    pub queue: Mutex<VecDeque<f32>>,

    /// Decoder thread waits on this when the queue is full.
    pub not_full: Condvar,

    /// Signals end-of-file / decode completion.
    pub done: AtomicBool,

    /// Set when the clip limit fires; wakes and stops the decoder.
    pub stopped: AtomicBool,

    /// Bounded buffering (in samples, not frames).
    pub max_buffered_samples: usize,
}

impl SharedAudio {
    /// Request an early stop. Safe to call from any thread, repeatedly.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        self.not_full.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path).with_context(|| format!("open {path:?}"))?;
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
        .with_context(|| format!("probe {path:?}"))?;

    Ok(probed.format)
}

/// Probe the file for its signal spec, then spawn a decode thread that
/// streams samples into the returned [`SharedAudio`].
pub fn start_streaming_decode(path: &Path) -> Result<(SignalSpec, Arc<SharedAudio>)> {
    // Open once to discover spec & channel count.
    let format = open_format(path)?;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("no default audio track"))?;

    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| anyhow!("unknown channel layout"))?;
    let src_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("unknown sample rate"))?;
    let src_spec = SignalSpec::new(src_rate, channels);
    let src_channels = channels.count();

    // Buffer about ~2 seconds worth of audio.
    let max_buffered_samples = (src_rate as usize)
        .saturating_mul(src_channels)
        .saturating_mul(2);

    let shared = Arc::new(SharedAudio {
        src_channels,
        queue: Mutex::new(VecDeque::new()),
        not_full: Condvar::new(),
        done: AtomicBool::new(false),
        stopped: AtomicBool::new(false),
        max_buffered_samples,
    });

    // Dedicated decode thread re-opens from the beginning; this keeps the
    // probed format local and the lifetimes simple.
    let path_for_thread: PathBuf = path.to_path_buf();
    let shared_for_thread = shared.clone();
    thread::spawn(move || {
        if let Err(e) = decode_thread_main(&path_for_thread, &shared_for_thread) {
            tracing::warn!("decode thread ended with error: {e:#}");
        }
        shared_for_thread.done.store(true, Ordering::Relaxed);
    });

    Ok((src_spec, shared))
}

fn decode_thread_main(path: &Path, shared: &Arc<SharedAudio>) -> Result<()> {
    let mut format = open_format(path)?;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("no default audio track"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("create decoder")?;

    loop {
        if shared.is_stopped() {
            break;
        }

        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(_) => break, // EOF
        };

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, *decoded.spec());
        sample_buf.copy_interleaved_ref(decoded);
        let samples = sample_buf.samples();

        // Push into the bounded queue; wait while it is full, but bail out
        // as soon as a stop is requested.
        let mut offset = 0;
        while offset < samples.len() {
            let mut q = shared.queue.lock().unwrap();

            while q.len() >= shared.max_buffered_samples && !shared.is_stopped() {
                q = shared.not_full.wait(q).unwrap();
            }
            if shared.is_stopped() {
                return Ok(());
            }

            while offset < samples.len() && q.len() < shared.max_buffered_samples {
                q.push_back(samples[offset]);
                offset += 1;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(src_channels: usize) -> SharedAudio {
        SharedAudio {
            src_channels,
            queue: Mutex::new(VecDeque::new()),
            not_full: Condvar::new(),
            done: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            max_buffered_samples: 8,
        }
    }

    #[test]
    fn stop_is_sticky() {
        let s = shared(2);
        assert!(!s.is_stopped());
        s.stop();
        s.stop();
        assert!(s.is_stopped());
    }
}
