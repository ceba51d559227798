//! Local preview playback: one downloaded file per session, clip-limited
//! replays through `clip-player`.

use std::path::PathBuf;
use std::thread;

use anyhow::{Result, bail};
use cpal::traits::DeviceTrait;
use crossbeam_channel::{Receiver, Sender, unbounded};

use clip_player::{ClipEvent, ClipHandle};

use super::PlayerEvent;

pub(crate) struct PreviewDriver {
    device: cpal::Device,
    device_label: String,
    media: Option<PathBuf>,
    handle: Option<ClipHandle>,
    tx: Sender<PlayerEvent>,
    rx: Receiver<PlayerEvent>,
}

impl PreviewDriver {
    pub(crate) fn new(device_hint: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = clip_player::device::pick_device(&host, device_hint)?;
        let device_label = device
            .description()
            .map(|d| d.name().to_string())
            .unwrap_or_else(|_| "default output".to_string());
        let (tx, rx) = unbounded();
        Ok(Self {
            device,
            device_label,
            media: None,
            handle: None,
            tx,
            rx,
        })
    }

    pub(crate) fn events(&self) -> &Receiver<PlayerEvent> {
        &self.rx
    }

    /// Readiness = the session's preview has been downloaded.
    pub(crate) fn ready(&self) -> bool {
        self.media.is_some()
    }

    /// Hand over the downloaded preview for the current session.
    pub(crate) fn set_media(&mut self, path: PathBuf) {
        self.media = Some(path);
        self.tx
            .send(PlayerEvent::Ready {
                device_id: self.device_label.clone(),
            })
            .ok();
    }

    /// Drop the previous session's media before a new game starts.
    pub(crate) fn clear_media(&mut self) {
        self.stop();
        self.media = None;
    }

    /// Replay the clip from time zero for `secs` seconds.
    pub(crate) fn play_clip(&mut self, secs: u32) -> Result<()> {
        let Some(path) = self.media.clone() else {
            bail!("Player not ready: preview still downloading");
        };
        self.stop();

        let (clip_tx, clip_rx) = unbounded::<ClipEvent>();
        let handle = clip_player::play_clip(&self.device, &path, secs, clip_tx)?;
        self.handle = Some(handle);

        // Forward clip lifecycle into the driver's event stream.
        let tx = self.tx.clone();
        thread::spawn(move || {
            while let Ok(ev) = clip_rx.recv() {
                let mapped = match ev {
                    ClipEvent::Started => PlayerEvent::ClipStarted,
                    ClipEvent::Finished => PlayerEvent::ClipFinished,
                    ClipEvent::Error(e) => PlayerEvent::PlaybackError(e),
                };
                let last = mapped == PlayerEvent::ClipFinished;
                if tx.send(mapped).is_err() || last {
                    break;
                }
            }
        });
        Ok(())
    }

    pub(crate) fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}
