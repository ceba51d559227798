//! Playback drivers.
//!
//! Both backends expose the same surface: `play_clip` plus a stream of
//! [`PlayerEvent`]s on a channel. Lifecycle failures are values the app
//! turns into transient status text; nothing mutates shared flags from
//! inside ambient callbacks.

pub(crate) mod connect;
pub(crate) mod preview;

use anyhow::{Result, bail};
use crossbeam_channel::Receiver;

use crate::session::ClipSource;

/// Driver lifecycle + clip notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlayerEvent {
    /// A playback device is registered and usable.
    Ready { device_id: String },
    /// The registered device went away.
    NotReady,
    InitError(String),
    AuthError(String),
    AccountError(String),
    PlaybackError(String),
    ClipStarted,
    ClipFinished,
}

/// Which playback backend the session uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Backend {
    /// Download the preview URL and play it locally.
    Preview,
    /// Device-scoped play/pause against the partner HTTPS API.
    Connect,
}

pub(crate) enum Driver {
    Preview(preview::PreviewDriver),
    Connect(connect::ConnectDriver),
}

impl Driver {
    pub(crate) fn events(&self) -> &Receiver<PlayerEvent> {
        match self {
            Driver::Preview(d) => d.events(),
            Driver::Connect(d) => d.events(),
        }
    }

    pub(crate) fn ready(&self) -> bool {
        match self {
            Driver::Preview(d) => d.ready(),
            Driver::Connect(d) => d.ready(),
        }
    }

    /// Play the first `secs` seconds of the session's clip source.
    pub(crate) fn play_clip(&mut self, source: &ClipSource, secs: u32) -> Result<()> {
        match (self, source) {
            (Driver::Preview(d), _) => d.play_clip(secs),
            (Driver::Connect(d), ClipSource::TrackUri(uri)) => d.play_clip(uri, secs),
            (Driver::Connect(_), ClipSource::PreviewUrl(_)) => {
                bail!("session has no track URI for device playback")
            }
        }
    }

    /// Stop whatever is sounding (quit, new game).
    pub(crate) fn stop(&mut self) {
        match self {
            Driver::Preview(d) => d.stop(),
            Driver::Connect(d) => d.stop(),
        }
    }
}
