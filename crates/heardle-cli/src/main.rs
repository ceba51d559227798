//! `heardle-cli` — a TUI client for a song-guessing game server.
//!
//! The server owns the game: it picks a hidden track from your playlists,
//! scores guesses, and tracks skips. This client lists playlists, plays the
//! allowed few seconds of the clip, and streams debounced search queries so
//! you can name the song.

mod playback;
mod playlists;
mod search;
mod server_api;
mod session;
mod ui;
mod worker;

use std::io;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::{Sender, unbounded};
use tracing_subscriber::EnvFilter;

use crate::playback::Backend;
use crate::session::{PlaylistScope, SkipMode};

#[derive(Parser, Debug)]
#[command(name = "heardle-cli", version)]
struct Args {
    /// Base URL of the game server, e.g. http://127.0.0.1:8080
    #[arg(long)]
    server: String,

    /// Skip the picker and start with this playlist id.
    #[arg(long, conflicts_with = "playlists")]
    playlist: Option<String>,

    /// Skip the picker and start with these playlist ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    playlists: Option<Vec<String>>,

    /// Playback backend.
    #[arg(long, value_enum, default_value = "preview")]
    backend: Backend,

    /// Multi-select playlist picker (Space toggles, Enter starts).
    #[arg(long)]
    multi: bool,

    /// Skip-control behaviour.
    #[arg(long, value_enum, default_value = "confirm")]
    skip_mode: SkipMode,

    /// Use the output device whose name contains this string (preview backend).
    #[arg(long)]
    device: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (log_tx, log_rx) = unbounded::<String>();
    init_logging(log_tx);

    let scope = match (args.playlist, args.playlists) {
        (Some(id), _) => Some(PlaylistScope::Single(id)),
        (None, Some(ids)) if !ids.is_empty() => Some(PlaylistScope::Multi(ids)),
        _ => None,
    };

    ui::run_tui(
        ui::Options {
            server: args.server,
            backend: args.backend,
            multi: args.multi,
            skip_mode: args.skip_mode,
            device: args.device,
            scope,
        },
        log_rx,
    )
}

/// Formatted log lines go to a channel drained by the in-app log modal; the
/// terminal itself stays clean while the alternate screen is active.
struct ChannelWriter {
    tx: Sender<String>,
    buf: Vec<u8>,
}

impl io::Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            if !line.is_empty() {
                self.tx.send(line).ok();
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn init_logging(tx: Sender<String>) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(move || ChannelWriter {
            tx: tx.clone(),
            buf: Vec::new(),
        })
        .init();
}
