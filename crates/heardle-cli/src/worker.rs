//! Background worker that owns every backend call.
//!
//! The UI thread never blocks on the network: commands go in over one
//! channel, results come back as events on another. Calls are serialized in
//! arrival order; search staleness is handled by the debouncer generation,
//! not by cancelling requests mid-flight.

use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};
use heardle_types::{
    GuessRequest, GuessResponse, Playlist, SkipRequest, SkipResponse, StartGameResponse, TrackHit,
};

use crate::server_api::ApiClient;
use crate::session::PlaylistScope;

#[derive(Debug, Clone)]
pub(crate) enum Command {
    LoadPlaylists,
    Start(PlaylistScope),
    Guess {
        session_id: String,
        track_id: String,
        track_name: String,
    },
    Skip {
        session_id: String,
    },
    Search {
        generation: u64,
        query: String,
    },
    FetchToken,
    FetchPreview {
        url: String,
    },
    Logout,
    Quit,
}

#[derive(Debug, Clone)]
pub(crate) enum Event {
    Playlists(Result<Vec<Playlist>, String>),
    Started(Result<StartGameResponse, String>),
    GuessResult {
        track_name: String,
        result: Result<GuessResponse, String>,
    },
    SkipResult(Result<SkipResponse, String>),
    SearchResults {
        generation: u64,
        result: Result<Vec<TrackHit>, String>,
    },
    Token(Result<String, String>),
    PreviewReady(Result<PathBuf, String>),
    LoggedOut,
}

pub(crate) fn worker_main(api: ApiClient, cmd_rx: Receiver<Command>, evt_tx: Sender<Event>) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            Command::LoadPlaylists => {
                let result = api.playlists().map_err(|e| format!("{e:#}"));
                if evt_tx.send(Event::Playlists(result)).is_err() {
                    break;
                }
            }
            Command::Start(scope) => {
                let result = api
                    .start_game(&scope.to_request())
                    .map_err(|e| format!("{e:#}"));
                if evt_tx.send(Event::Started(result)).is_err() {
                    break;
                }
            }
            Command::Guess {
                session_id,
                track_id,
                track_name,
            } => {
                let result = api
                    .submit_guess(&GuessRequest {
                        session_id,
                        track_id,
                        track_name: track_name.clone(),
                    })
                    .map_err(|e| format!("{e:#}"));
                if evt_tx
                    .send(Event::GuessResult { track_name, result })
                    .is_err()
                {
                    break;
                }
            }
            Command::Skip { session_id } => {
                let result = api
                    .skip(&SkipRequest { session_id })
                    .map_err(|e| format!("{e:#}"));
                if evt_tx.send(Event::SkipResult(result)).is_err() {
                    break;
                }
            }
            Command::Search { generation, query } => {
                let result = api.search(&query).map_err(|e| format!("{e:#}"));
                if evt_tx
                    .send(Event::SearchResults { generation, result })
                    .is_err()
                {
                    break;
                }
            }
            Command::FetchToken => {
                let result = api
                    .token()
                    .map(|t| t.access_token)
                    .map_err(|e| format!("{e:#}"));
                if evt_tx.send(Event::Token(result)).is_err() {
                    break;
                }
            }
            Command::FetchPreview { url } => {
                let dest = preview_path(&url);
                let result = api
                    .download(&url, &dest)
                    .map(|_| dest)
                    .map_err(|e| format!("{e:#}"));
                if evt_tx.send(Event::PreviewReady(result)).is_err() {
                    break;
                }
            }
            Command::Logout => {
                // Quit regardless of the outcome, like the redirect-to-root
                // the web client does.
                if let Err(e) = api.logout() {
                    tracing::warn!("logout failed: {e:#}");
                }
                let _ = evt_tx.send(Event::LoggedOut);
                break;
            }
            Command::Quit => break,
        }
    }
}

/// Scratch path for the downloaded preview; extension is taken from the URL
/// so the decoder gets a useful hint.
fn preview_path(url: &str) -> PathBuf {
    let ext = url
        .rsplit('.')
        .next()
        .filter(|ext| ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("mp3");
    std::env::temp_dir().join(format!("heardle-preview-{}.{ext}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_path_keeps_simple_extensions() {
        let p = preview_path("https://cdn.example/clip.ogg");
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("ogg"));
    }

    #[test]
    fn preview_path_defaults_to_mp3_for_odd_urls() {
        let p = preview_path("https://cdn.example/clip?token=abc.def/ghi");
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("mp3"));
    }
}
