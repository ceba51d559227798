//! Client-side mirror of a server-held game session.
//!
//! The server owns scoring, win/loss, and the skip budget; this controller
//! only records what the last response said and gates which requests may be
//! sent next. It never derives guesses-used, correctness, or completion.

use heardle_types::{CorrectSong, GuessResponse, SkipResponse, StartGameRequest, StartGameResponse};

/// Which playlists a session draws from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PlaylistScope {
    Single(String),
    Multi(Vec<String>),
}

impl PlaylistScope {
    pub(crate) fn to_request(&self) -> StartGameRequest {
        match self {
            Self::Single(id) => StartGameRequest {
                playlist_id: Some(id.clone()),
                playlist_ids: None,
            },
            Self::Multi(ids) => StartGameRequest {
                playlist_id: None,
                playlist_ids: Some(ids.clone()),
            },
        }
    }
}

/// How the skip control behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum SkipMode {
    /// Ask for confirmation first; a skip always reveals the answer.
    Confirm,
    /// Skip freely while the server reports budget, then switch to give-up.
    Budget,
}

/// Where the clip audio comes from, as dictated by the start response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ClipSource {
    PreviewUrl(String),
    TrackUri(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Loading,
    Active,
    Complete,
    Failed,
}

/// Which skip-flavoured control the UI should offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SkipControl {
    Skip,
    GiveUp,
    Hidden,
}

/// One row in the guess log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GuessRow {
    pub(crate) name: String,
    pub(crate) correct: bool,
}

/// Final result shown in the win/lose modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) won: bool,
    pub(crate) song: String,
    pub(crate) artists: String,
}

fn make_outcome(won: bool, song: Option<&CorrectSong>) -> Outcome {
    match song {
        Some(s) => Outcome {
            won,
            song: s.name.clone(),
            artists: s.artists.join(", "),
        },
        None => Outcome {
            won,
            song: "(unknown)".into(),
            artists: String::new(),
        },
    }
}

pub(crate) struct GameController {
    scope: PlaylistScope,
    skip_mode: SkipMode,
    phase: Phase,
    pub(crate) session_id: Option<String>,
    pub(crate) guesses_used: u32,
    pub(crate) skips_used: Option<u32>,
    pub(crate) can_skip: Option<bool>,
    /// Seconds of clip unlocked by the last response.
    pub(crate) clip_secs: u32,
    pub(crate) source: Option<ClipSource>,
    pub(crate) guesses: Vec<GuessRow>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) fail_message: Option<String>,
    /// Playlist id echoed by the server, used to restart the same game.
    restart_id: Option<String>,
    /// A guess or skip request is in flight; input stays disabled.
    awaiting: bool,
}

impl GameController {
    pub(crate) fn new(scope: PlaylistScope, skip_mode: SkipMode) -> Self {
        Self {
            scope,
            skip_mode,
            phase: Phase::Loading,
            session_id: None,
            guesses_used: 0,
            skips_used: None,
            can_skip: None,
            clip_secs: 0,
            source: None,
            guesses: Vec::new(),
            outcome: None,
            fail_message: None,
            restart_id: None,
            awaiting: false,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Scope to use for "new game": the playlist the server pinned the last
    /// session to when known, else the original selection.
    pub(crate) fn restart_scope(&self) -> PlaylistScope {
        match &self.restart_id {
            Some(id) => PlaylistScope::Single(id.clone()),
            None => self.scope.clone(),
        }
    }

    pub(crate) fn on_started(
        &mut self,
        result: Result<StartGameResponse, String>,
        fail_hint: &str,
    ) {
        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("start-session failed: {e}");
                self.phase = Phase::Failed;
                self.fail_message = Some(fail_hint.to_string());
                return;
            }
        };

        self.session_id = Some(resp.session_id);
        self.clip_secs = resp.audio_duration;
        self.skips_used = resp.skips_used;
        self.can_skip = resp.can_skip;
        self.restart_id = resp.playlist_id;
        self.source = match (resp.preview_url, resp.track_uri) {
            (Some(url), _) => Some(ClipSource::PreviewUrl(url)),
            (None, Some(uri)) => Some(ClipSource::TrackUri(uri)),
            (None, None) => None,
        };

        if self.source.is_none() {
            self.phase = Phase::Failed;
            self.fail_message = Some(fail_hint.to_string());
            return;
        }
        self.phase = Phase::Active;
    }

    /// Gate for submitting a guess. A guess after completion, or while a
    /// request is already in flight, is a no-op.
    pub(crate) fn begin_guess(&mut self) -> bool {
        if self.phase != Phase::Active || self.awaiting {
            return false;
        }
        self.awaiting = true;
        true
    }

    /// Apply a guess response. Returns inline error text on failure; the
    /// mirrored state is left untouched in that case.
    pub(crate) fn on_guess(
        &mut self,
        track_name: &str,
        result: Result<GuessResponse, String>,
    ) -> Option<String> {
        self.awaiting = false;
        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("guess failed: {e}");
                return Some("Failed to submit guess".to_string());
            }
        };

        self.guesses_used = resp.guesses_used;
        self.clip_secs = resp.audio_duration;
        if resp.skips_used.is_some() {
            self.skips_used = resp.skips_used;
        }
        if resp.can_skip.is_some() {
            self.can_skip = resp.can_skip;
        }
        self.guesses.push(GuessRow {
            name: track_name.to_string(),
            correct: resp.is_correct,
        });

        if resp.is_complete {
            self.phase = Phase::Complete;
            let won = resp.won.unwrap_or(resp.is_correct);
            self.outcome = Some(make_outcome(won, resp.correct_song.as_ref()));
        }
        None
    }

    /// Gate for a skip/give-up request.
    pub(crate) fn begin_skip(&mut self) -> bool {
        if self.phase != Phase::Active || self.awaiting {
            return false;
        }
        self.awaiting = true;
        true
    }

    /// Apply a skip response. Returns inline error text on failure.
    pub(crate) fn on_skip(&mut self, result: Result<SkipResponse, String>) -> Option<String> {
        self.awaiting = false;
        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("skip failed: {e}");
                return Some("Failed to skip".to_string());
            }
        };

        if let Some(secs) = resp.audio_duration {
            self.clip_secs = secs;
        }
        if resp.skips_used.is_some() {
            self.skips_used = resp.skips_used;
        }
        if resp.can_skip.is_some() {
            self.can_skip = resp.can_skip;
        }

        if resp.is_complete {
            self.phase = Phase::Complete;
            // A skipped game is never a win.
            self.outcome = Some(make_outcome(false, resp.correct_song.as_ref()));
        }
        None
    }

    pub(crate) fn skip_control(&self) -> SkipControl {
        if self.phase != Phase::Active {
            return SkipControl::Hidden;
        }
        match self.skip_mode {
            SkipMode::Confirm => SkipControl::Skip,
            SkipMode::Budget => {
                if self.can_skip.unwrap_or(false) {
                    SkipControl::Skip
                } else {
                    SkipControl::GiveUp
                }
            }
        }
    }

    pub(crate) fn skip_needs_confirmation(&self) -> bool {
        self.skip_mode == SkipMode::Confirm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heardle_types::CorrectSong;

    fn started(scope: PlaylistScope, mode: SkipMode) -> GameController {
        let mut game = GameController::new(scope, mode);
        game.on_started(
            Ok(StartGameResponse {
                session_id: "s1".into(),
                audio_duration: 1,
                preview_url: Some("https://cdn.example/p.mp3".into()),
                track_uri: None,
                skips_used: None,
                can_skip: None,
                playlist_id: None,
            }),
            "start failed",
        );
        game
    }

    fn guess_ok(correct: bool, complete: bool) -> GuessResponse {
        GuessResponse {
            is_correct: correct,
            is_complete: complete,
            won: None,
            guesses_used: 1,
            audio_duration: 2,
            skips_used: None,
            can_skip: None,
            correct_song: complete.then(|| CorrectSong {
                id: None,
                name: "Song A".into(),
                artists: vec!["Artist X".into(), "Artist Y".into()],
                preview_url: None,
            }),
        }
    }

    #[test]
    fn start_success_mirrors_session_fields() {
        let game = started(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        assert_eq!(game.phase(), Phase::Active);
        assert_eq!(game.session_id.as_deref(), Some("s1"));
        assert_eq!(game.clip_secs, 1);
        assert!(matches!(game.source, Some(ClipSource::PreviewUrl(_))));
    }

    #[test]
    fn start_failure_is_terminal() {
        let mut game = GameController::new(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        game.on_started(Err("503".into()), "could not start");
        assert_eq!(game.phase(), Phase::Failed);
        assert_eq!(game.fail_message.as_deref(), Some("could not start"));
        assert!(!game.begin_guess());
    }

    #[test]
    fn completion_sets_outcome_and_hides_controls() {
        let mut game = started(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        assert!(game.begin_guess());
        let err = game.on_guess("Song A", Ok(guess_ok(true, true)));
        assert!(err.is_none());
        assert_eq!(game.phase(), Phase::Complete);
        assert_eq!(game.skip_control(), SkipControl::Hidden);
        let outcome = game.outcome.as_ref().unwrap();
        assert!(outcome.won);
        assert_eq!(outcome.song, "Song A");
        assert_eq!(outcome.artists, "Artist X, Artist Y");
    }

    #[test]
    fn guess_after_completion_is_a_noop() {
        let mut game = started(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        game.begin_guess();
        game.on_guess("Song A", Ok(guess_ok(true, true)));
        assert!(!game.begin_guess());
    }

    #[test]
    fn failed_guess_leaves_state_unchanged() {
        let mut game = started(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        game.begin_guess();
        let err = game.on_guess("Song B", Err("timeout".into()));
        assert_eq!(err.as_deref(), Some("Failed to submit guess"));
        assert_eq!(game.phase(), Phase::Active);
        assert_eq!(game.guesses_used, 0);
        assert!(game.guesses.is_empty());
        // Input is usable again.
        assert!(game.begin_guess());
    }

    #[test]
    fn won_falls_back_to_is_correct_when_absent() {
        let mut game = started(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        game.begin_guess();
        game.on_guess("Song A", Ok(guess_ok(true, true)));
        assert!(game.outcome.as_ref().unwrap().won);
    }

    #[test]
    fn budget_mode_switches_to_give_up_when_budget_runs_out() {
        let mut game = started(PlaylistScope::Single("pl1".into()), SkipMode::Budget);
        game.can_skip = Some(true);
        assert_eq!(game.skip_control(), SkipControl::Skip);

        game.begin_skip();
        let err = game.on_skip(Ok(SkipResponse {
            is_complete: false,
            audio_duration: Some(2),
            skips_used: Some(1),
            can_skip: Some(false),
            correct_song: None,
        }));
        assert!(err.is_none());
        assert_eq!(game.phase(), Phase::Active);
        assert_eq!(game.clip_secs, 2);
        assert_eq!(game.skip_control(), SkipControl::GiveUp);
    }

    #[test]
    fn skip_completion_is_a_loss() {
        let mut game = started(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        game.begin_skip();
        game.on_skip(Ok(SkipResponse {
            is_complete: true,
            audio_duration: None,
            skips_used: None,
            can_skip: None,
            correct_song: Some(CorrectSong {
                id: None,
                name: "Song B".into(),
                artists: vec!["Artist Z".into()],
                preview_url: None,
            }),
        }));
        let outcome = game.outcome.as_ref().unwrap();
        assert!(!outcome.won);
        assert_eq!(outcome.song, "Song B");
    }

    #[test]
    fn failed_skip_leaves_state_unchanged() {
        let mut game = started(PlaylistScope::Single("pl1".into()), SkipMode::Confirm);
        game.begin_skip();
        let err = game.on_skip(Err("502".into()));
        assert_eq!(err.as_deref(), Some("Failed to skip"));
        assert_eq!(game.phase(), Phase::Active);
        assert!(game.outcome.is_none());
    }

    #[test]
    fn restart_prefers_server_pinned_playlist() {
        let mut game = GameController::new(
            PlaylistScope::Multi(vec!["a".into(), "b".into()]),
            SkipMode::Budget,
        );
        game.on_started(
            Ok(StartGameResponse {
                session_id: "s2".into(),
                audio_duration: 1,
                preview_url: None,
                track_uri: Some("partner:track:42".into()),
                skips_used: Some(0),
                can_skip: Some(true),
                playlist_id: Some("b".into()),
            }),
            "start failed",
        );
        assert_eq!(game.restart_scope(), PlaylistScope::Single("b".into()));
    }
}
