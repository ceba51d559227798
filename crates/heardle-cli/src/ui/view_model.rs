//! UI view-models for the TUI.
//!
//! This module converts `App` state into render-ready strings, labels, and
//! modal payloads so `render.rs` stays layout-focused.

use heardle_types::{Playlist, TrackHit};

use crate::playback::Backend;
use crate::playlists::{MISSING_COVER, Picker};
use crate::search::ResultsView;
use crate::session::{GuessRow, Outcome, Phase, SkipControl};
use crate::ui::app::{App, Screen};

pub(crate) struct UiView {
    pub(crate) header_lines: Vec<String>,
    pub(crate) screen: ScreenView,
    pub(crate) player_line: String,
    pub(crate) status_line: String,
    pub(crate) keys_line: String,
    pub(crate) active_modal: Option<UiModal>,
}

pub(crate) enum ScreenView {
    Picker(PickerView),
    Game(GameView),
}

pub(crate) struct PickerView {
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
    pub(crate) labels: Vec<String>,
    pub(crate) selected: Option<usize>,
    pub(crate) start_line: String,
}

pub(crate) struct GameView {
    pub(crate) loading: bool,
    pub(crate) failed: Option<String>,
    pub(crate) stats_line: String,
    pub(crate) play_line: String,
    pub(crate) input_line: String,
    pub(crate) results_open: bool,
    pub(crate) result_rows: Vec<String>,
    pub(crate) result_selected: Option<usize>,
    pub(crate) guess_rows: Vec<String>,
    pub(crate) controls_line: String,
}

pub(crate) enum UiModal {
    Result {
        title: String,
        body: String,
        layout: ModalLayout,
    },
    ConfirmSkip {
        title: String,
        body: String,
        layout: ModalLayout,
    },
    Logs {
        title: String,
        empty: bool,
        layout: ModalLayout,
    },
}

pub(crate) struct ModalLayout {
    pub(crate) width_pct: u16,
    pub(crate) height_pct: u16,
}

impl UiView {
    pub(crate) fn from_app(app: &App) -> Self {
        let backend = match app.backend {
            Backend::Preview => "preview",
            Backend::Connect => "connect",
        };
        let header_lines = vec![
            format!("heardle-cli  →  {}", app.server),
            format!("backend: {backend}"),
        ];

        let screen = match app.screen {
            Screen::Picker => ScreenView::Picker(build_picker_view(app)),
            Screen::Game => ScreenView::Game(build_game_view(app)),
        };

        Self {
            header_lines,
            screen,
            player_line: build_player_line(app),
            status_line: format!("status: {}", app.status),
            keys_line: build_keys_line(app),
            active_modal: build_active_modal(app),
        }
    }
}

fn build_player_line(app: &App) -> String {
    if let Some(text) = app.transient_text() {
        return format!("player: {text}");
    }
    match &app.device_label {
        Some(device) => format!("player: ready ({device})"),
        None => "player: -".to_string(),
    }
}

pub(crate) fn picker_row(playlist: &Playlist, multi: bool, chosen: bool) -> String {
    let prefix = if multi {
        if chosen { "[x] " } else { "[ ] " }
    } else {
        ""
    };
    let cover = if playlist.images.is_empty() {
        format!("  [{MISSING_COVER}]")
    } else {
        String::new()
    };
    format!(
        "{prefix}{}  [{} tracks]{cover}",
        playlist.name, playlist.tracks.total
    )
}

fn build_picker_view(app: &App) -> PickerView {
    let labels = app
        .picker
        .playlists
        .iter()
        .map(|p| picker_row(p, app.picker.is_multi(), app.picker.is_chosen(&p.id)))
        .collect::<Vec<_>>();
    let selected = (!labels.is_empty()).then_some(app.picker.cursor);

    let mut start_line = start_line_for(&app.picker);

    if app.picker_loading {
        start_line = "Loading playlists...".to_string();
    }

    PickerView {
        loading: app.picker_loading,
        error: app.picker_error.clone(),
        labels,
        selected,
        start_line,
    }
}

pub(crate) fn start_line_for(picker: &Picker) -> String {
    if picker.start_enabled() {
        picker.start_label()
    } else {
        format!("{} (select at least one playlist)", picker.start_label())
    }
}

pub(crate) fn result_row(hit: &TrackHit) -> String {
    if hit.artists.is_empty() {
        return hit.name.clone();
    }
    format!("{} - {}", hit.name, hit.artists.join(", "))
}

pub(crate) fn guess_row(index: usize, row: &GuessRow) -> String {
    let mark = if row.correct { "✓" } else { "✗" };
    format!("{:>2}. {mark} {}", index + 1, row.name)
}

pub(crate) fn outcome_modal(outcome: &Outcome) -> (String, String) {
    let title = if outcome.won { "You Win!" } else { "Game Over" };
    let body = format!(
        "{}\n{}\n\nPress g for a new game, b for playlists, q to quit",
        outcome.song, outcome.artists
    );
    (title.to_string(), body)
}

fn build_game_view(app: &App) -> GameView {
    let Some(game) = app.game.as_ref() else {
        return GameView {
            loading: true,
            failed: None,
            stats_line: String::new(),
            play_line: String::new(),
            input_line: String::new(),
            results_open: false,
            result_rows: Vec::new(),
            result_selected: None,
            guess_rows: Vec::new(),
            controls_line: String::new(),
        };
    };

    let mut stats_line = format!(
        "Guesses used: {}  |  Clip length: {}s",
        game.guesses_used, game.clip_secs
    );
    if let Some(skips) = game.skips_used {
        stats_line.push_str(&format!("  |  Skips used: {skips}"));
    }

    let play_line = if game.phase() == Phase::Loading {
        "Starting game...".to_string()
    } else if app.playing {
        "▶ Playing...".to_string()
    } else if !app.driver.ready() {
        "Player not ready".to_string()
    } else {
        "▶ Play clip (Ctrl-P)".to_string()
    };

    let input_line = if app.search.enabled {
        format!("Guess: {}_", app.search.query())
    } else {
        "Guess: (waiting for the server...)".to_string()
    };

    let (result_rows, result_selected) = match app.search.view() {
        ResultsView::Hidden => (Vec::new(), None),
        ResultsView::Rows => (
            app.search.results().iter().map(result_row).collect(),
            Some(app.search.selected()),
        ),
        ResultsView::NoMatches => (vec!["No results found".to_string()], None),
        ResultsView::Failed => (vec!["Search failed".to_string()], None),
    };

    let guess_rows = game
        .guesses
        .iter()
        .enumerate()
        .map(|(i, row)| guess_row(i, row))
        .collect();

    let controls_line = match game.skip_control() {
        SkipControl::Skip => "Ctrl-S: skip".to_string(),
        SkipControl::GiveUp => "Ctrl-S: give up (reveal answer)".to_string(),
        SkipControl::Hidden => String::new(),
    };

    GameView {
        loading: game.phase() == Phase::Loading,
        failed: game.fail_message.clone(),
        stats_line,
        play_line,
        input_line,
        results_open: !result_rows.is_empty(),
        result_rows,
        result_selected,
        guess_rows,
        controls_line,
    }
}

fn build_keys_line(app: &App) -> String {
    match app.screen {
        Screen::Picker => {
            if app.picker.is_multi() {
                "keys: ↑/↓ select | Space toggle | Enter/s start | r reload | l logs | L logout | q quit"
                    .to_string()
            } else {
                "keys: ↑/↓ select | Enter start | r reload | l logs | L logout | q quit".to_string()
            }
        }
        Screen::Game => {
            "keys: type to search | ↑/↓ pick | Enter guess | Esc hide | Ctrl-P play | Ctrl-S skip | Ctrl-L logs | Ctrl-Q quit"
                .to_string()
        }
    }
}

fn build_active_modal(app: &App) -> Option<UiModal> {
    if app.logs_open {
        return Some(UiModal::Logs {
            title: "Logs (Esc to close, ↑/↓ scroll)".to_string(),
            empty: app.logs.is_empty(),
            layout: ModalLayout {
                width_pct: 90,
                height_pct: 80,
            },
        });
    }
    if let Some(outcome) = app.game.as_ref().and_then(|g| g.outcome.as_ref()) {
        let (title, body) = outcome_modal(outcome);
        return Some(UiModal::Result {
            title,
            body,
            layout: ModalLayout {
                width_pct: 50,
                height_pct: 40,
            },
        });
    }
    if app.confirm_skip {
        return Some(UiModal::ConfirmSkip {
            title: "Skip".to_string(),
            body: "Skip and see the answer?\n\nPress y to confirm, n to cancel".to_string(),
            layout: ModalLayout {
                width_pct: 40,
                height_pct: 25,
            },
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use heardle_types::TracksInfo;

    #[test]
    fn result_row_joins_artists_with_commas() {
        let hit = TrackHit {
            id: "t1".into(),
            name: "Song A".into(),
            artists: vec!["Artist X".into()],
        };
        assert_eq!(result_row(&hit), "Song A - Artist X");

        let duo = TrackHit {
            id: "t2".into(),
            name: "Song B".into(),
            artists: vec!["Artist X".into(), "Artist Y".into()],
        };
        assert_eq!(result_row(&duo), "Song B - Artist X, Artist Y");
    }

    #[test]
    fn win_modal_shows_song_and_artists() {
        let outcome = Outcome {
            won: true,
            song: "Song A".into(),
            artists: "Artist X".into(),
        };
        let (title, body) = outcome_modal(&outcome);
        assert_eq!(title, "You Win!");
        assert!(body.starts_with("Song A\nArtist X"));
    }

    #[test]
    fn loss_modal_uses_game_over_title() {
        let outcome = Outcome {
            won: false,
            song: "Song B".into(),
            artists: "Artist Z".into(),
        };
        let (title, _) = outcome_modal(&outcome);
        assert_eq!(title, "Game Over");
    }

    #[test]
    fn guess_rows_are_numbered_and_marked() {
        let row = GuessRow {
            name: "Song A".into(),
            correct: false,
        };
        assert_eq!(guess_row(0, &row), " 1. ✗ Song A");
    }

    #[test]
    fn picker_row_marks_selection_and_missing_art() {
        let playlist = Playlist {
            id: "a".into(),
            name: "Road Trip".into(),
            images: Vec::new(),
            tracks: TracksInfo { total: 12 },
        };
        assert_eq!(
            picker_row(&playlist, true, true),
            "[x] Road Trip  [12 tracks]  [no art]"
        );
        assert_eq!(
            picker_row(&playlist, false, false),
            "Road Trip  [12 tracks]  [no art]"
        );
    }
}
