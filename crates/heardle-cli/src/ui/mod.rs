//! Ratatui UI loop.
//!
//! Picker keys:
//! - Up/Down: move selection
//! - Space: toggle playlist (multi mode)
//! - Enter or s: start a game
//! - r: reload playlists
//! - L: log out and quit
//! - l: logs, q: quit
//!
//! Game keys:
//! - plain characters: type into the guess box (debounced search)
//! - Up/Down: move through results, Enter: guess the highlighted track
//! - Esc: hide results
//! - Ctrl-P: play clip, Ctrl-S: skip / give up, Ctrl-L: logs, Ctrl-Q: quit
//! - after the game ends: g new game, b playlists, q quit

mod app;
mod render;
mod view_model;

pub(crate) use app::{Options, run_tui};
