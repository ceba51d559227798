//! Playlist picker state: cursor, selection set, start gating.

use std::collections::HashSet;

use heardle_types::Playlist;

use crate::session::PlaylistScope;

/// Shown in place of a cover for playlists without images.
pub(crate) const MISSING_COVER: &str = "no art";

pub(crate) struct Picker {
    pub(crate) playlists: Vec<Playlist>,
    pub(crate) cursor: usize,
    chosen: HashSet<String>,
    multi: bool,
}

impl Picker {
    pub(crate) fn new(multi: bool) -> Self {
        Self {
            playlists: Vec::new(),
            cursor: 0,
            chosen: HashSet::new(),
            multi,
        }
    }

    pub(crate) fn is_multi(&self) -> bool {
        self.multi
    }

    /// Replace the list. Server order is kept as-is.
    pub(crate) fn set_playlists(&mut self, playlists: Vec<Playlist>) {
        self.playlists = playlists;
        self.cursor = 0;
        self.chosen.clear();
    }

    pub(crate) fn cursor_next(&mut self) {
        if self.playlists.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1).min(self.playlists.len() - 1);
    }

    pub(crate) fn cursor_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Toggle membership of the playlist under the cursor (multi mode).
    pub(crate) fn toggle_current(&mut self) {
        if !self.multi {
            return;
        }
        let Some(playlist) = self.playlists.get(self.cursor) else {
            return;
        };
        if !self.chosen.remove(&playlist.id) {
            self.chosen.insert(playlist.id.clone());
        }
    }

    pub(crate) fn is_chosen(&self, id: &str) -> bool {
        self.chosen.contains(id)
    }

    pub(crate) fn chosen_count(&self) -> usize {
        self.chosen.len()
    }

    /// Scope for starting a session, or `None` when starting is blocked
    /// (multi mode with nothing selected, or an empty list).
    pub(crate) fn start_scope(&self) -> Option<PlaylistScope> {
        if self.multi {
            if self.chosen.is_empty() {
                return None;
            }
            // Membership order is irrelevant; emit ids in display order.
            let ids: Vec<String> = self
                .playlists
                .iter()
                .filter(|p| self.chosen.contains(&p.id))
                .map(|p| p.id.clone())
                .collect();
            return Some(PlaylistScope::Multi(ids));
        }
        self.playlists
            .get(self.cursor)
            .map(|p| PlaylistScope::Single(p.id.clone()))
    }

    pub(crate) fn start_enabled(&self) -> bool {
        self.start_scope().is_some()
    }

    /// Label for the start action, reflecting the selection count.
    pub(crate) fn start_label(&self) -> String {
        if !self.multi {
            return "Enter: start with highlighted playlist".to_string();
        }
        match self.chosen_count() {
            0 => "Start Game".to_string(),
            1 => "Start Game with 1 Playlist".to_string(),
            n => format!("Start Game with {n} Playlists"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heardle_types::TracksInfo;

    fn playlist(id: &str, name: &str) -> Playlist {
        Playlist {
            id: id.into(),
            name: name.into(),
            images: Vec::new(),
            tracks: TracksInfo { total: 10 },
        }
    }

    fn picker_with(multi: bool, lists: Vec<Playlist>) -> Picker {
        let mut picker = Picker::new(multi);
        picker.set_playlists(lists);
        picker
    }

    #[test]
    fn toggle_twice_restores_prior_state() {
        let mut picker = picker_with(true, vec![playlist("a", "A"), playlist("b", "B")]);
        let before_label = picker.start_label();
        let before_enabled = picker.start_enabled();

        picker.toggle_current();
        assert!(picker.is_chosen("a"));
        assert_ne!(picker.start_label(), before_label);

        picker.toggle_current();
        assert!(!picker.is_chosen("a"));
        assert_eq!(picker.start_label(), before_label);
        assert_eq!(picker.start_enabled(), before_enabled);
    }

    #[test]
    fn multi_start_blocked_with_empty_selection() {
        let picker = picker_with(true, vec![playlist("a", "A")]);
        assert_eq!(picker.start_scope(), None);
        assert!(!picker.start_enabled());
        assert_eq!(picker.start_label(), "Start Game");
    }

    #[test]
    fn multi_start_label_reflects_count() {
        let mut picker = picker_with(true, vec![playlist("a", "A"), playlist("b", "B")]);
        picker.toggle_current();
        assert_eq!(picker.start_label(), "Start Game with 1 Playlist");
        picker.cursor_next();
        picker.toggle_current();
        assert_eq!(picker.start_label(), "Start Game with 2 Playlists");
        assert_eq!(
            picker.start_scope(),
            Some(PlaylistScope::Multi(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn single_mode_starts_with_highlighted_row() {
        let mut picker = picker_with(false, vec![playlist("a", "A"), playlist("b", "B")]);
        picker.cursor_next();
        assert_eq!(
            picker.start_scope(),
            Some(PlaylistScope::Single("b".into()))
        );
    }
}
