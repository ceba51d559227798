//! Debounced search-as-you-type over the backend track search.
//!
//! Pure state machine: the caller feeds it edits and the current time, and
//! asks `poll` whether a request is due. A generation counter makes stale
//! responses (superseded queries) fall on the floor, so only the most
//! recent debounce window's query ever lands in the result list.

use std::time::{Duration, Instant};

use heardle_types::TrackHit;

pub(crate) const MIN_QUERY_CHARS: usize = 2;
pub(crate) const DEBOUNCE: Duration = Duration::from_millis(300);

/// What the results dropdown should show. Display state is separate from
/// query state: hiding the list does not forget the results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResultsView {
    Hidden,
    Rows,
    NoMatches,
    Failed,
}

pub(crate) struct SearchBox {
    query: String,
    pending_since: Option<Instant>,
    generation: u64,
    results: Vec<TrackHit>,
    view: ResultsView,
    selected: usize,
    /// Disabled while a guess is in flight.
    pub(crate) enabled: bool,
}

impl SearchBox {
    pub(crate) fn new() -> Self {
        Self {
            query: String::new(),
            pending_since: None,
            generation: 0,
            results: Vec::new(),
            view: ResultsView::Hidden,
            selected: 0,
            enabled: true,
        }
    }

    pub(crate) fn query(&self) -> &str {
        &self.query
    }

    pub(crate) fn view(&self) -> ResultsView {
        self.view
    }

    pub(crate) fn results(&self) -> &[TrackHit] {
        &self.results
    }

    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    pub(crate) fn push_char(&mut self, c: char, now: Instant) {
        if !self.enabled {
            return;
        }
        self.query.push(c);
        self.on_edit(now);
    }

    pub(crate) fn backspace(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        self.query.pop();
        self.on_edit(now);
    }

    fn on_edit(&mut self, now: Instant) {
        // Every edit supersedes any pending window and any in-flight request.
        self.generation = self.generation.wrapping_add(1);
        if self.query.trim().chars().count() < MIN_QUERY_CHARS {
            self.pending_since = None;
            self.results.clear();
            self.view = ResultsView::Hidden;
        } else {
            self.pending_since = Some(now);
        }
    }

    /// Return `(generation, query)` exactly once when the debounce window
    /// for the latest edit has elapsed.
    pub(crate) fn poll(&mut self, now: Instant) -> Option<(u64, String)> {
        let since = self.pending_since?;
        if now.duration_since(since) < DEBOUNCE {
            return None;
        }
        self.pending_since = None;
        Some((self.generation, self.query.trim().to_string()))
    }

    pub(crate) fn on_results(&mut self, generation: u64, result: Result<Vec<TrackHit>, String>) {
        if generation != self.generation {
            return; // superseded query
        }
        match result {
            Ok(hits) if hits.is_empty() => {
                self.results.clear();
                self.view = ResultsView::NoMatches;
            }
            Ok(hits) => {
                self.results = hits;
                self.selected = 0;
                self.view = ResultsView::Rows;
            }
            Err(e) => {
                tracing::warn!("search failed: {e}");
                self.results.clear();
                self.view = ResultsView::Failed;
            }
        }
    }

    /// Hide the dropdown (the click-outside analog). Results are kept.
    pub(crate) fn hide(&mut self) {
        self.view = ResultsView::Hidden;
    }

    /// Re-focusing the input re-shows a non-empty result set, no re-query.
    pub(crate) fn refocus(&mut self) {
        if self.view == ResultsView::Hidden && !self.results.is_empty() {
            self.view = ResultsView::Rows;
        }
    }

    pub(crate) fn select_next(&mut self) {
        if self.view == ResultsView::Rows && !self.results.is_empty() {
            self.selected = (self.selected + 1).min(self.results.len() - 1);
        }
    }

    pub(crate) fn select_prev(&mut self) {
        if self.view == ResultsView::Rows {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    /// Take the highlighted result as a guess; hides the dropdown.
    pub(crate) fn take_selected(&mut self) -> Option<TrackHit> {
        if self.view != ResultsView::Rows {
            return None;
        }
        let hit = self.results.get(self.selected).cloned()?;
        self.hide();
        Some(hit)
    }

    /// Clear the typed query after a guess is submitted. Results stay so a
    /// refocus can re-show them.
    pub(crate) fn clear_input(&mut self) {
        self.query.clear();
        self.pending_since = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, name: &str) -> TrackHit {
        TrackHit {
            id: id.into(),
            name: name.into(),
            artists: vec!["Artist X".into()],
        }
    }

    fn type_str(sb: &mut SearchBox, s: &str, now: Instant) {
        for c in s.chars() {
            sb.push_char(c, now);
        }
    }

    #[test]
    fn short_queries_never_fire() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        sb.push_char('a', t0);
        assert_eq!(sb.poll(t0 + Duration::from_secs(5)), None);
        assert_eq!(sb.view(), ResultsView::Hidden);
        assert!(sb.results().is_empty());
    }

    #[test]
    fn shrinking_below_two_chars_clears_results() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        type_str(&mut sb, "ab", t0);
        let (generation, _) = sb.poll(t0 + DEBOUNCE).unwrap();
        sb.on_results(generation, Ok(vec![hit("t1", "Song A")]));
        assert_eq!(sb.view(), ResultsView::Rows);

        sb.backspace(t0 + Duration::from_millis(400));
        assert_eq!(sb.view(), ResultsView::Hidden);
        assert!(sb.results().is_empty());
        assert_eq!(sb.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn rapid_keystrokes_fire_once_for_the_final_query() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        sb.push_char('a', t0);
        sb.push_char('b', t0 + Duration::from_millis(100));
        sb.push_char('c', t0 + Duration::from_millis(200));

        // 200 ms after the last keystroke: still inside the window.
        assert_eq!(sb.poll(t0 + Duration::from_millis(400)), None);

        let fired = sb.poll(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(fired.1, "abc");

        // One shot only.
        assert_eq!(sb.poll(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        type_str(&mut sb, "ab", t0);
        let (g1, _) = sb.poll(t0 + DEBOUNCE).unwrap();

        sb.push_char('c', t0 + Duration::from_millis(600));
        let (g2, q2) = sb.poll(t0 + Duration::from_millis(1000)).unwrap();
        assert_eq!(q2, "abc");

        // The response for the superseded query arrives late.
        sb.on_results(g1, Ok(vec![hit("old", "Old Song")]));
        assert_eq!(sb.view(), ResultsView::Hidden);

        sb.on_results(g2, Ok(vec![hit("new", "New Song")]));
        assert_eq!(sb.view(), ResultsView::Rows);
        assert_eq!(sb.results()[0].id, "new");
    }

    #[test]
    fn failure_shows_placeholder() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        type_str(&mut sb, "abc", t0);
        let (generation, _) = sb.poll(t0 + DEBOUNCE).unwrap();
        sb.on_results(generation, Err("500".into()));
        assert_eq!(sb.view(), ResultsView::Failed);
    }

    #[test]
    fn empty_result_set_shows_no_matches() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        type_str(&mut sb, "zzz", t0);
        let (generation, _) = sb.poll(t0 + DEBOUNCE).unwrap();
        sb.on_results(generation, Ok(vec![]));
        assert_eq!(sb.view(), ResultsView::NoMatches);
    }

    #[test]
    fn refocus_reshows_results_without_a_new_request() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        type_str(&mut sb, "ab", t0);
        let (generation, _) = sb.poll(t0 + DEBOUNCE).unwrap();
        sb.on_results(generation, Ok(vec![hit("t1", "Song A")]));

        sb.hide();
        assert_eq!(sb.view(), ResultsView::Hidden);

        sb.refocus();
        assert_eq!(sb.view(), ResultsView::Rows);
        assert_eq!(sb.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn selecting_a_result_hides_the_dropdown() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new();
        type_str(&mut sb, "ab", t0);
        let (generation, _) = sb.poll(t0 + DEBOUNCE).unwrap();
        sb.on_results(generation, Ok(vec![hit("t1", "Song A"), hit("t2", "Song B")]));

        sb.select_next();
        let taken = sb.take_selected().unwrap();
        assert_eq!(taken.id, "t2");
        assert_eq!(sb.view(), ResultsView::Hidden);
    }
}
