//! Interaction state machine for the address suggestion field.
//!
//! Pure and synchronous: callers feed it keystrokes, timer expiries,
//! search results, and keyboard events, and read back what to render
//! and when to dispatch a search. Keeping the transitions here, rather
//! than in a transport handler, makes the debounce and
//! reopen-on-refocus rules testable without any timers or I/O.

use std::time::Duration;

use kasira_domain::SuggestItem;

/// Minimum input length before a search is dispatched.
const DEFAULT_MIN_CHARS: usize = 3;

/// Default debounce between the last keystroke and the dispatch.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Suggestion dropdown state.
///
/// The owner drives it with four kinds of events: text edits, debounce
/// expiry, arriving results, and keyboard/focus actions.
#[derive(Debug, Clone)]
pub struct SuggestionFlow {
    text: String,
    min_chars: usize,
    debounce: Duration,
    list: Vec<SuggestItem>,
    last_results: Vec<SuggestItem>,
    open: bool,
    highlighted: Option<usize>,
    just_picked: bool,
}

impl Default for SuggestionFlow {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARS, DEFAULT_DEBOUNCE)
    }
}

impl SuggestionFlow {
    /// Creates a flow with the given dispatch threshold and debounce.
    #[must_use]
    pub fn new(min_chars: usize, debounce: Duration) -> Self {
        Self {
            text: String::new(),
            min_chars,
            debounce,
            list: Vec::new(),
            last_results: Vec::new(),
            open: false,
            highlighted: None,
            just_picked: false,
        }
    }

    /// Current input text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How long the owner should wait after a keystroke before calling
    /// [`Self::debounce_elapsed`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Suggestions to render, in rank order.
    #[must_use]
    pub fn list(&self) -> &[SuggestItem] {
        &self.list
    }

    /// Whether the dropdown is visible.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Index of the keyboard-highlighted row, when any.
    #[must_use]
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Records a text edit. The owner restarts its debounce timer after
    /// every call.
    pub fn input_changed(&mut self, text: &str) {
        self.text = text.to_owned();
        if text.trim().len() < self.min_chars {
            self.list.clear();
            self.open = false;
            self.highlighted = None;
        }
    }

    /// Fires when the debounce timer expires; returns the query to
    /// dispatch, or `None` when no search is due.
    ///
    /// The first expiry after [`Self::commit`] is swallowed so that
    /// programmatically setting the text to the picked label does not
    /// immediately reopen the dropdown.
    pub fn debounce_elapsed(&mut self) -> Option<String> {
        if self.just_picked {
            self.just_picked = false;
            return None;
        }

        let trimmed = self.text.trim();
        if trimmed.len() < self.min_chars {
            return None;
        }
        Some(trimmed.to_owned())
    }

    /// Delivers search results for the most recent dispatched query.
    pub fn results_ready(&mut self, rows: Vec<SuggestItem>) {
        self.last_results = rows.clone();
        self.open = !rows.is_empty();
        self.list = rows;
        self.highlighted = None;
    }

    /// Field regained focus: reopen the previous results when the text
    /// still qualifies.
    pub fn focus(&mut self) {
        if self.text.trim().len() >= self.min_chars && !self.last_results.is_empty() {
            self.list = self.last_results.clone();
            self.open = true;
        }
    }

    /// Moves the highlight down, clamped to the last row.
    pub fn move_down(&mut self) {
        if self.list.is_empty() {
            return;
        }
        let last = self.list.len() - 1;
        self.highlighted = Some(match self.highlighted {
            Some(index) => index.saturating_add(1).min(last),
            None => 0,
        });
    }

    /// Moves the highlight up, clamped to the first row.
    pub fn move_up(&mut self) {
        if self.list.is_empty() {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            Some(index) => index.saturating_sub(1),
            None => 0,
        });
    }

    /// Commits the highlighted row (or the given index for a click),
    /// closing the dropdown and adopting the row's label as the text.
    pub fn commit(&mut self, index: Option<usize>) -> Option<SuggestItem> {
        let index = index.or(self.highlighted)?;
        let picked = self.list.get(index)?.clone();

        self.text = picked.label.clone();
        self.open = false;
        self.highlighted = None;
        self.just_picked = true;
        Some(picked)
    }

    /// Closes the dropdown without changing the text, as on Escape or
    /// an outside click.
    pub fn close(&mut self) {
        self.open = false;
        self.highlighted = None;
    }

    /// The selected region changed: previous results no longer apply.
    pub fn region_changed(&mut self) {
        self.list.clear();
        self.last_results.clear();
        self.open = false;
        self.highlighted = None;
    }
}

#[cfg(test)]
mod tests {
    use kasira_domain::SuggestItem;
    use serde_json::Map;

    use super::SuggestionFlow;

    fn row(label: &str) -> SuggestItem {
        SuggestItem {
            label: label.to_owned(),
            lat: 0.0,
            lon: 0.0,
            raw: Map::new(),
        }
    }

    #[test]
    fn short_text_never_dispatches() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("jl");
        assert_eq!(flow.debounce_elapsed(), None);
    }

    #[test]
    fn qualifying_text_dispatches_trimmed() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("  jalan joglo  ");
        assert_eq!(flow.debounce_elapsed().as_deref(), Some("jalan joglo"));
    }

    #[test]
    fn shrinking_below_threshold_closes_and_clears() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("joglo");
        flow.results_ready(vec![row("Joglo, Jakarta Barat")]);
        assert!(flow.is_open());

        flow.input_changed("jo");
        assert!(!flow.is_open());
        assert!(flow.list().is_empty());
    }

    #[test]
    fn empty_results_keep_the_dropdown_closed() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("joglo");
        flow.results_ready(Vec::new());
        assert!(!flow.is_open());
    }

    #[test]
    fn focus_restores_previous_results() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("joglo");
        flow.results_ready(vec![row("Joglo, Jakarta Barat")]);
        flow.close();
        assert!(!flow.is_open());

        flow.focus();
        assert!(flow.is_open());
        assert_eq!(flow.list().len(), 1);
    }

    #[test]
    fn highlight_clamps_at_both_ends() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("joglo");
        flow.results_ready(vec![row("a"), row("b")]);

        flow.move_up();
        assert_eq!(flow.highlighted(), Some(0));
        flow.move_down();
        flow.move_down();
        flow.move_down();
        assert_eq!(flow.highlighted(), Some(1));
    }

    #[test]
    fn commit_adopts_the_label_and_suppresses_one_dispatch() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("joglo");
        flow.results_ready(vec![row("Joglo, Kembangan, Jakarta Barat")]);
        flow.move_down();

        let picked = flow.commit(None);
        assert_eq!(
            picked.map(|item| item.label),
            Some("Joglo, Kembangan, Jakarta Barat".to_owned())
        );
        assert_eq!(flow.text(), "Joglo, Kembangan, Jakarta Barat");
        assert!(!flow.is_open());

        // The text-change caused by adopting the label must not search.
        assert_eq!(flow.debounce_elapsed(), None);
        assert_eq!(
            flow.debounce_elapsed().as_deref(),
            Some("Joglo, Kembangan, Jakarta Barat")
        );
    }

    #[test]
    fn commit_without_highlight_is_a_no_op() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("joglo");
        flow.results_ready(vec![row("a")]);
        assert_eq!(flow.commit(None), None);
        assert!(flow.is_open());
    }

    #[test]
    fn region_change_discards_stale_results() {
        let mut flow = SuggestionFlow::default();
        flow.input_changed("joglo");
        flow.results_ready(vec![row("a")]);

        flow.region_changed();
        assert!(!flow.is_open());
        flow.focus();
        assert!(!flow.is_open());
    }
}
