//! Last-seen state of a watched field

/// Last observed text of one watched field
///
/// A change is reported if and only if the current text differs from
/// `last_seen_text`, and the stored text is replaced in the same call that
/// reports the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFieldState {
    last_seen_text: String,
}

impl WatchedFieldState {
    /// Start tracking from an initial text
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            last_seen_text: initial.into(),
        }
    }

    /// The last confirmed text
    pub fn last_seen_text(&self) -> &str {
        &self.last_seen_text
    }

    /// Compare `current` with the last seen text
    ///
    /// Returns the new text when it differs, after recording it. Returns
    /// `None` and leaves the state untouched otherwise.
    pub fn observe(&mut self, current: &str) -> Option<String> {
        if current == self.last_seen_text {
            return None;
        }
        self.last_seen_text = current.to_string();
        Some(self.last_seen_text.clone())
    }
}
