//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use loftwatch_document::{DocumentView, NodeSelector};
use loftwatch_domain::ExtractedSnapshot;
use tracing::debug;

/// Reads the catalogued fields out of a document snapshot
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Create an Extractor
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] if the catalogue is invalid.
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self { config })
    }

    /// The field catalogue in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Read every catalogued field
    ///
    /// Missing fields are `None`; the call never fails and does not modify
    /// the document, so repeated calls on an unchanged document return equal
    /// snapshots.
    pub fn extract_record(&self, doc: &DocumentView) -> ExtractedSnapshot {
        let mut snapshot = ExtractedSnapshot {
            title: doc
                .first_by_class(&self.config.title_class)
                .map(|id| doc.trimmed_text(id)),
            arrivals_raw: self.extract_labeled_value(doc, &self.config.arrivals_label),
            ..Default::default()
        };

        let subtitle_classes: Vec<&str> = self.config.subtitle_classes.iter().map(String::as_str).collect();

        for item in doc.find_by_class(&self.config.list_item_class) {
            let Some(icon) = doc.first_within_with_classes(item, &[self.config.icon_class.as_str()]) else {
                continue;
            };
            let Some(subtitle) = doc.first_within_with_classes(item, &subtitle_classes) else {
                continue;
            };
            let text = doc.trimmed_text(subtitle);

            // A later item carrying the same icon overrides an earlier one
            if doc.has_class(icon, &self.config.date_time_icon) {
                snapshot.raw_date_time = Some(text);
            } else if doc.has_class(icon, &self.config.distance_icon) {
                snapshot.raw_distance = Some(text);
            } else if doc.has_class(icon, &self.config.location_icon) {
                snapshot.location = Some(text);
            }
        }

        let missing = snapshot.missing_fields();
        if !missing.is_empty() {
            debug!("Fields not found: {}", missing.join(", "));
        }

        snapshot
    }

    /// Trimmed text of the value node next to the label `label_text`
    ///
    /// Returns `None` when no label node has exactly that trimmed text, or
    /// when the label's next element sibling lacks the value marker class.
    pub fn extract_labeled_value(&self, doc: &DocumentView, label_text: &str) -> Option<String> {
        doc.labeled_value(&self.config.label_class, label_text, &self.config.value_class)
            .map(|id| doc.trimmed_text(id))
    }

    /// Selector of the value node next to `label_text`
    pub fn labeled_value_selector(&self, label_text: &str) -> NodeSelector {
        NodeSelector::labeled_value(
            self.config.label_class.clone(),
            label_text,
            self.config.value_class.clone(),
        )
    }

    /// Selector of the arrivals counter value node
    pub fn arrivals_selector(&self) -> NodeSelector {
        self.labeled_value_selector(&self.config.arrivals_label)
    }

    /// Whether the arrivals label is present, regardless of its value node
    pub fn has_arrivals_label(&self, doc: &DocumentView) -> bool {
        doc.find_by_class(&self.config.label_class)
            .into_iter()
            .any(|id| doc.trimmed_text(id) == self.config.arrivals_label)
    }

    /// The arrivals counter text, which the watcher cannot run without
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::FieldMissing`] when the snapshot has no
    /// arrivals value.
    pub fn require_arrivals<'a>(&self, snapshot: &'a ExtractedSnapshot) -> Result<&'a str, ExtractorError> {
        snapshot
            .arrivals_raw
            .as_deref()
            .ok_or_else(|| ExtractorError::FieldMissing(self.config.arrivals_label.clone()))
    }
}
