//! Configuration for the Extractor
//!
//! Class names and labels identifying each field on the event page.

use serde::{Deserialize, Serialize};

/// Field catalogue used by the [`crate::Extractor`]
///
/// Defaults match the event pages of the monitored site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Class of the event title node
    pub title_class: String,

    /// Class of the list items carrying icon fields
    pub list_item_class: String,

    /// Class shared by every icon node
    pub icon_class: String,

    /// Classes the subtitle (value) node of a list item must all carry
    pub subtitle_classes: Vec<String>,

    /// Icon class marking the date/time field
    pub date_time_icon: String,

    /// Icon class marking the distance field
    pub distance_icon: String,

    /// Icon class marking the location field
    pub location_icon: String,

    /// Class shared by label nodes
    pub label_class: String,

    /// Marker class the value node next to a label must carry
    pub value_class: String,

    /// Label text of the arrivals counter
    pub arrivals_label: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            title_class: "Heading-3Left-Gray-100".to_string(),
            list_item_class: "v-list-item".to_string(),
            icon_class: "fas".to_string(),
            subtitle_classes: vec![
                "v-list-item__subtitle".to_string(),
                "TextLeft-Gray-85".to_string(),
            ],
            date_time_icon: "fa-calendar".to_string(),
            distance_icon: "fa-route".to_string(),
            location_icon: "fa-map-marked".to_string(),
            label_class: "TextLeft-Gray-70".to_string(),
            value_class: "ParagraphLeft-Gray-100-Bold".to_string(),
            arrivals_label: "Arrivals".to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("title_class", &self.title_class),
            ("list_item_class", &self.list_item_class),
            ("icon_class", &self.icon_class),
            ("date_time_icon", &self.date_time_icon),
            ("distance_icon", &self.distance_icon),
            ("location_icon", &self.location_icon),
            ("label_class", &self.label_class),
            ("value_class", &self.value_class),
            ("arrivals_label", &self.arrivals_label),
        ];
        for (name, value) in named {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }
        if self.subtitle_classes.is_empty() {
            return Err("subtitle_classes must name at least one class".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str)
            .map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
