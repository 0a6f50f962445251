//! Raw field values read from a document snapshot

/// Raw text of every catalogued field, as found in one document snapshot
///
/// Produced fresh by each extraction call and never mutated afterwards.
/// A `None` field means its label or value node was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSnapshot {
    /// Event title
    pub title: Option<String>,

    /// Date/time with zone, e.g. `13.11.2025 09:10:00 (GMT -6:00)`
    pub raw_date_time: Option<String>,

    /// Distance text, e.g. `412 km`
    pub raw_distance: Option<String>,

    /// Release location
    pub location: Option<String>,

    /// Arrivals counter text, e.g. `40/85`
    pub arrivals_raw: Option<String>,
}

impl ExtractedSnapshot {
    /// Names of the fields that were not found
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push("title");
        }
        if self.raw_date_time.is_none() {
            missing.push("date_time");
        }
        if self.raw_distance.is_none() {
            missing.push("distance");
        }
        if self.location.is_none() {
            missing.push("location");
        }
        if self.arrivals_raw.is_none() {
            missing.push("arrivals");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields() {
        let snapshot = ExtractedSnapshot {
            title: Some("Derby".to_string()),
            location: Some("Sibiu".to_string()),
            ..Default::default()
        };
        assert_eq!(snapshot.missing_fields(), vec!["date_time", "distance", "arrivals"]);
        assert!(ExtractedSnapshot::default().missing_fields().len() == 5);
    }
}
