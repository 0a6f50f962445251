//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{normalize_snapshot, Extractor, ExtractorConfig, ExtractorError};
    use loftwatch_document::DocumentView;
    use loftwatch_domain::{ExtractedSnapshot, MonitorTarget};

    const EVENT_PAGE: &str = r#"
        <html><body>
          <div class="v-card">
            <h3 class="Heading-3Left-Gray-100">  National Derby 2025 </h3>
            <div class="v-list">
              <div class="v-list-item">
                <i class="fas fa-calendar"></i>
                <div class="v-list-item__content">
                  <div class="v-list-item__subtitle TextLeft-Gray-85"> 13.11.2025 09:10:00 (GMT -6:00) </div>
                </div>
              </div>
              <div class="v-list-item">
                <i class="fas fa-route"></i>
                <div class="v-list-item__subtitle TextLeft-Gray-85">412 km</div>
              </div>
              <div class="v-list-item">
                <i class="fas fa-map-marked"></i>
                <div class="v-list-item__subtitle TextLeft-Gray-85">Sibiu</div>
              </div>
              <div class="v-list-item">
                <div class="v-list-item__subtitle TextLeft-Gray-85">no icon here</div>
              </div>
            </div>
            <div class="stats">
              <span class="TextLeft-Gray-70">Arrivals</span>
              <span class="ParagraphLeft-Gray-100-Bold">40/85</span>
            </div>
          </div>
        </body></html>
    "#;

    fn target() -> MonitorTarget {
        MonitorTarget::new("https://live.example.org/event/7").unwrap()
    }

    #[test]
    fn test_full_extraction_flow() {
        let doc = DocumentView::parse_html(EVENT_PAGE);
        let extractor = Extractor::default();

        let snapshot = extractor.extract_record(&doc);
        assert_eq!(
            snapshot,
            ExtractedSnapshot {
                title: Some("National Derby 2025".to_string()),
                raw_date_time: Some("13.11.2025 09:10:00 (GMT -6:00)".to_string()),
                raw_distance: Some("412 km".to_string()),
                location: Some("Sibiu".to_string()),
                arrivals_raw: Some("40/85".to_string()),
            }
        );

        let report = normalize_snapshot(&target(), &snapshot);
        assert_eq!(report.url, "https://live.example.org/event/7");
        assert_eq!(report.title.as_deref(), Some("National Derby 2025"));
        assert_eq!(report.date_time_utc.as_deref(), Some("13.11.2025 15:10:00"));
        assert_eq!(report.distance_km, Some(412));
        assert_eq!(report.location.as_deref(), Some("Sibiu"));
        assert_eq!(report.total_count.as_deref(), Some("85"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let doc = DocumentView::parse_html(EVENT_PAGE);
        let extractor = Extractor::default();
        assert_eq!(extractor.extract_record(&doc), extractor.extract_record(&doc));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let doc = DocumentView::parse_html(
            r#"<div class="v-list-item"><i class="fas fa-route"></i></div>"#,
        );
        let snapshot = Extractor::default().extract_record(&doc);
        assert_eq!(snapshot, ExtractedSnapshot::default());

        let report = normalize_snapshot(&target(), &snapshot);
        assert_eq!(report.distance_km, None);
        assert_eq!(report.total_count, None);
    }

    #[test]
    fn test_value_without_marker_class_is_ignored() {
        let doc = DocumentView::parse_html(
            r#"<span class="TextLeft-Gray-70">Arrivals</span><span class="Paragraph-Other">40/85</span>"#,
        );
        let extractor = Extractor::default();
        assert_eq!(extractor.extract_labeled_value(&doc, "Arrivals"), None);
        assert!(extractor.has_arrivals_label(&doc));

        let snapshot = extractor.extract_record(&doc);
        let err = extractor.require_arrivals(&snapshot).unwrap_err();
        assert!(matches!(err, ExtractorError::FieldMissing(label) if label == "Arrivals"));
    }

    #[test]
    fn test_label_match_is_exact_after_trim() {
        let doc = DocumentView::parse_html(
            r#"<span class="TextLeft-Gray-70">Arrivals so far</span><span class="ParagraphLeft-Gray-100-Bold">1/2</span>
               <span class="TextLeft-Gray-70">  Arrivals  </span><span class="ParagraphLeft-Gray-100-Bold"> 3/4 </span>"#,
        );
        let extractor = Extractor::default();
        assert_eq!(extractor.extract_labeled_value(&doc, "Arrivals").as_deref(), Some("3/4"));
    }

    #[test]
    fn test_unparseable_values_are_reported_absent() {
        let snapshot = ExtractedSnapshot {
            title: Some("Derby".to_string()),
            raw_date_time: Some("tomorrow morning".to_string()),
            raw_distance: Some("unknown".to_string()),
            location: None,
            arrivals_raw: Some("40".to_string()),
        };
        let report = normalize_snapshot(&target(), &snapshot);
        assert_eq!(report.date_time_utc, None);
        assert_eq!(report.distance_km, Some(0));
        assert_eq!(report.total_count, None);
        assert_eq!(report.title.as_deref(), Some("Derby"));
    }

    #[test]
    fn test_custom_catalogue() {
        let config = ExtractorConfig {
            label_class: "lbl".to_string(),
            value_class: "val".to_string(),
            arrivals_label: "Sosiri".to_string(),
            ..Default::default()
        };
        let extractor = Extractor::new(config).unwrap();
        let doc = DocumentView::parse_html(r#"<b class="lbl">Sosiri</b><b class="val">5/9</b>"#);
        assert_eq!(extractor.extract_record(&doc).arrivals_raw.as_deref(), Some("5/9"));
        assert_eq!(extractor.arrivals_selector().resolve(&doc).map(|id| doc.trimmed_text(id)).as_deref(), Some("5/9"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractorConfig {
            subtitle_classes: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(Extractor::new(config), Err(ExtractorError::Config(_))));
    }
}
