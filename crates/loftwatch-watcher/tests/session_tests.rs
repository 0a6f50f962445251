//! Integration tests for watcher sessions and the restart loop
//!
//! Time is paused, so settle delays, readiness timeouts and session budgets
//! elapse instantly.

use async_trait::async_trait;
use loftwatch_document::{
    ChangeKinds, DocumentError, DocumentProvider, DocumentView, MutationBatch, NodeContent, NodeSelector,
    ReadyPolicy, ScriptedFactory, ScriptedProvider,
};
use loftwatch_domain::MonitorTarget;
use loftwatch_extractor::Extractor;
use loftwatch_reporter::{MockReporter, TransportError};
use loftwatch_watcher::{
    Profile, SessionContext, SessionOutcome, WatcherConfig, WatcherError, WatcherMetrics, WatcherSession,
    WatcherWorker,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

const EVENT_URL: &str = "https://live.example.org/event/7";

fn event_page(arrivals: &str, value_attrs: &str) -> String {
    format!(
        r#"<html><body>
          <h3 class="Heading-3Left-Gray-100">National Derby</h3>
          <div class="v-list-item">
            <i class="fas fa-calendar"></i>
            <div class="v-list-item__subtitle TextLeft-Gray-85">13.11.2025 09:10:00 (GMT -6:00)</div>
          </div>
          <div class="v-list-item">
            <i class="fas fa-route"></i>
            <div class="v-list-item__subtitle TextLeft-Gray-85">412 km</div>
          </div>
          <div class="stats">
            <span class="TextLeft-Gray-70">Arrivals</span>
            <span class="ParagraphLeft-Gray-100-Bold" {}>{}</span>
          </div>
        </body></html>"#,
        value_attrs, arrivals
    )
}

fn basket_page(rows: &[&str]) -> String {
    let rows: String = rows.iter().map(|r| format!("<tr><td>{}</td></tr>", r)).collect();
    format!(
        r#"<table>
             <thead><tr><th><span>Fancier</span></th><th><span>Basket Time</span></th></tr></thead>
             <tbody>{}</tbody>
           </table>"#,
        rows
    )
}

/// Scripted page that changes right after an observer is installed
struct ChangesOnObserve {
    inner: ScriptedProvider,
    next_html: String,
}

#[async_trait]
impl DocumentProvider for ChangesOnObserve {
    async fn navigate(&mut self, url: &str, policy: ReadyPolicy) -> Result<(), DocumentError> {
        self.inner.navigate(url, policy).await
    }

    async fn evaluate<T, F>(&self, query: F) -> Result<T, DocumentError>
    where
        F: FnOnce(&DocumentView) -> T + Send,
        T: Send,
    {
        self.inner.evaluate(query).await
    }

    async fn observe(
        &mut self,
        selector: NodeSelector,
        kinds: ChangeKinds,
        callback: mpsc::Sender<MutationBatch>,
    ) -> Result<NodeContent, DocumentError> {
        let baseline = self.inner.observe(selector, kinds, callback).await?;
        self.inner.set_html(&self.next_html).await;
        Ok(baseline)
    }

    async fn close(&mut self) -> Result<(), DocumentError> {
        self.inner.close().await
    }
}

fn target() -> MonitorTarget {
    MonitorTarget::new(EVENT_URL).unwrap()
}

fn context(config: WatcherConfig, reporter: MockReporter, metrics: Arc<WatcherMetrics>) -> SessionContext<MockReporter> {
    SessionContext {
        target: target(),
        extractor: Extractor::new(config.extractor.clone()).unwrap(),
        config: Arc::new(config),
        reporter: Arc::new(reporter),
        metrics,
    }
}

#[tokio::test(start_paused = true)]
async fn test_initial_report_and_deltas() {
    let provider = ScriptedProvider::with_html(&event_page("40/85", ""));
    let factory = ScriptedFactory::new(provider.clone());
    let reporter = MockReporter::new();
    let mut worker = WatcherWorker::new(WatcherConfig::default(), target(), factory, reporter.clone()).unwrap();

    // Observation is attached ten seconds in, after both settle delays
    let page = provider.clone();
    let driver = tokio::spawn(async move {
        sleep(Duration::from_secs(20)).await;
        assert_eq!(page.observer_count().await, 1);
        assert_eq!(page.set_html(&event_page("41/85", "")).await, 1);

        sleep(Duration::from_secs(1)).await;
        // Attribute churn delivers a batch but leaves the text unchanged
        assert_eq!(page.set_html(&event_page("41/85", r#"data-tick="1""#)).await, 1);

        sleep(Duration::from_secs(1)).await;
        page.set_html(&event_page("42/85", r#"data-tick="1""#)).await;
    });

    let outcomes = worker.run_sessions(1).await.unwrap();
    driver.await.unwrap();

    assert!(outcomes[0].is_completed());

    let initial = reporter.initial_reports();
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].url, EVENT_URL);
    assert_eq!(initial[0].title.as_deref(), Some("National Derby"));
    assert_eq!(initial[0].date_time_utc.as_deref(), Some("13.11.2025 15:10:00"));
    assert_eq!(initial[0].distance_km, Some(412));
    assert_eq!(initial[0].location, None);
    assert_eq!(initial[0].total_count.as_deref(), Some("85"));

    assert_eq!(reporter.delta_values(), vec!["41/85", "42/85"]);
    assert_eq!(worker.metrics().changes_detected(), 2);
    assert_eq!(worker.metrics().reports_sent(), 3);
    assert_eq!(worker.metrics().sessions_completed(), 1);
    assert!(provider.is_closed().await);
}

#[tokio::test(start_paused = true)]
async fn test_change_right_after_observe_is_reported() {
    let inner = ScriptedProvider::with_html(&event_page("40/85", ""));
    let provider = ChangesOnObserve {
        inner: inner.clone(),
        next_html: event_page("41/85", ""),
    };
    let reporter = MockReporter::new();
    let metrics = Arc::new(WatcherMetrics::new());
    let session = WatcherSession::new(1, context(WatcherConfig::default(), reporter.clone(), Arc::clone(&metrics)), provider);

    let outcome = session.run().await;

    assert!(outcome.is_completed());
    assert_eq!(reporter.delta_values(), vec!["41/85"]);
    assert_eq!(metrics.changes_detected(), 1);
    assert!(inner.is_closed().await);
}

#[tokio::test(start_paused = true)]
async fn test_budget_ends_session_and_closes_provider() {
    let provider = ScriptedProvider::with_html(&event_page("40/85", ""));
    let factory = ScriptedFactory::new(provider.clone());
    let mut worker = WatcherWorker::new(WatcherConfig::default(), target(), factory.clone(), MockReporter::new()).unwrap();

    let start = Instant::now();
    let outcomes = worker.run_sessions(2).await.unwrap();

    assert!(outcomes.iter().all(SessionOutcome::is_completed));
    assert!(start.elapsed() >= Duration::from_secs(600));
    assert!(start.elapsed() < Duration::from_secs(620));
    assert_eq!(factory.opened(), 2);
    assert_eq!(provider.navigations().await, vec![EVENT_URL.to_string(), EVENT_URL.to_string()]);
    assert!(provider.is_closed().await);
    assert_eq!(provider.observer_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_budget_counts_time_spent_loading() {
    let provider = ScriptedProvider::with_html("<p>loading</p>");
    let config = WatcherConfig {
        session_budget_secs: 30,
        ..Default::default()
    };
    let metrics = Arc::new(WatcherMetrics::new());
    let reporter = MockReporter::new();
    let session = WatcherSession::new(1, context(config, reporter.clone(), Arc::clone(&metrics)), provider.clone());

    let start = Instant::now();
    let outcome = session.run().await;

    assert!(outcome.is_completed());
    assert!(start.elapsed() < Duration::from_secs(31));
    assert_eq!(reporter.attempts(), 0);
    assert!(provider.is_closed().await);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeout_skips_extraction() {
    let provider = ScriptedProvider::with_html("<p>loading</p>");
    let factory = ScriptedFactory::new(provider.clone());
    let reporter = MockReporter::new();
    let mut worker = WatcherWorker::new(WatcherConfig::default(), target(), factory, reporter.clone()).unwrap();

    let start = Instant::now();
    let outcomes = worker.run_sessions(1).await.unwrap();

    assert!(matches!(
        outcomes[0].error(),
        Some(WatcherError::ReadinessTimeout(t)) if *t == Duration::from_secs(60)
    ));
    // Post-load settle, readiness timeout, then the failure backoff
    assert!(start.elapsed() >= Duration::from_secs(70));
    assert!(start.elapsed() < Duration::from_secs(72));
    assert_eq!(reporter.attempts(), 0);
    assert_eq!(worker.metrics().sessions_failed(), 1);
    assert!(provider.is_closed().await);
}

#[tokio::test(start_paused = true)]
async fn test_missing_arrivals_value_restarts() {
    // Label present, but its sibling lacks the value marker class
    let provider = ScriptedProvider::with_html(
        r#"<span class="TextLeft-Gray-70">Arrivals</span><span class="Paragraph-Other">40/85</span>"#,
    );
    let factory = ScriptedFactory::new(provider.clone());
    let reporter = MockReporter::new();
    let mut worker = WatcherWorker::new(WatcherConfig::default(), target(), factory.clone(), reporter.clone()).unwrap();

    let outcomes = worker.run_sessions(2).await.unwrap();

    for outcome in &outcomes {
        assert!(matches!(outcome.error(), Some(WatcherError::ExtractionFieldMissing(f)) if f == "Arrivals"));
    }
    assert_eq!(factory.opened(), 2);
    assert_eq!(worker.sessions_run(), 2);
    assert_eq!(reporter.attempts(), 0);
    assert_eq!(provider.observer_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_reporter_does_not_block_detection() {
    let provider = ScriptedProvider::with_html(&event_page("40/85", ""));
    let reporter = MockReporter::new().with_delay(Duration::from_secs(30));
    let metrics = Arc::new(WatcherMetrics::new());
    let session = WatcherSession::new(
        1,
        context(WatcherConfig::default(), reporter.clone(), Arc::clone(&metrics)),
        provider.clone(),
    );

    let page = provider.clone();
    let observed = Arc::clone(&metrics);
    let watcher = reporter.clone();
    let driver = tokio::spawn(async move {
        sleep(Duration::from_secs(20)).await;
        for value in ["41/85", "42/85", "43/85"] {
            page.set_html(&event_page(value, "")).await;
            sleep(Duration::from_millis(100)).await;
        }
        // The initial report is still in flight, yet every change was seen
        assert_eq!(observed.changes_detected(), 3);
        assert!(watcher.delta_values().is_empty());
    });

    let outcome = session.run().await;
    driver.await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(reporter.delta_values(), vec!["41/85", "42/85", "43/85"]);
    assert_eq!(metrics.reports_dropped(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failures_do_not_end_session() {
    let provider = ScriptedProvider::with_html(&event_page("40/85", ""));
    let reporter = MockReporter::failing(TransportError::Status(503));
    let metrics = Arc::new(WatcherMetrics::new());
    let session = WatcherSession::new(
        1,
        context(WatcherConfig::default(), reporter.clone(), Arc::clone(&metrics)),
        provider.clone(),
    );

    let page = provider.clone();
    let driver = tokio::spawn(async move {
        sleep(Duration::from_secs(20)).await;
        page.set_html(&event_page("41/85", "")).await;
    });

    let outcome = session.run().await;
    driver.await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(reporter.attempts(), 2);
    assert_eq!(metrics.reports_failed(), 2);
    assert_eq!(metrics.changes_detected(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_baskets_profile_clicks_header_and_logs_events() {
    let provider = ScriptedProvider::with_html(&basket_page(&["Ion 12:01"]));
    let reporter = MockReporter::new();
    let metrics = Arc::new(WatcherMetrics::new());
    let config = WatcherConfig {
        profile: Profile::Baskets,
        ..Default::default()
    };
    let session = WatcherSession::new(1, context(config, reporter.clone(), Arc::clone(&metrics)), provider.clone());

    let page = provider.clone();
    let driver = tokio::spawn(async move {
        sleep(Duration::from_secs(20)).await;
        page.set_html(&basket_page(&["Ion 12:01", "Maria 12:03"])).await;
    });

    let outcome = session.run().await;
    driver.await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(provider.clicks().await.len(), 1);
    assert_eq!(provider.clicks().await[0].to_string(), "th > span[\"Basket Time\"]");
    assert_eq!(metrics.changes_detected(), 1);
    assert_eq!(reporter.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_table_body_attributes_are_not_basket_events() {
    let provider = ScriptedProvider::with_html(&basket_page(&["Ion 12:01"]));
    let metrics = Arc::new(WatcherMetrics::new());
    let config = WatcherConfig {
        profile: Profile::Baskets,
        ..Default::default()
    };
    let session = WatcherSession::new(1, context(config, MockReporter::new(), Arc::clone(&metrics)), provider.clone());

    let page = provider.clone();
    let driver = tokio::spawn(async move {
        sleep(Duration::from_secs(20)).await;
        // Sorting restyles the body; the rows stay the same
        let sorted = basket_page(&["Ion 12:01"]).replace("<tbody>", r#"<tbody class="sorted">"#);
        assert_eq!(page.set_html(&sorted).await, 1);

        sleep(Duration::from_secs(1)).await;
        let sorted = basket_page(&["Ion 12:01", "Maria 12:03"]).replace("<tbody>", r#"<tbody class="sorted">"#);
        page.set_html(&sorted).await;
    });

    let outcome = session.run().await;
    driver.await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(metrics.changes_detected(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_signal_tears_down_running_session() {
    let provider = ScriptedProvider::with_html(&event_page("40/85", ""));
    let factory = ScriptedFactory::new(provider.clone());
    let reporter = MockReporter::new();
    let mut worker = WatcherWorker::new(WatcherConfig::default(), target(), factory.clone(), reporter.clone()).unwrap();

    let start = Instant::now();
    worker.run_until(sleep(Duration::from_secs(20))).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(factory.opened(), 1);
    assert_eq!(worker.sessions_run(), 1);
    assert_eq!(worker.metrics().sessions_completed(), 1);
    assert_eq!(reporter.initial_reports().len(), 1);
    assert!(provider.is_closed().await);
    assert_eq!(provider.observer_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_failure_is_a_session_failure() {
    let provider = ScriptedProvider::with_html(&event_page("40/85", ""));
    provider.fail_navigation(true).await;
    let factory = ScriptedFactory::new(provider.clone());
    let mut worker = WatcherWorker::new(WatcherConfig::default(), target(), factory, MockReporter::new()).unwrap();

    let outcomes = worker.run_sessions(1).await.unwrap();

    assert!(matches!(
        outcomes[0].error(),
        Some(WatcherError::Provider(DocumentError::Navigation(_)))
    ));
    assert!(provider.is_closed().await);
}

#[tokio::test]
async fn test_provider_launch_failure_is_fatal() {
    let mut worker =
        WatcherWorker::new(WatcherConfig::default(), target(), ScriptedFactory::failing(), MockReporter::new()).unwrap();

    let result = worker.run_sessions(3).await;
    assert!(matches!(result, Err(WatcherError::Provider(DocumentError::Launch(_)))));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = WatcherConfig {
        report_queue_capacity: 0,
        ..Default::default()
    };
    let result = WatcherWorker::new(config, target(), ScriptedFactory::default(), MockReporter::new());
    assert!(matches!(result, Err(WatcherError::Config(_))));
}
