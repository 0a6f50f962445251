//! One watcher session: load, extract, report, observe, tear down

use crate::config::{Profile, WatcherConfig};
use crate::detector::ChangeDetector;
use crate::dispatcher::{OutboundReport, ReportDispatcher};
use crate::error::WatcherError;
use crate::metrics::WatcherMetrics;
use crate::readiness::{wait_until_ready, ReadinessPredicate};
use loftwatch_document::{ChangeKinds, DocumentError, DocumentProvider, MutationBatch, NodeSelector, ReadyPolicy};
use loftwatch_domain::{MonitorTarget, SessionLifecycle};
use loftwatch_extractor::{normalize_snapshot, Extractor};
use loftwatch_reporter::EventReporter;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, error, info, warn};

/// Header text of the basket table column clicked before observing
pub const BASKET_TIME_HEADER: &str = "Basket Time";

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// The session budget expired
    Completed,
    /// The session stopped early
    Failed(WatcherError),
}

impl SessionOutcome {
    /// Whether the session ran out its budget
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed)
    }

    /// The error that ended the session, if any
    pub fn error(&self) -> Option<&WatcherError> {
        match self {
            SessionOutcome::Completed => None,
            SessionOutcome::Failed(e) => Some(e),
        }
    }
}

/// Everything a session needs besides its document provider
///
/// Shared by all sessions of one worker; no per-field state lives here.
pub struct SessionContext<R> {
    /// Watched page
    pub target: MonitorTarget,
    /// Timeouts, delays and profile
    pub config: Arc<WatcherConfig>,
    /// Field reader for the event page
    pub extractor: Extractor,
    /// Report destination
    pub reporter: Arc<R>,
    /// Shared counters
    pub metrics: Arc<WatcherMetrics>,
}

impl<R> Clone for SessionContext<R> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            config: Arc::clone(&self.config),
            extractor: self.extractor.clone(),
            reporter: Arc::clone(&self.reporter),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// A single pass over the page, holding its document provider exclusively
///
/// The session starts in [`SessionLifecycle::Initializing`] and always ends
/// in [`SessionLifecycle::Terminated`] with the provider closed, whatever
/// the outcome.
pub struct WatcherSession<P, R> {
    id: u64,
    ctx: SessionContext<R>,
    provider: P,
    lifecycle: SessionLifecycle,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<P, R> WatcherSession<P, R>
where
    P: DocumentProvider,
    R: EventReporter,
{
    /// Create a session taking ownership of `provider`
    pub fn new(id: u64, ctx: SessionContext<R>, provider: P) -> Self {
        Self {
            id,
            ctx,
            provider,
            lifecycle: SessionLifecycle::Initializing,
            shutdown: None,
        }
    }

    /// End the session early once `shutdown` turns `true`
    ///
    /// A stopped session still tears down: the provider is closed and queued
    /// reports get their grace period.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Session number within its worker
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle stage
    pub fn lifecycle(&self) -> SessionLifecycle {
        self.lifecycle
    }

    /// Run until the budget expires or the session fails
    ///
    /// The budget is measured from the call, so time spent loading the page
    /// counts against it.
    pub async fn run(mut self) -> SessionOutcome {
        let config = Arc::clone(&self.ctx.config);
        let deadline = Instant::now() + config.session_budget();
        self.ctx.metrics.record_session_started();
        info!(
            "Session {} watching {} (profile: {}, budget: {:?})",
            self.id,
            self.ctx.target,
            config.profile,
            config.session_budget()
        );

        let dispatcher = ReportDispatcher::spawn(
            Arc::clone(&self.ctx.reporter),
            config.report_queue_capacity,
            Arc::clone(&self.ctx.metrics),
        );

        let id = self.id;
        let stop = shutdown_requested(self.shutdown.clone());
        let result = tokio::select! {
            result = timeout_at(deadline, self.drive(&dispatcher)) => result,
            _ = stop => {
                info!("Session {} stopping on shutdown", id);
                Ok(Ok(()))
            }
        };
        let outcome = match result {
            Err(_) => {
                info!("Session {} budget expired", self.id);
                SessionOutcome::Completed
            }
            Ok(Ok(())) => SessionOutcome::Completed,
            Ok(Err(e)) => {
                error!("Session {} failed while {}: {}", self.id, self.lifecycle, e);
                SessionOutcome::Failed(e)
            }
        };

        self.teardown(dispatcher).await;

        if outcome.is_completed() {
            self.ctx.metrics.record_session_completed();
        } else {
            self.ctx.metrics.record_session_failed();
        }
        outcome
    }

    fn transition(&mut self, next: SessionLifecycle) -> Result<(), WatcherError> {
        self.lifecycle.transition(next)?;
        debug!(session = self.id, state = %next, "Lifecycle transition");
        Ok(())
    }

    fn readiness_predicate(&self) -> ReadinessPredicate {
        match self.ctx.config.profile {
            Profile::Arrivals => ReadinessPredicate::LabelPresent {
                label_class: self.ctx.extractor.config().label_class.clone(),
                label_text: self.ctx.extractor.config().arrivals_label.clone(),
            },
            Profile::Baskets => ReadinessPredicate::TableRows,
        }
    }

    async fn drive(&mut self, dispatcher: &ReportDispatcher) -> Result<(), WatcherError> {
        let config = Arc::clone(&self.ctx.config);

        info!("Navigating to {}...", self.ctx.target);
        self.provider
            .navigate(self.ctx.target.url(), ReadyPolicy::NetworkIdle)
            .await?;

        debug!("Waiting {:?} after page load", config.post_load_settle());
        sleep(config.post_load_settle()).await;

        let predicate = self.readiness_predicate();
        wait_until_ready(
            &self.provider,
            &predicate,
            config.readiness_timeout(),
            config.readiness_poll_interval(),
        )
        .await?;
        self.transition(SessionLifecycle::Ready)?;
        info!("Page ready ({})", predicate);

        match config.profile {
            Profile::Arrivals => self.watch_arrivals(dispatcher).await,
            Profile::Baskets => self.watch_baskets().await,
        }
    }

    async fn watch_arrivals(&mut self, dispatcher: &ReportDispatcher) -> Result<(), WatcherError> {
        let config = Arc::clone(&self.ctx.config);
        let extractor = &self.ctx.extractor;

        let snapshot = self.provider.evaluate(|doc| extractor.extract_record(doc)).await?;
        extractor.require_arrivals(&snapshot)?;

        let report = normalize_snapshot(&self.ctx.target, &snapshot);
        info!(
            "Extracted: title={:?}, date/time (UTC)={:?}, distance={:?}, location={:?}, total={:?}",
            report.title, report.date_time_utc, report.distance_km, report.location, report.total_count
        );
        dispatcher.enqueue(OutboundReport::Initial(report));

        sleep(config.pre_observe_settle()).await;

        let selector = self.ctx.extractor.arrivals_selector();
        let (callback, mut batches) = mpsc::channel(config.mutation_channel_capacity);
        let baseline = match self.provider.observe(selector.clone(), ChangeKinds::ALL, callback).await {
            Ok(content) => content,
            Err(DocumentError::NodeNotFound(_)) => {
                return Err(WatcherError::ExtractionFieldMissing(
                    self.ctx.extractor.config().arrivals_label.clone(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        // Batches are diffed against the state read when the observer was installed
        let current = baseline.text.trim();
        self.transition(SessionLifecycle::Observing)?;
        info!("Watching {} for changes from {}", selector, current);

        let mut detector = ChangeDetector::new(current);
        while let Some(batch) = batches.recv().await {
            self.on_arrivals_batch(&mut detector, &batch, dispatcher);
        }

        Err(WatcherError::ObservationClosed)
    }

    fn on_arrivals_batch(&self, detector: &mut ChangeDetector, batch: &MutationBatch, dispatcher: &ReportDispatcher) {
        debug!("Mutation batch with {} records", batch.len());
        if let Some(delta) = detector.process(batch) {
            self.ctx.metrics.record_change();
            info!("Arrivals changed: {}", delta.value);
            dispatcher.enqueue(OutboundReport::Delta(delta));
        }
    }

    async fn watch_baskets(&mut self) -> Result<(), WatcherError> {
        let config = Arc::clone(&self.ctx.config);

        let header = NodeSelector::WithInnerText {
            tag: "th".to_string(),
            inner_tag: "span".to_string(),
            text: BASKET_TIME_HEADER.to_string(),
        };
        match self.provider.click(&header).await {
            Ok(true) => info!("Clicked \"{}\" header", BASKET_TIME_HEADER),
            Ok(false) => debug!("Provider cannot interact with the page, header not clicked"),
            Err(DocumentError::NodeNotFound(_)) => warn!("Could not find \"{}\" header", BASKET_TIME_HEADER),
            Err(e) => return Err(e.into()),
        }

        sleep(config.pre_observe_settle()).await;

        let (callback, mut batches) = mpsc::channel(config.mutation_channel_capacity);
        let baseline = self
            .provider
            .observe(NodeSelector::FirstTag("tbody".to_string()), ChangeKinds::ALL, callback)
            .await?;
        self.transition(SessionLifecycle::Observing)?;
        info!("Watching for table changes");

        let mut last_rows = baseline.inner_html;
        while let Some(batch) = batches.recv().await {
            if self.on_basket_batch(&mut last_rows, &batch) {
                self.ctx.metrics.record_change();
                info!("new basket event");
            }
        }

        Err(WatcherError::ObservationClosed)
    }

    /// Whether the table body's rows differ from the last seen ones
    ///
    /// Attribute changes on the table body itself do not count.
    fn on_basket_batch(&self, last_rows: &mut String, batch: &MutationBatch) -> bool {
        debug!("Table mutation batch with {} records", batch.len());
        match batch.inner_html.as_deref() {
            Some(rows) if rows != last_rows.as_str() => {
                *last_rows = rows.to_string();
                true
            }
            _ => false,
        }
    }

    async fn teardown(&mut self, dispatcher: ReportDispatcher) {
        if let Err(e) = self.transition(SessionLifecycle::Restarting) {
            warn!("{}", e);
        }

        if let Err(e) = self.provider.close().await {
            warn!("Failed to close document provider: {}", e);
        }
        dispatcher.shutdown(self.ctx.config.request_timeout()).await;

        if let Err(e) = self.transition(SessionLifecycle::Terminated) {
            warn!("{}", e);
        }
        debug!("Session {} terminated", self.id);
    }
}

async fn shutdown_requested(shutdown: Option<watch::Receiver<bool>>) {
    if let Some(mut shutdown) = shutdown {
        if shutdown.wait_for(|stop| *stop).await.is_ok() {
            return;
        }
    }
    // No signal source, or its sender is gone: never stop
    std::future::pending::<()>().await
}
