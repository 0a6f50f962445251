//! Restart loop running one watcher session after another

use crate::config::WatcherConfig;
use crate::error::WatcherError;
use crate::metrics::WatcherMetrics;
use crate::session::{SessionContext, SessionOutcome, WatcherSession};
use loftwatch_document::ProviderFactory;
use loftwatch_domain::MonitorTarget;
use loftwatch_extractor::Extractor;
use loftwatch_reporter::EventReporter;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

/// Background worker that keeps a watcher session running
///
/// Each iteration opens a fresh document provider, runs a
/// [`WatcherSession`] on it until the budget expires or the session fails,
/// and starts over. Nothing carries over between sessions except the
/// configuration, the reporter and the metrics.
///
/// # Examples
///
/// ```no_run
/// use loftwatch_document::HttpProviderFactory;
/// use loftwatch_domain::MonitorTarget;
/// use loftwatch_reporter::ReportingClient;
/// use loftwatch_watcher::{WatcherConfig, WatcherWorker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = WatcherConfig::default();
///     let target = MonitorTarget::new("https://live.myloft.ro/event/42").ok_or("bad URL")?;
///     let factory = HttpProviderFactory::new(config.poll_interval())?;
///     let reporter = ReportingClient::with_timeout(&config.base_url, config.request_timeout())?;
///
///     // Run indefinitely (until Ctrl+C)
///     let mut worker = WatcherWorker::new(config, target, factory, reporter)?;
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct WatcherWorker<F, R> {
    factory: F,
    ctx: SessionContext<R>,
    sessions_run: u64,
}

impl<F, R> WatcherWorker<F, R>
where
    F: ProviderFactory,
    R: EventReporter,
{
    /// Create a worker for `target`
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::Config`] if the configuration is invalid.
    pub fn new(config: WatcherConfig, target: MonitorTarget, factory: F, reporter: R) -> Result<Self, WatcherError> {
        config.validate()?;
        let extractor = Extractor::new(config.extractor.clone())?;

        Ok(Self {
            factory,
            ctx: SessionContext {
                target,
                config: Arc::new(config),
                extractor,
                reporter: Arc::new(reporter),
                metrics: Arc::new(WatcherMetrics::new()),
            },
            sessions_run: 0,
        })
    }

    /// Run sessions until a shutdown signal (Ctrl+C) is received
    ///
    /// # Errors
    ///
    /// Returns an error if a document provider cannot be opened.
    pub async fn run(&mut self) -> Result<(), WatcherError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run sessions until `signal` completes
    ///
    /// The session running when the signal arrives is stopped and torn down
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if a document provider cannot be opened.
    pub async fn run_until<S>(&mut self, signal: S) -> Result<(), WatcherError>
    where
        S: Future<Output = ()>,
    {
        info!(
            "Watcher started for {} (session budget: {:?})",
            self.ctx.target,
            self.ctx.config.session_budget()
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::pin!(signal);

        loop {
            let session = self.run_once(Some(stop_rx.clone()));
            tokio::pin!(session);

            let mut stopping = false;
            let result = tokio::select! {
                result = &mut session => result,
                _ = &mut signal => {
                    info!("Shutdown signal received, stopping watcher");
                    stopping = true;
                    let _ = stop_tx.send(true);
                    session.await
                }
            };
            result?;
            if stopping {
                break;
            }
        }

        info!("Watcher stopped. Final metrics:\n{}", self.metrics().summary());
        Ok(())
    }

    /// Run a fixed number of sessions (useful for testing)
    ///
    /// # Errors
    ///
    /// Returns an error if a document provider cannot be opened.
    pub async fn run_sessions(&mut self, count: usize) -> Result<Vec<SessionOutcome>, WatcherError> {
        let mut outcomes = Vec::with_capacity(count);
        for _ in 0..count {
            outcomes.push(self.run_once(None).await?);
        }

        info!("Watcher finished {} sessions. Final metrics:\n{}", count, self.metrics().summary());
        Ok(outcomes)
    }

    async fn run_once(&mut self, shutdown: Option<watch::Receiver<bool>>) -> Result<SessionOutcome, WatcherError> {
        self.sessions_run += 1;
        let id = self.sessions_run;

        let provider = self.factory.open().await?;
        let mut session = WatcherSession::new(id, self.ctx.clone(), provider);
        if let Some(shutdown) = &shutdown {
            session = session.with_shutdown(shutdown.clone());
        }
        let outcome = session.run().instrument(info_span!("session", id)).await;

        if shutdown.as_ref().is_some_and(|stop| *stop.borrow()) {
            return Ok(outcome);
        }

        match &outcome {
            SessionOutcome::Completed => info!("Restarting watcher..."),
            SessionOutcome::Failed(e) => {
                let backoff = self.ctx.config.failure_backoff();
                warn!("Session {} failed ({}), restarting in {:?}", id, e, backoff);
                tokio::time::sleep(backoff).await;
            }
        }

        Ok(outcome)
    }

    /// Sessions started so far
    pub fn sessions_run(&self) -> u64 {
        self.sessions_run
    }

    /// Shared metrics of every session
    pub fn metrics(&self) -> &WatcherMetrics {
        &self.ctx.metrics
    }

    /// Configuration in use
    pub fn config(&self) -> &WatcherConfig {
        &self.ctx.config
    }
}
