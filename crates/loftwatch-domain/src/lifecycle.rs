//! Lifecycle stages of a watcher session

use std::fmt;

/// Stage of a single watcher session
///
/// A session moves forward through these stages and never back:
/// - Initializing: navigating and waiting for readiness
/// - Ready: content loaded, initial extraction and report
/// - Observing: change detection attached
/// - Restarting: tearing down the document provider
/// - Terminated: provider disposed, session finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionLifecycle {
    /// Navigating and waiting for readiness
    Initializing,

    /// Content loaded, extracting the initial snapshot
    Ready,

    /// Watching for changes until the budget expires
    Observing,

    /// Disposing of the document provider
    Restarting,

    /// Session finished
    Terminated,
}

/// Rejected lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleError {
    /// Stage the session was in
    pub from: SessionLifecycle,
    /// Stage that was requested
    pub to: SessionLifecycle,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid lifecycle transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for LifecycleError {}

impl SessionLifecycle {
    /// Get the stage name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionLifecycle::Initializing => "initializing",
            SessionLifecycle::Ready => "ready",
            SessionLifecycle::Observing => "observing",
            SessionLifecycle::Restarting => "restarting",
            SessionLifecycle::Terminated => "terminated",
        }
    }

    /// Whether the session may move from `self` to `next`
    pub fn can_transition_to(&self, next: SessionLifecycle) -> bool {
        use SessionLifecycle::*;
        matches!(
            (self, next),
            (Initializing, Ready)
                | (Ready, Observing)
                | (Initializing, Restarting)
                | (Ready, Restarting)
                | (Observing, Restarting)
                | (Restarting, Terminated)
        )
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: SessionLifecycle) -> Result<(), LifecycleError> {
        if !self.can_transition_to(next) {
            return Err(LifecycleError { from: *self, to: next });
        }
        *self = next;
        Ok(())
    }

    /// Whether the session has finished
    pub fn is_terminal(&self) -> bool {
        *self == SessionLifecycle::Terminated
    }
}

impl fmt::Display for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut stage = SessionLifecycle::Initializing;
        stage.transition(SessionLifecycle::Ready).unwrap();
        stage.transition(SessionLifecycle::Observing).unwrap();
        stage.transition(SessionLifecycle::Restarting).unwrap();
        stage.transition(SessionLifecycle::Terminated).unwrap();
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_failure_paths_restart() {
        assert!(SessionLifecycle::Initializing.can_transition_to(SessionLifecycle::Restarting));
        assert!(SessionLifecycle::Ready.can_transition_to(SessionLifecycle::Restarting));
    }

    #[test]
    fn test_rejects_backwards_moves() {
        let mut stage = SessionLifecycle::Observing;
        let err = stage.transition(SessionLifecycle::Ready).unwrap_err();
        assert_eq!(err.from, SessionLifecycle::Observing);
        assert_eq!(stage, SessionLifecycle::Observing);
        assert!(!SessionLifecycle::Terminated.can_transition_to(SessionLifecycle::Initializing));
        assert!(!SessionLifecycle::Initializing.can_transition_to(SessionLifecycle::Observing));
    }
}
