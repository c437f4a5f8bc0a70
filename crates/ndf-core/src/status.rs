//! Inherited-status chaining.
//!
//! A chain of operations where an earlier step may already have failed
//! must not overwrite the original diagnostic or report twice. Every
//! step is therefore guarded: once a failure is recorded, later steps
//! are skipped and the first failure is what the chain reports.

use crate::error::NdfError;

/// The outcome of a step that returns nothing on success.
pub type Status = Result<(), NdfError>;

/// Run `op` only if `prior` is `Ok`; otherwise return the prior error
/// unchanged without doing any work.
pub fn inherit<T>(prior: &Status, op: impl FnOnce() -> Result<T, NdfError>) -> Result<T, NdfError> {
    match prior {
        Ok(()) => op(),
        Err(e) => Err(e.clone()),
    }
}

/// Runs a sequence of fallible steps, stopping at the first failure.
///
/// ```
/// use ndf_core::{NdfError, StatusChain};
///
/// let mut chain = StatusChain::new();
/// let a = chain.step(|| Ok::<_, NdfError>(1));
/// let b = chain.step(|| Err::<i32, _>(NdfError::NotFound { what: "x".into() }));
/// let c = chain.step(|| Ok::<_, NdfError>(3));
/// assert_eq!((a, b, c), (Some(1), None, None));
/// assert!(chain.finish().is_err());
/// ```
#[derive(Debug, Default)]
pub struct StatusChain {
    failure: Option<NdfError>,
}

impl StatusChain {
    /// A chain with no failure recorded.
    pub fn new() -> Self {
        Self { failure: None }
    }

    /// Continue from an existing status.
    pub fn from_status(status: Status) -> Self {
        Self {
            failure: status.err(),
        }
    }

    /// Run `op` unless a failure is already recorded.
    ///
    /// Returns the step's value, or `None` if the step was skipped or
    /// failed. A failure is recorded only if none was recorded before.
    pub fn step<T>(&mut self, op: impl FnOnce() -> Result<T, NdfError>) -> Option<T> {
        if self.failure.is_some() {
            return None;
        }
        match op() {
            Ok(v) => Some(v),
            Err(e) => {
                self.failure = Some(e);
                None
            }
        }
    }

    /// Whether every step so far succeeded.
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// The current status, without consuming the chain.
    pub fn status(&self) -> Status {
        match &self.failure {
            None => Ok(()),
            Some(e) => Err(e.clone()),
        }
    }

    /// Consume the chain and return its status.
    pub fn finish(self) -> Status {
        match self.failure {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Component;

    fn not_found() -> NdfError {
        NdfError::NotFound {
            what: "placeholder 3".into(),
        }
    }

    #[test]
    fn inherit_skips_work_after_failure() {
        let mut ran = false;
        let prior: Status = Err(not_found());
        let out: Result<(), NdfError> = inherit(&prior, || {
            ran = true;
            Ok(())
        });
        assert!(!ran);
        assert_eq!(out, Err(not_found()));
    }

    #[test]
    fn inherit_runs_when_ok() {
        assert_eq!(inherit(&Ok(()), || Ok::<_, NdfError>(5)), Ok(5));
    }

    #[test]
    fn chain_keeps_first_failure() {
        let mut chain = StatusChain::new();
        chain.step(|| Err::<(), _>(not_found()));
        let second = chain.step(|| {
            Err::<(), _>(NdfError::Undefined {
                component: Component::Data,
            })
        });
        assert!(second.is_none());
        assert_eq!(chain.finish(), Err(not_found()));
    }

    #[test]
    fn chain_from_failed_status_never_runs() {
        let mut chain = StatusChain::from_status(Err(not_found()));
        assert!(!chain.is_ok());
        assert_eq!(chain.step(|| Ok::<_, NdfError>(1)), None);
        assert_eq!(chain.status(), Err(not_found()));
    }
}
