//! # helpsync-engine
//!
//! Branch/PR reconciliation: converge remote state to exactly one open pull
//! request representing the latest upstream ref, without duplicating effort
//! or losing track of in-flight work.
//!
//! Call [`reconcile`] with a fresh working copy once the detector has decided
//! an upgrade is needed.

pub mod branch;
pub mod error;
pub mod message;
pub mod reconcile;

pub use error::EngineError;
pub use reconcile::{reconcile, ReconcileOutcome, UpgradeTarget};

/// Run a best-effort step: log a failure and move on, never propagate.
///
/// Cleanup-grade work (obsolete-branch deletion, PR comments, labels,
/// workspace destruction) goes through here so one wrapper owns the policy.
pub fn best_effort<T, E: std::fmt::Display>(what: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("{what} failed (ignored): {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_passes_successes_through() {
        let value = best_effort("noop", Ok::<_, std::io::Error>(41));
        assert_eq!(value, Some(41));
    }

    #[test]
    fn best_effort_swallows_failures() {
        let value = best_effort::<(), _>("noop", Err(std::io::Error::other("boom")));
        assert_eq!(value, None);
    }
}
