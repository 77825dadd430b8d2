//! Service execution status.
//!
//! This module contains the status value recorded for every orchestrator
//! component (service or group) that takes part in a turn.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Represents the execution outcome of an orchestrator component.
///
/// Components progress through these states as a turn is processed. The
/// terminal states are recorded per component in [`TurnScratch`], keyed by
/// the component's path name.
///
/// [`TurnScratch`]: crate::context::TurnScratch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    /// The component's start condition evaluated false; it was skipped.
    NotRun,
    /// The component is currently executing (transient, never a final state).
    Running,
    /// The handler returned normally within its timeout.
    Finished,
    /// The handler returned an error.
    Failed,
    /// The handler did not complete within the allotted time.
    Timeout,
}

impl ServiceStatus {
    /// Whether the component actually executed its handler to completion.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_screaming_snake_case() {
        assert_eq!(ServiceStatus::NotRun.to_string(), "NOT_RUN");
        assert_eq!(ServiceStatus::Timeout.to_string(), "TIMEOUT");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ServiceStatus::Running.is_terminal());
        assert!(ServiceStatus::Finished.is_terminal());
        assert!(ServiceStatus::Failed.is_terminal());
    }
}
