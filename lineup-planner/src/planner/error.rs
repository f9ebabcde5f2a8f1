//! Planner error types

use std::fmt;

use thiserror::Error;

/// Mutations the planner reports failures for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateStage,
    AssignArtist,
    MoveArtist,
    RemoveArtist,
    ScheduleArtist,
    LoadLineup,
}

impl Operation {
    /// User-facing failure label
    pub fn label(self) -> &'static str {
        match self {
            Operation::CreateStage => "Failed to create stage",
            Operation::AssignArtist => "Failed to assign artist",
            Operation::MoveArtist => "Failed to move artist",
            Operation::RemoveArtist => "Failed to remove artist",
            Operation::ScheduleArtist => "Failed to schedule artist",
            Operation::LoadLineup => "Failed to load lineup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Planner error
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Rejected before any store call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Time window collides with another performance
    #[error("Schedule overlap: {0}")]
    Overlap(String),

    /// Store call failed; carries the store's own message
    #[error("{operation}: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: lineup_common::Error,
    },
}

impl PlannerError {
    pub fn store(operation: Operation, source: lineup_common::Error) -> Self {
        PlannerError::Store { operation, source }
    }

    /// Failure label, present for store failures only
    pub fn operation(&self) -> Option<Operation> {
        match self {
            PlannerError::Store { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_prefixes_label() {
        let err = PlannerError::store(
            Operation::MoveArtist,
            lineup_common::Error::NotFound("Assignment 42".to_string()),
        );

        assert_eq!(err.to_string(), "Failed to move artist: Not found: Assignment 42");
        assert_eq!(err.operation(), Some(Operation::MoveArtist));
    }

    #[test]
    fn test_validation_has_no_operation() {
        let err = PlannerError::Validation("Stage name cannot be empty".to_string());
        assert_eq!(err.operation(), None);
    }
}
