//! Mock conditions and the handler outcomes they are evaluated against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// When a registered route should answer with its mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// The mock is never presented.
    #[default]
    Never,
    /// The mock is presented when the handler cannot reach its dependency.
    ConnectFailure,
    /// The mock is presented when the handler rejects the request.
    BadRequest,
    /// The mock is presented on any handler failure.
    AnyException,
    /// The mock is always presented.
    Always,
}

/// What is known about the real handler when a condition is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler has not run yet.
    Pending,
    /// The handler completed normally.
    Succeeded,
    /// The handler could not connect to something it depends on.
    ConnectFailure,
    /// The handler rejected the request.
    BadRequest,
    /// The handler failed for any other reason.
    Failed,
}

impl Condition {
    /// Decide whether the mock replaces the handler's result for `outcome`.
    ///
    /// With [`Outcome::Pending`] nothing about the handler is observable, so
    /// every condition other than [`Condition::Never`] mocks.
    pub fn should_mock(self, outcome: Outcome) -> bool {
        match (self, outcome) {
            (Condition::Never, _) => false,
            (Condition::Always, _) => true,
            (_, Outcome::Pending) => true,
            (Condition::ConnectFailure, Outcome::ConnectFailure) => true,
            (Condition::BadRequest, Outcome::BadRequest) => true,
            (
                Condition::AnyException,
                Outcome::ConnectFailure | Outcome::BadRequest | Outcome::Failed,
            ) => true,
            _ => false,
        }
    }

    /// Conditions whose meaning depends on a handler outcome.
    ///
    /// These cannot be told apart from `Always` before dispatch.
    pub fn requires_outcome(self) -> bool {
        matches!(
            self,
            Condition::ConnectFailure | Condition::BadRequest | Condition::AnyException
        )
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::Never => "never",
            Condition::ConnectFailure => "connect_failure",
            Condition::BadRequest => "bad_request",
            Condition::AnyException => "any_exception",
            Condition::Always => "always",
        };
        f.write_str(name)
    }
}
