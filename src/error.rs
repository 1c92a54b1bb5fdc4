//! Error types for registration and mock emission.

use crate::route::RouteKey;
use thiserror::Error;

/// Errors raised while building the registry or emitting a mock.
///
/// An unresolvable route is not represented here: the interceptor treats it
/// as a pass-through.
#[derive(Debug, Error)]
pub enum MockError {
    /// The declared return shape cannot be default-instantiated.
    #[error("could not find a parameterless constructor for endpoint result `{shape}`")]
    NoDefaultConstructor { shape: String },

    /// A route key with an empty controller or action.
    #[error("invalid route (controller: {controller:?}, action: {action:?})")]
    InvalidRoute { controller: String, action: String },

    /// The mock value could not be encoded.
    #[error("failed to serialize mock: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing the mock to the response failed.
    #[error("failed to write mock response: {0}")]
    Write(#[from] std::io::Error),

    /// A configured route failed to register.
    #[error("route {index} ({key}): {source}")]
    Route {
        index: usize,
        key: RouteKey,
        #[source]
        source: Box<MockError>,
    },
}

impl MockError {
    /// Whether this error (or the one it wraps) is a missing constructor.
    pub fn is_no_default_constructor(&self) -> bool {
        match self {
            MockError::NoDefaultConstructor { .. } => true,
            MockError::Route { source, .. } => source.is_no_default_constructor(),
            _ => false,
        }
    }
}
