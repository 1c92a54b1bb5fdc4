//! Route identities and the request-side values they resolve from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Route value name carrying the controller.
pub const CONTROLLER: &str = "controller";
/// Route value name carrying the action.
pub const ACTION: &str = "action";

/// Identity of one handler: its controller and action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub controller: String,
    pub action: String,
}

impl RouteKey {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// Derive a key from a handler's declaring type name and method name.
    ///
    /// `controller` is removed from the type name without regard to case, so
    /// `ApplicationController` and `applicationcontroller` both become
    /// `Application`/`application`.
    pub fn from_handler(type_name: &str, action: impl Into<String>) -> Self {
        Self::new(strip_controller(type_name), action)
    }

    /// Build a key from request route values.
    ///
    /// Returns `None` when either value is missing or empty.
    pub fn resolve<S: RouteSource + ?Sized>(source: &S) -> Option<Self> {
        let controller = source.route_value(CONTROLLER).filter(|v| !v.is_empty())?;
        let action = source.route_value(ACTION).filter(|v| !v.is_empty())?;
        Some(Self::new(controller, action))
    }

    /// Both parts are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.controller.is_empty() && !self.action.is_empty()
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.controller, self.action)
    }
}

fn strip_controller(type_name: &str) -> String {
    const SUFFIX: &str = "controller";
    let lower = type_name.to_ascii_lowercase();
    let mut out = String::with_capacity(type_name.len());
    let mut i = 0;
    while i < type_name.len() {
        if lower[i..].starts_with(SUFFIX) {
            i += SUFFIX.len();
            continue;
        }
        // ASCII lowering keeps byte offsets aligned
        let ch = type_name[i..].chars().next().unwrap_or_default();
        out.push(ch);
        i += ch.len_utf8().max(1);
    }
    out
}

/// Something that exposes route values for an incoming request.
pub trait RouteSource {
    fn route_value(&self, name: &str) -> Option<&str>;
}

impl RouteSource for HashMap<String, String> {
    fn route_value(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl RouteSource for RouteKey {
    fn route_value(&self, name: &str) -> Option<&str> {
        match name {
            CONTROLLER => Some(&self.controller),
            ACTION => Some(&self.action),
            _ => None,
        }
    }
}
