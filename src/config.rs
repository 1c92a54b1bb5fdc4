//! Configuration for the mock interceptor.
//!
//! Declares mockable routes, their conditions and return shapes, plus
//! global settings for the interceptor and the standalone server.

use crate::condition::Condition;
use crate::route::RouteKey;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockableConfig {
    /// Mockable routes
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,

    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,

    /// Response for requests that pass through the standalone server
    #[serde(default)]
    pub default_response: Option<DefaultResponse>,
}

impl MockableConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, route) in self.routes.iter().enumerate() {
            route
                .validate()
                .map_err(|e| anyhow::anyhow!("Route {}: {}", i, e))?;
        }
        if let Some(default) = &self.default_response {
            default.validate()?;
        }
        Ok(())
    }
}

/// One mockable route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDefinition {
    /// Controller name as it appears in route values
    #[serde(default)]
    pub controller: Option<String>,

    /// Handler type name; `controller` is stripped to form the controller
    #[serde(default)]
    pub handler: Option<String>,

    /// Action (method) name
    pub action: String,

    /// When to present the mock
    #[serde(default)]
    pub condition: Condition,

    /// Whether this route is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Declared return shape
    pub shape: Shape,
}

fn default_true() -> bool {
    true
}

impl RouteDefinition {
    /// Route key for this definition. An explicit `controller` wins over
    /// `handler`.
    pub fn key(&self) -> RouteKey {
        match (&self.controller, &self.handler) {
            (Some(controller), _) => RouteKey::new(controller.clone(), self.action.clone()),
            (None, Some(handler)) => RouteKey::from_handler(handler, self.action.clone()),
            (None, None) => RouteKey::new(String::new(), self.action.clone()),
        }
    }

    /// Validate the route definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.action.is_empty() {
            anyhow::bail!("Route action cannot be empty");
        }
        if self.key().controller.is_empty() {
            anyhow::bail!("Route needs a non-empty controller or handler");
        }
        self.shape.validate()?;
        Ok(())
    }
}

/// Response for pass-through requests in the standalone server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultResponse {
    /// HTTP status code
    #[serde(default = "default_status")]
    pub status: u16,

    /// JSON body
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

fn default_status() -> u16 {
    404
}

impl DefaultResponse {
    /// Validate the default response.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.status < 100 || self.status > 599 {
            anyhow::bail!("Invalid status code: {}", self.status);
        }
        Ok(())
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Log requests answered with a mock
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log requests passed through
    #[serde(default = "default_true")]
    pub log_unmatched: bool,

    /// Content type of mock responses
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
            content_type: default_content_type(),
        }
    }
}

fn default_content_type() -> String {
    "application/json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
routes:
  - handler: ApplicationController
    action: Get
    condition: always
    shape:
      type: object
      name: SomeClass
      fields:
        Name: { type: string }
        Age: { type: int }
  - controller: Orders
    action: List
    shape:
      type: generic
      name: Page
      args:
        - { type: int }
settings:
  log_unmatched: false
default_response:
  body:
    error: not_found
"#;

    #[test]
    fn test_parse_routes() {
        let config: MockableConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].key(), RouteKey::new("Application", "Get"));
        assert_eq!(config.routes[0].condition, Condition::Always);
        assert_eq!(config.routes[1].condition, Condition::Never);
        assert!(config.routes[1].enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_settings_defaults() {
        let config: MockableConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(config.settings.log_matches);
        assert!(!config.settings.log_unmatched);
        assert_eq!(config.settings.content_type, "application/json");

        let default = config.default_response.unwrap();
        assert_eq!(default.status, 404);
        assert_eq!(default.body.unwrap()["error"], "not_found");
    }

    #[test]
    fn test_controller_wins_over_handler() {
        let route = RouteDefinition {
            controller: Some("Explicit".to_string()),
            handler: Some("OtherController".to_string()),
            action: "Get".to_string(),
            condition: Condition::Always,
            enabled: true,
            shape: Shape::Int,
        };
        assert_eq!(route.key().controller, "Explicit");
    }

    #[test]
    fn test_validate_missing_controller() {
        let yaml = r#"
routes:
  - action: Get
    shape: { type: int }
"#;
        let config: MockableConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Route 0"));
    }

    #[test]
    fn test_validate_status_range() {
        let yaml = r#"
default_response:
  status: 700
"#;
        let config: MockableConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = r#"
routes:
  - controller: Application
    action: Get
    shape: { type: int }
    priority: 3
"#;
        assert!(serde_yaml::from_str::<MockableConfig>(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = MockableConfig::from_file(file.path()).unwrap();
        assert_eq!(config.routes.len(), 2);
    }
}
