//! Route registry.
//!
//! [`RegistryBuilder`] is the startup phase: routes are registered and
//! their mocks materialized once. [`RegistryBuilder::build`] freezes the
//! table into a [`Registry`], which is only read from then on and can be
//! shared across request tasks without locking.

use crate::condition::Condition;
use crate::config::MockableConfig;
use crate::error::MockError;
use crate::route::RouteKey;
use crate::shape::{self, MockFactory};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::IntoFuture;
use tracing::{debug, info, warn};

/// Condition plus the materialized mock for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct MockDescriptor {
    condition: Condition,
    mock: Value,
}

impl MockDescriptor {
    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn mock(&self) -> &Value {
        &self.mock
    }
}

/// Mutable registry used while the application starts.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<(RouteKey, MockDescriptor)>,
    index: HashMap<RouteKey, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, materializing its mock immediately.
    ///
    /// A second registration of the same key replaces the first descriptor
    /// in place.
    pub fn register(
        &mut self,
        key: RouteKey,
        condition: Condition,
        factory: MockFactory,
    ) -> Result<&mut Self, MockError> {
        if !key.is_valid() {
            return Err(MockError::InvalidRoute {
                controller: key.controller,
                action: key.action,
            });
        }

        let mock = factory()?;
        if mock.is_null() {
            return Err(MockError::NoDefaultConstructor {
                shape: key.to_string(),
            });
        }
        let descriptor = MockDescriptor { condition, mock };

        if condition.requires_outcome() {
            warn!(
                route = %key,
                condition = %condition,
                "Condition depends on the handler outcome; it acts like `always` at interception time"
            );
        }

        match self.index.get(&key) {
            Some(&position) => {
                warn!(route = %key, "Route registered twice, replacing earlier mock");
                self.entries[position].1 = descriptor;
            }
            None => {
                debug!(route = %key, condition = %condition, "Registered mockable route");
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, descriptor));
            }
        }

        Ok(self)
    }

    /// Register a handler returning `T`, mocked with `T::default()`.
    pub fn register_handler<T>(
        &mut self,
        type_name: &str,
        action: &str,
        condition: Condition,
    ) -> Result<&mut Self, MockError>
    where
        T: Default + Serialize + 'static,
    {
        self.register(
            RouteKey::from_handler(type_name, action),
            condition,
            shape::default_of::<T>(),
        )
    }

    /// Register a handler returning the async wrapper `F`, mocked with the
    /// default of its output.
    pub fn register_async_handler<F>(
        &mut self,
        type_name: &str,
        action: &str,
        condition: Condition,
    ) -> Result<&mut Self, MockError>
    where
        F: IntoFuture,
        F::Output: Default + Serialize + 'static,
    {
        self.register(
            RouteKey::from_handler(type_name, action),
            condition,
            shape::awaited::<F>(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the registry.
    pub fn build(self) -> Registry {
        info!(routes = self.entries.len(), "Mock registry built");
        Registry {
            entries: self.entries,
            index: self.index,
        }
    }
}

/// Read-only route table consulted on every request.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<(RouteKey, MockDescriptor)>,
    index: HashMap<RouteKey, usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from every enabled route in `config`.
    pub fn from_config(config: &MockableConfig) -> Result<Self, MockError> {
        let mut builder = RegistryBuilder::new();
        for (index, route) in config.routes.iter().enumerate() {
            if !route.enabled {
                debug!(index, "Skipping disabled route");
                continue;
            }
            let key = route.key();
            builder
                .register(key.clone(), route.condition, shape::from_shape(route.shape.clone()))
                .map_err(|e| MockError::Route {
                    index,
                    key,
                    source: Box::new(e),
                })?;
        }
        Ok(builder.build())
    }

    pub fn lookup(&self, key: &RouteKey) -> Option<&MockDescriptor> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &MockDescriptor)> {
        self.entries.iter().map(|(k, d)| (k, d))
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.entries.iter().map(|(k, _)| k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct SomeClass {
        name: Option<String>,
        age: i32,
    }

    #[test]
    fn test_register_and_lookup() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_handler::<SomeClass>("ApplicationController", "Get", Condition::Always)
            .unwrap();
        let registry = builder.build();

        let descriptor = registry.lookup(&RouteKey::new("Application", "Get")).unwrap();
        assert_eq!(descriptor.condition(), Condition::Always);
        assert_eq!(descriptor.mock(), &json!({"Name": null, "Age": 0}));
        assert!(registry.lookup(&RouteKey::new("Application", "Post")).is_none());
    }

    #[test]
    fn test_register_async_handler_unwraps() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_async_handler::<std::future::Ready<SomeClass>>(
                "ApplicationController",
                "GetAsyncResponse",
                Condition::Always,
            )
            .unwrap();
        let registry = builder.build();
        let descriptor = registry
            .lookup(&RouteKey::new("Application", "GetAsyncResponse"))
            .unwrap();
        assert_eq!(descriptor.mock()["Age"], 0);
    }

    #[test]
    fn test_factory_failure_registers_nothing() {
        let mut builder = RegistryBuilder::new();
        let result = builder.register(
            RouteKey::new("Application", "Get"),
            Condition::Always,
            Box::new(|| -> Result<Value, MockError> {
                Err(MockError::NoDefaultConstructor {
                    shape: "Widget".to_string(),
                })
            }),
        );
        assert!(result.unwrap_err().is_no_default_constructor());
        assert!(builder.is_empty());
    }

    #[test]
    fn test_null_mock_never_registered() {
        let mut builder = RegistryBuilder::new();

        let err = builder
            .register(
                RouteKey::new("A", "Str"),
                Condition::Always,
                shape::from_shape(Shape::String),
            )
            .unwrap_err();
        assert!(err.is_no_default_constructor());

        let err = builder
            .register(
                RouteKey::new("A", "Opt"),
                Condition::Always,
                shape::from_shape(Shape::Task {
                    inner: Box::new(Shape::Nullable),
                }),
            )
            .unwrap_err();
        assert!(err.is_no_default_constructor());

        let err = builder
            .register_handler::<Option<i32>>("AController", "Typed", Condition::Always)
            .unwrap_err();
        assert!(err.is_no_default_constructor());

        let err = builder
            .register(RouteKey::new("A", "Fixed"), Condition::Always, shape::fixed(Value::Null))
            .unwrap_err();
        assert!(err.is_no_default_constructor());

        assert!(builder.is_empty());
        assert!(builder.build().iter().all(|(_, d)| !d.mock().is_null()));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let mut builder = RegistryBuilder::new();
        let result = builder.register(
            RouteKey::new("Application", ""),
            Condition::Always,
            shape::fixed(json!({})),
        );
        assert!(matches!(result, Err(MockError::InvalidRoute { .. })));
    }

    #[test]
    fn test_duplicate_last_wins_in_place() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(RouteKey::new("A", "One"), Condition::Always, shape::fixed(json!(1)))
            .unwrap()
            .register(RouteKey::new("B", "Two"), Condition::Always, shape::fixed(json!(2)))
            .unwrap()
            .register(RouteKey::new("A", "One"), Condition::Never, shape::fixed(json!(3)))
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.len(), 2);
        let keys: Vec<String> = registry.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["A/One", "B/Two"]);

        let descriptor = registry.lookup(&RouteKey::new("A", "One")).unwrap();
        assert_eq!(descriptor.condition(), Condition::Never);
        assert_eq!(descriptor.mock(), &json!(3));
    }

    #[test]
    fn test_from_config() {
        let yaml = r#"
routes:
  - handler: ApplicationController
    action: Get
    condition: always
    shape:
      type: task
      inner:
        type: object
        name: SomeClass
        fields:
          Name: { type: string }
          Age: { type: int }
  - controller: Application
    action: Disabled
    enabled: false
    shape: { type: int }
"#;
        let config: MockableConfig = serde_yaml::from_str(yaml).unwrap();
        let registry = Registry::from_config(&config).unwrap();

        assert_eq!(registry.len(), 1);
        let descriptor = registry.lookup(&RouteKey::new("Application", "Get")).unwrap();
        assert_eq!(descriptor.mock(), &json!({"Age": 0, "Name": null}));
    }

    #[test]
    fn test_from_config_aborts_on_missing_constructor() {
        let yaml = r#"
routes:
  - controller: Application
    action: Get
    condition: always
    shape: { type: int }
  - controller: Application
    action: Widget
    condition: always
    shape:
      type: object
      name: Widget
      constructor: none
"#;
        let config: MockableConfig = serde_yaml::from_str(yaml).unwrap();
        let err = Registry::from_config(&config).unwrap_err();
        assert!(err.is_no_default_constructor());
        assert!(matches!(err, MockError::Route { index: 1, .. }));
    }

    #[test]
    fn test_default_config_scenario() {
        let config: MockableConfig =
            serde_yaml::from_str(include_str!("../demos/default-config.yaml")).unwrap();
        config.validate().unwrap();
        let registry = Registry::from_config(&config).unwrap();

        let get = registry.lookup(&RouteKey::new("Application", "Get")).unwrap();
        assert_eq!(get.condition(), Condition::Always);
        assert_eq!(
            get.mock(),
            &json!({
                "Name": null,
                "Age": 0,
                "UniqueId": "00000000-0000-0000-0000-000000000000",
                "Birthday": "0001-01-01T00:00:00",
            })
        );

        let never = registry
            .lookup(&RouteKey::new("Application", "GetAsyncResponse"))
            .unwrap();
        assert_eq!(never.condition(), Condition::Never);
        assert_eq!(never.mock(), &json!({"Name": null}));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();

        let registry = Arc::new(Registry::builder().build());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.lookup(&RouteKey::new("A", "B")).is_none())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
