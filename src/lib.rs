//! Mockable
//!
//! Route-level mock interception. Handlers are registered at startup with a
//! condition and a declared return shape; the interceptor then answers
//! matching requests with the zero value of that shape instead of running
//! the handler.
//!
//! # Features
//!
//! - **Registry**: `(controller, action)` routes mapped to materialized mocks,
//!   built once and shared read-only
//! - **Typed registration**: mocks from `Default + Serialize` return types,
//!   with async wrappers unwrapped to their output
//! - **Declared shapes**: mocks from a YAML description of the return type
//! - **Interceptor**: one pass-through or mock decision per request
//! - **Standalone server**: serve a route table over HTTP
//!
//! # Example
//!
//! ```
//! use mockable::{Condition, MockInterceptor, RegistryBuilder};
//! use mockable::config::GlobalSettings;
//! use std::sync::Arc;
//!
//! #[derive(Default, serde::Serialize)]
//! struct Profile {
//!     name: Option<String>,
//!     age: i32,
//! }
//!
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .register_handler::<Profile>("ProfileController", "Get", Condition::Always)
//!     .unwrap();
//! let interceptor = MockInterceptor::new(Arc::new(builder.build()), GlobalSettings::default());
//! assert_eq!(interceptor.registry().len(), 1);
//! ```
//!
//! # Example Configuration
//!
//! ```yaml
//! routes:
//!   - handler: ApplicationController
//!     action: Get
//!     condition: always
//!     shape:
//!       type: task
//!       inner:
//!         type: object
//!         name: SomeClass
//!         fields:
//!           Name: { type: string }
//!           Age: { type: int }
//! ```

pub mod condition;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod registry;
pub mod route;
pub mod server;
pub mod shape;

pub use condition::{Condition, Outcome};
pub use config::MockableConfig;
pub use error::MockError;
pub use interceptor::{Decision, Interception, MockInterceptor, ResponseWriter};
pub use registry::{MockDescriptor, Registry, RegistryBuilder};
pub use route::{RouteKey, RouteSource};
