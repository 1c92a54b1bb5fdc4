//! Mock materialization.
//!
//! A mock is the zero value of an endpoint's declared return shape. Rust
//! handlers declare it through trait bounds ([`default_of`], [`awaited`],
//! [`descriptor_of`]); configured routes declare it as a [`Shape`] tree.

use crate::error::MockError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::IntoFuture;

/// Produces the mock value for one route. Invoked once, at registration.
pub type MockFactory = Box<dyn FnOnce() -> Result<Value, MockError> + Send>;

/// Mock for a handler returning `T`: `T::default()`.
pub fn default_of<T>() -> MockFactory
where
    T: Default + Serialize + 'static,
{
    Box::new(|| {
        let value = serde_json::to_value(T::default())?;
        if value.is_null() {
            return Err(MockError::NoDefaultConstructor {
                shape: std::any::type_name::<T>().to_string(),
            });
        }
        Ok(value)
    })
}

/// Mock for a handler returning an async wrapper `F`.
///
/// The wrapper is never instantiated; the mock is the default of what it
/// resolves to.
pub fn awaited<F>() -> MockFactory
where
    F: IntoFuture,
    F::Output: Default + Serialize + 'static,
{
    default_of::<F::Output>()
}

/// Mock for a parameterized shape with nothing to unwrap: the shape's
/// descriptor rather than an instance.
pub fn descriptor_of<T: ?Sized>() -> MockFactory {
    let name = std::any::type_name::<T>();
    Box::new(move || Ok(Value::String(name.to_string())))
}

/// Mock that is already built.
pub fn fixed(value: Value) -> MockFactory {
    Box::new(move || Ok(value))
}

/// Mock built from a declared [`Shape`].
pub fn from_shape(shape: Shape) -> MockFactory {
    Box::new(move || shape.materialize())
}

/// Parameterless constructor availability for an object shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constructor {
    /// Public parameterless constructor
    #[default]
    Public,
    /// Only a non-public parameterless constructor
    NonPublic,
    /// No parameterless constructor at all
    None,
}

/// Declared return shape of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Reference string; defaults to null
    String,
    Int,
    Float,
    Bool,
    /// Defaults to the nil UUID
    Guid,
    /// Defaults to `0001-01-01T00:00:00`
    Datetime,
    /// Any nullable value
    Nullable,
    Array {
        #[serde(default)]
        items: Option<Box<Shape>>,
    },
    /// A record type with named fields
    Object {
        name: String,
        #[serde(default)]
        constructor: Constructor,
        #[serde(default)]
        fields: BTreeMap<String, Shape>,
        /// Materialize even when nested as a field
        #[serde(default)]
        eager: bool,
    },
    /// Async wrapper around an inner shape
    Task { inner: Box<Shape> },
    /// Parameterized shape with no unwrap semantics
    Generic {
        name: String,
        #[serde(default)]
        args: Vec<Shape>,
    },
}

impl Shape {
    /// Produce the mock value for this shape as a top-level return type.
    pub fn materialize(&self) -> Result<Value, MockError> {
        match self {
            Shape::Task { inner } => inner.materialize(),
            Shape::Object {
                name,
                constructor,
                fields,
                ..
            } => construct(name, *constructor, fields),
            Shape::Generic { .. } => Ok(Value::String(self.type_name())),
            // Reference and nullable results have no instance to stand in
            // for them.
            Shape::String | Shape::Nullable | Shape::Array { .. } => {
                Err(MockError::NoDefaultConstructor {
                    shape: self.type_name(),
                })
            }
            other => other.field_default(),
        }
    }

    /// Default of this shape when it appears as a field of another object.
    fn field_default(&self) -> Result<Value, MockError> {
        let value = match self {
            Shape::String | Shape::Nullable | Shape::Task { .. } | Shape::Generic { .. } => {
                Value::Null
            }
            Shape::Int => Value::from(0),
            Shape::Float => Value::from(0.0),
            Shape::Bool => Value::Bool(false),
            Shape::Guid => Value::String(uuid::Uuid::nil().to_string()),
            Shape::Datetime => Value::String(zero_datetime()),
            Shape::Array { .. } => Value::Array(Vec::new()),
            Shape::Object {
                name,
                constructor,
                fields,
                eager: true,
            } => construct(name, *constructor, fields)?,
            Shape::Object { .. } => Value::Null,
        };
        Ok(value)
    }

    /// Human-readable name, e.g. `Page<SomeClass>`.
    pub fn type_name(&self) -> String {
        match self {
            Shape::String => "string".to_string(),
            Shape::Int => "int".to_string(),
            Shape::Float => "float".to_string(),
            Shape::Bool => "bool".to_string(),
            Shape::Guid => "guid".to_string(),
            Shape::Datetime => "datetime".to_string(),
            Shape::Nullable => "nullable".to_string(),
            Shape::Array { items } => match items {
                Some(items) => format!("{}[]", items.type_name()),
                None => "array".to_string(),
            },
            Shape::Object { name, .. } => name.clone(),
            Shape::Task { inner } => format!("Task<{}>", inner.type_name()),
            Shape::Generic { name, args } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let args: Vec<String> = args.iter().map(Shape::type_name).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
        }
    }

    /// Validate the shape.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            Shape::Object { name, fields, .. } => {
                if name.is_empty() {
                    anyhow::bail!("Object shape name cannot be empty");
                }
                for (field, shape) in fields {
                    if field.is_empty() {
                        anyhow::bail!("Field name cannot be empty in {}", name);
                    }
                    shape.validate()?;
                }
            }
            Shape::Generic { name, args } => {
                if name.is_empty() {
                    anyhow::bail!("Generic shape name cannot be empty");
                }
                for arg in args {
                    arg.validate()?;
                }
            }
            Shape::Task { inner } => inner.validate()?,
            Shape::Array { items: Some(items) } => items.validate()?,
            _ => {}
        }
        Ok(())
    }
}

fn construct(
    name: &str,
    constructor: Constructor,
    fields: &BTreeMap<String, Shape>,
) -> Result<Value, MockError> {
    // Public first, then non-public; both build the same default instance.
    match constructor {
        Constructor::Public | Constructor::NonPublic => {}
        Constructor::None => {
            return Err(MockError::NoDefaultConstructor {
                shape: name.to_string(),
            })
        }
    }

    let object = fields
        .iter()
        .map(|(field, shape)| Ok((field.clone(), shape.field_default()?)))
        .collect::<Result<Map<String, Value>, MockError>>()?;
    Ok(Value::Object(object))
}

fn zero_datetime() -> String {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}
