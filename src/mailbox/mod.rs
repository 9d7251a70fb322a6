//! The host's view of the item being sent.
//!
//! A host exposes each item field in one of three shapes: not there at all, a plain value
//! that can be read straight away, or an asynchronous getter that answers with a
//! status/value/error triple. Everything downstream works against [`MailItem`] so it never
//! has to know which shape a particular host (or host version) uses.

pub mod recipients;
pub mod sender;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use recipients::RecipientAggregator;
pub use sender::HostDataAccessor;

// --- Error Handling ---
#[derive(Error, Debug, Clone, PartialEq)]
#[error("host error {code}: {message}")]
pub struct HostError {
    pub code: i64,
    pub message: String,
}

impl HostError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Used when the host reports failure without saying why.
    pub fn unspecified() -> Self {
        Self::new(0, "host reported failure without an error")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncStatus {
    Succeeded,
    Failed,
}

/// The triple every asynchronous host getter answers with.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncResult {
    pub status: AsyncStatus,
    pub value: Option<Value>,
    pub error: Option<HostError>,
}

impl AsyncResult {
    pub fn succeeded(value: Value) -> Self {
        Self {
            status: AsyncStatus::Succeeded,
            value: Some(value),
            error: None,
        }
    }

    /// Success with nothing attached.
    pub fn empty() -> Self {
        Self {
            status: AsyncStatus::Succeeded,
            value: None,
            error: None,
        }
    }

    pub fn failed(error: HostError) -> Self {
        Self {
            status: AsyncStatus::Failed,
            value: None,
            error: Some(error),
        }
    }

    /// Collapses the triple: `Ok(Some)` success-with-value, `Ok(None)` success-empty,
    /// `Err` failure. A null value counts as empty.
    pub fn into_outcome(self) -> Result<Option<Value>, HostError> {
        match self.status {
            AsyncStatus::Succeeded => Ok(self.value.filter(|v| !v.is_null())),
            AsyncStatus::Failed => Err(self.error.unwrap_or_else(HostError::unspecified)),
        }
    }
}

/// An asynchronous getter exposed by the host, e.g. `item.to.getAsync`.
#[async_trait]
pub trait AsyncAccessor: Send + Sync {
    async fn get_async(&self) -> AsyncResult;
}

/// How one field of an item is exposed.
#[derive(Clone)]
pub enum Field {
    Absent,
    Value(Value),
    Accessor(Arc<dyn AsyncAccessor>),
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Absent => f.write_str("Absent"),
            Field::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Field::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    From,
    To,
    Cc,
    Bcc,
    RequiredAttendees,
    OptionalAttendees,
}

impl ItemField {
    /// The property name the host uses for this field.
    pub fn host_name(self) -> &'static str {
        match self {
            ItemField::From => "from",
            ItemField::To => "to",
            ItemField::Cc => "cc",
            ItemField::Bcc => "bcc",
            ItemField::RequiredAttendees => "requiredAttendees",
            ItemField::OptionalAttendees => "optionalAttendees",
        }
    }

    pub fn from_host_name(name: &str) -> Option<Self> {
        [
            ItemField::From,
            ItemField::To,
            ItemField::Cc,
            ItemField::Bcc,
            ItemField::RequiredAttendees,
            ItemField::OptionalAttendees,
        ]
        .into_iter()
        .find(|f| f.host_name() == name)
    }
}

/// The item handle the host passes alongside a send event.
pub trait MailItem: Send + Sync {
    fn field(&self, field: ItemField) -> Field;
}

/// Reads the first string among `keys` on a JSON object.
pub(crate) fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_str))
}
