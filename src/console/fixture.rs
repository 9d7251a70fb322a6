use crate::dialog::payload::ItemKind;
use crate::mailbox::{AsyncAccessor, AsyncResult, Field, ItemField, MailItem};
use crate::router::SendTrigger;
use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read item file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse item file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct FixtureDocument {
    #[serde(default = "default_kind")]
    kind: ItemKind,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn default_kind() -> ItemKind {
    ItemKind::Email
}

/// Answers with a fixed value, the way a host getter would.
struct FixedAccessor(Value);

#[async_trait]
impl AsyncAccessor for FixedAccessor {
    async fn get_async(&self) -> AsyncResult {
        AsyncResult::succeeded(self.0.clone())
    }
}

/// An item described by a JSON file.
///
/// ```json
/// { "kind": "appointment",
///   "from": { "displayName": "Ada", "emailAddress": "ada@example.com" },
///   "requiredAttendees": [{ "displayName": "Bob", "emailAddress": "bob@example.com" }] }
/// ```
///
/// Each host field present in the file is exposed through an async getter; missing ones
/// are absent from the item.
pub struct FixtureItem {
    kind: ItemKind,
    fields: HashMap<ItemField, Field>,
}

impl FixtureItem {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let path_str = path.to_string_lossy().to_string();
        let content = fs::read_to_string(path).map_err(|e| FixtureError::Read {
            path: path_str.clone(),
            source: e,
        })?;
        Self::from_json(&content).map_err(|e| FixtureError::Parse {
            path: path_str,
            source: e,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let document: FixtureDocument = serde_json::from_str(content)?;

        let mut fields = HashMap::new();
        for (name, value) in document.fields {
            match ItemField::from_host_name(&name) {
                Some(field) => {
                    let accessor: Arc<dyn AsyncAccessor> = Arc::new(FixedAccessor(value));
                    fields.insert(field, Field::Accessor(accessor));
                }
                None => warn!("Ignoring unknown item field '{}'", name),
            }
        }

        Ok(Self {
            kind: document.kind,
            fields,
        })
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn trigger(&self) -> SendTrigger {
        match self.kind {
            ItemKind::Email => SendTrigger::MessageSend,
            ItemKind::Appointment => SendTrigger::AppointmentSend,
        }
    }
}

impl MailItem for FixtureItem {
    fn field(&self, field: ItemField) -> Field {
        self.fields.get(&field).cloned().unwrap_or(Field::Absent)
    }
}
