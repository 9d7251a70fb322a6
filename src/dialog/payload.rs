use crate::mailbox::first_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Seconds the confirmation surface counts down before sending on its own.
pub const AUTO_SEND_SECONDS: u32 = 20;

const UNKNOWN_SENDER: &str = "Unknown";

/// Who the item is sent from. Never absent; falls back to `Unknown` / empty address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderInfo {
    #[serde(rename = "fromName")]
    pub name: String,
    #[serde(rename = "fromEmail")]
    pub email: String,
}

impl Default for SenderInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN_SENDER.to_string(),
            email: String::new(),
        }
    }
}

impl SenderInfo {
    /// Reads a host address record, accepting `displayName`/`name` and `emailAddress`/`address`.
    /// Returns `None` when the value is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Some(Self {
            name: first_str(value, &["displayName", "name"])
                .unwrap_or(UNKNOWN_SENDER)
                .to_string(),
            email: first_str(value, &["emailAddress", "address"])
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// One recipient or attendee as shown on the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub display_name: String,
    pub email_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_type: Option<String>,
}

impl Recipient {
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Some(Self {
            display_name: first_str(value, &["displayName", "name"])
                .unwrap_or_default()
                .to_string(),
            email_address: first_str(value, &["emailAddress", "address"])
                .unwrap_or_default()
                .to_string(),
            recipient_type: first_str(value, &["recipientType"]).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupLabel {
    To,
    Cc,
    Bcc,
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientGroup {
    #[serde(rename = "type")]
    pub label: GroupLabel,
    #[serde(rename = "recipients")]
    pub members: Vec<Recipient>,
}

impl RecipientGroup {
    pub fn empty(label: GroupLabel) -> Self {
        Self {
            label,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Email,
    Appointment,
}

/// Everything the surface needs to render, sent as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayload {
    #[serde(flatten)]
    sender: SenderInfo,
    #[serde(rename = "recipients")]
    groups: Vec<RecipientGroup>,
    #[serde(rename = "itemType")]
    item_kind: ItemKind,
    auto_send_seconds: u32,
}

impl ConfirmationPayload {
    pub fn new(sender: SenderInfo, groups: Vec<RecipientGroup>, item_kind: ItemKind) -> Self {
        Self {
            sender,
            groups,
            item_kind,
            auto_send_seconds: AUTO_SEND_SECONDS,
        }
    }

    pub fn sender(&self) -> &SenderInfo {
        &self.sender
    }

    pub fn groups(&self) -> &[RecipientGroup] {
        &self.groups
    }

    pub fn item_kind(&self) -> ItemKind {
        self.item_kind
    }

    pub fn auto_send_seconds(&self) -> u32 {
        self.auto_send_seconds
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// What the surface answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DialogResponse {
    Send {
        #[serde(default)]
        reason: String,
    },
    Cancel,
}

impl DialogResponse {
    /// `None` for anything that is not JSON or names no known action.
    pub fn parse(message: &str) -> Option<Self> {
        serde_json::from_str(message).ok()
    }
}
