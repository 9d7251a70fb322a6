use super::{Field, ItemField, MailItem};
use crate::dialog::payload::SenderInfo;
use log::{debug, warn};

/// Resolves who an item is sent from. Never fails: every dead end ends in
/// [`SenderInfo::default`].
#[derive(Debug, Default, Clone)]
pub struct HostDataAccessor;

impl HostDataAccessor {
    pub fn new() -> Self {
        Self
    }

    pub async fn sender_info(&self, item: &dyn MailItem) -> SenderInfo {
        match item.field(ItemField::From) {
            Field::Absent => {
                debug!("Item has no sender field, using default sender");
                SenderInfo::default()
            }
            Field::Value(value) => SenderInfo::from_value(&value).unwrap_or_else(|| {
                warn!("Sender field is not an address record: {}", value);
                SenderInfo::default()
            }),
            Field::Accessor(accessor) => match accessor.get_async().await.into_outcome() {
                Ok(Some(value)) => SenderInfo::from_value(&value).unwrap_or_else(|| {
                    warn!("Sender lookup returned a non-record value: {}", value);
                    SenderInfo::default()
                }),
                Ok(None) => {
                    warn!("Sender lookup succeeded without a value, using default sender");
                    SenderInfo::default()
                }
                Err(e) => {
                    warn!("Sender lookup failed ({}), using default sender", e);
                    SenderInfo::default()
                }
            },
        }
    }
}
