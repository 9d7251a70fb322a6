use super::{Field, ItemField, MailItem};
use crate::dialog::payload::{GroupLabel, Recipient, RecipientGroup};
use futures::future::{join_all, FutureExt};
use log::{debug, error, warn};
use serde_json::Value;
use std::panic::AssertUnwindSafe;

/// Declared order of the groups, independent of which fetch settles first.
const GROUP_ORDER: [(GroupLabel, ItemField); 5] = [
    (GroupLabel::To, ItemField::To),
    (GroupLabel::Cc, ItemField::Cc),
    (GroupLabel::Bcc, ItemField::Bcc),
    (GroupLabel::Required, ItemField::RequiredAttendees),
    (GroupLabel::Optional, ItemField::OptionalAttendees),
];

/// Collects every recipient category the item exposes, concurrently.
///
/// A group appears when its field exists on the item and only then; a fetch that fails or
/// returns something other than an array still yields the group, just with no members.
#[derive(Debug, Default, Clone)]
pub struct RecipientAggregator;

impl RecipientAggregator {
    pub fn new() -> Self {
        Self
    }

    pub async fn collect(&self, item: &dyn MailItem) -> Vec<RecipientGroup> {
        let fetches = GROUP_ORDER
            .iter()
            .filter_map(|&(label, field)| match item.field(field) {
                Field::Absent => None,
                present => Some(fetch_group(label, present)),
            })
            .collect::<Vec<_>>();

        debug!("Fetching {} recipient groups", fetches.len());

        // join_all keeps input order, so declared order survives any completion order.
        match AssertUnwindSafe(join_all(fetches)).catch_unwind().await {
            Ok(groups) => groups,
            Err(_) => {
                error!("Recipient gathering aborted, continuing with no recipients");
                Vec::new()
            }
        }
    }
}

async fn fetch_group(label: GroupLabel, field: Field) -> RecipientGroup {
    let value = match field {
        Field::Absent => None,
        Field::Value(value) => Some(value),
        Field::Accessor(accessor) => match accessor.get_async().await.into_outcome() {
            Ok(value) => value,
            Err(e) => {
                warn!("Fetching {:?} recipients failed: {}", label, e);
                None
            }
        },
    };

    match value {
        Some(Value::Array(entries)) => RecipientGroup {
            label,
            members: members_from(label, &entries),
        },
        Some(other) => {
            warn!("{:?} recipients were not a list: {}", label, other);
            RecipientGroup::empty(label)
        }
        None => RecipientGroup::empty(label),
    }
}

fn members_from(label: GroupLabel, entries: &[Value]) -> Vec<Recipient> {
    entries
        .iter()
        .filter_map(|entry| {
            let recipient = Recipient::from_value(entry);
            if recipient.is_none() {
                debug!("Skipping malformed {:?} entry: {}", label, entry);
            }
            recipient
        })
        .collect()
}
