use crate::completion::{CompletionGuard, Decision, SendEvent};
use crate::dialog::payload::{ConfirmationPayload, ItemKind};
use crate::dialog::SurfaceController;
use crate::mailbox::{HostDataAccessor, MailItem, RecipientAggregator};
use futures::FutureExt;
use log::{error, info};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// The two send triggers the add-in is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTrigger {
    MessageSend,
    AppointmentSend,
}

impl SendTrigger {
    /// Maps the action names a host manifest binds to their trigger.
    pub fn from_action_name(name: &str) -> Option<Self> {
        match name {
            "onMessageSendHandler" => Some(SendTrigger::MessageSend),
            "onAppointmentSendHandler" => Some(SendTrigger::AppointmentSend),
            _ => None,
        }
    }

    pub fn item_kind(self) -> ItemKind {
        match self {
            SendTrigger::MessageSend => ItemKind::Email,
            SendTrigger::AppointmentSend => ItemKind::Appointment,
        }
    }
}

/// Entry point for send events: gather, confirm, resolve.
pub struct SendRouter {
    sender: HostDataAccessor,
    recipients: RecipientAggregator,
    surface: SurfaceController,
}

impl SendRouter {
    pub fn new(
        sender: HostDataAccessor,
        recipients: RecipientAggregator,
        surface: SurfaceController,
    ) -> Self {
        Self {
            sender,
            recipients,
            surface,
        }
    }

    pub async fn on_message_send(&self, event: Option<Arc<dyn SendEvent>>, item: &dyn MailItem) {
        self.dispatch(SendTrigger::MessageSend, event, item).await
    }

    pub async fn on_appointment_send(
        &self,
        event: Option<Arc<dyn SendEvent>>,
        item: &dyn MailItem,
    ) {
        self.dispatch(SendTrigger::AppointmentSend, event, item)
            .await
    }

    /// Handles one send attempt. Returns once the event has been resolved.
    pub async fn dispatch(
        &self,
        trigger: SendTrigger,
        event: Option<Arc<dyn SendEvent>>,
        item: &dyn MailItem,
    ) {
        info!("{:?} triggered", trigger);
        let guard = CompletionGuard::from_handle(event);

        let gathered = AssertUnwindSafe(async {
            futures::join!(
                self.sender.sender_info(item),
                self.recipients.collect(item)
            )
        })
        .catch_unwind()
        .await;

        let (sender, groups) = match gathered {
            Ok(gathered) => gathered,
            Err(_) => {
                error!("Error gathering {:?} info, allowing send", trigger.item_kind());
                guard.complete(Decision::allow());
                return;
            }
        };

        let payload = ConfirmationPayload::new(sender, groups, trigger.item_kind());
        let exit = self.surface.present(payload, &guard).await;
        info!("{:?} finished: {:?}", trigger, exit);
    }
}
