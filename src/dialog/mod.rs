//! The confirmation surface: opening it, handing it the payload, and turning whatever it
//! says back into a decision.
//!
//! Every failure along the way allows the send. Only an explicit cancel message or the
//! user closing the surface blocks it.

pub mod payload;

use crate::completion::{CompletionGuard, Decision, CANCELLED, CANCELLED_BY_USER};
use crate::config::{DialogConfig, HandshakeConfig};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use payload::{ConfirmationPayload, DialogResponse};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

/// Lifecycle code the host reports when the user closes the surface window.
pub const DIALOG_CLOSED_BY_USER: u32 = 12006;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Dialog failed to open: {0}")]
    OpenFailed(String),

    #[error("Dialog is not ready to receive messages")]
    NotReady,

    #[error("Dialog is closed")]
    Closed,
}

/// Open options as the host expects them; sizes are percentages of the screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogOptions {
    pub height: u8,
    pub width: u8,
    pub prompt_before_open: bool,
}

impl From<&DialogConfig> for DialogOptions {
    fn from(config: &DialogConfig) -> Self {
        Self {
            height: config.height,
            width: config.width,
            prompt_before_open: config.prompt_before_open,
        }
    }
}

/// Something the surface sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    /// A message posted through the message channel, unparsed.
    Message(String),
    /// A lifecycle notification with the host's numeric code.
    Lifecycle(u32),
}

/// An open surface.
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Posts one message into the surface. Fails while the surface is still loading.
    async fn message_child(&self, message: &str) -> Result<(), SurfaceError>;

    fn close(&self);
}

pub struct OpenedDialog {
    pub dialog: Box<dyn Dialog>,
    pub events: UnboundedReceiver<DialogEvent>,
}

#[async_trait]
pub trait DialogHost: Send + Sync {
    async fn display_dialog(
        &self,
        url: &str,
        options: &DialogOptions,
    ) -> Result<OpenedDialog, SurfaceError>;
}

/// How a presentation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceExit {
    OpenFailed,
    HandshakeExhausted { attempts: u32 },
    Responded(Decision),
    ClosedByUser,
    LoadFailed(u32),
    ChannelEnded,
}

impl SurfaceExit {
    /// The decision this exit resolves the send with.
    pub fn decision(&self) -> Decision {
        match self {
            SurfaceExit::Responded(decision) => decision.clone(),
            SurfaceExit::ClosedByUser => Decision::block(CANCELLED),
            SurfaceExit::OpenFailed
            | SurfaceExit::HandshakeExhausted { .. }
            | SurfaceExit::LoadFailed(_)
            | SurfaceExit::ChannelEnded => Decision::allow(),
        }
    }
}

pub struct SurfaceController {
    host: Arc<dyn DialogHost>,
    dialog: DialogConfig,
    handshake: HandshakeConfig,
}

impl SurfaceController {
    pub fn new(host: Arc<dyn DialogHost>, dialog: DialogConfig, handshake: HandshakeConfig) -> Self {
        Self {
            host,
            dialog,
            handshake,
        }
    }

    /// Runs one presentation to its end and resolves `guard` on the way out.
    pub async fn present(
        &self,
        payload: ConfirmationPayload,
        guard: &CompletionGuard,
    ) -> SurfaceExit {
        let message = match payload.to_json() {
            Ok(message) => message,
            Err(e) => {
                // Nothing to show, so there is nothing to confirm.
                error!("Could not serialize confirmation payload: {}", e);
                guard.complete(Decision::allow());
                return SurfaceExit::OpenFailed;
            }
        };

        let options = DialogOptions::from(&self.dialog);
        let OpenedDialog { dialog, mut events } =
            match self.host.display_dialog(&self.dialog.url, &options).await {
                Ok(opened) => opened,
                Err(e) => {
                    error!("{}", e);
                    let exit = SurfaceExit::OpenFailed;
                    guard.complete(exit.decision());
                    return exit;
                }
            };
        debug!("Dialog open at {}", self.dialog.url);

        let handshake = self.transmit(&*dialog, &message);
        tokio::pin!(handshake);

        // A surface event can beat the handshake; the first one to finish decides.
        let early = tokio::select! {
            result = &mut handshake => match result {
                Ok(attempts) => {
                    debug!("Payload delivered on attempt {}", attempts);
                    None
                }
                Err(attempts) => {
                    warn!(
                        "Dialog never accepted the payload after {} attempts, allowing send",
                        attempts
                    );
                    Some(SurfaceExit::HandshakeExhausted { attempts })
                }
            },
            Some(event) = events.recv() => Some(Self::interpret(event)),
        };

        let exit = match early {
            Some(exit) => exit,
            None => match events.recv().await {
                Some(event) => Self::interpret(event),
                None => {
                    warn!("Dialog went away without answering, allowing send");
                    SurfaceExit::ChannelEnded
                }
            },
        };

        dialog.close();
        guard.complete(exit.decision());
        exit
    }

    /// Posts `message` until it goes through or attempts run out.
    /// Ok and Err both carry the number of attempts made.
    async fn transmit(&self, dialog: &dyn Dialog, message: &str) -> Result<u32, u32> {
        let max_attempts = self.handshake.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match dialog.message_child(message).await {
                Ok(()) => return Ok(attempt),
                Err(e) if attempt < max_attempts => {
                    debug!("Payload attempt {}/{} failed: {}", attempt, max_attempts, e);
                    tokio::time::sleep(self.handshake.retry_delay()).await;
                }
                Err(e) => {
                    debug!("Final payload attempt {} failed: {}", attempt, e);
                    return Err(attempt);
                }
            }
        }
    }

    fn interpret(event: DialogEvent) -> SurfaceExit {
        match event {
            DialogEvent::Message(message) => match DialogResponse::parse(&message) {
                Some(DialogResponse::Send { reason }) => {
                    info!("Send confirmed: {}", reason);
                    SurfaceExit::Responded(Decision::allow())
                }
                Some(DialogResponse::Cancel) => {
                    info!("Send cancelled by user");
                    SurfaceExit::Responded(Decision::block(CANCELLED_BY_USER))
                }
                None => {
                    warn!("Unrecognized dialog response {:?}, allowing send", message);
                    SurfaceExit::Responded(Decision::allow())
                }
            },
            DialogEvent::Lifecycle(DIALOG_CLOSED_BY_USER) => {
                info!("Dialog closed by user");
                SurfaceExit::ClosedByUser
            }
            DialogEvent::Lifecycle(code) => {
                warn!("Dialog reported lifecycle error {}, allowing send", code);
                SurfaceExit::LoadFailed(code)
            }
        }
    }
}
