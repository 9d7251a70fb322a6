//! Send-time confirmation gate for mail and calendar items.
//!
//! When a message or appointment is sent, [`router::SendRouter`] gathers the sender and
//! recipients from the host item, shows them on a confirmation surface, and resolves the
//! pending send exactly once, as allowed or blocked, through [`completion::CompletionGuard`].

pub mod completion;
pub mod config;
pub mod console;
pub mod dialog;
pub mod mailbox;
pub mod router;

#[cfg(test)]
mod testing;

pub use completion::{CompletionGuard, Decision, SendEvent};
pub use config::AppConfig;
pub use router::{SendRouter, SendTrigger};
