//! Terminal stand-ins for the host: a confirmation surface on stdin/stdout and a send
//! event that reports the decision.

pub mod fixture;

use crate::completion::{Decision, SendEvent};
use crate::dialog::payload::AUTO_SEND_SECONDS;
use crate::dialog::{
    Dialog, DialogEvent, DialogHost, DialogOptions, OpenedDialog, SurfaceError,
    DIALOG_CLOSED_BY_USER,
};
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{json, Value};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::oneshot;

pub use fixture::FixtureItem;

/// Prints the decision and keeps it for the caller.
#[derive(Default)]
pub struct ConsoleSendEvent {
    decision: Mutex<Option<Decision>>,
}

impl ConsoleSendEvent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn decision(&self) -> Option<Decision> {
        self.decision.lock().ok().and_then(|d| d.clone())
    }
}

impl SendEvent for ConsoleSendEvent {
    fn completed(&self, decision: Decision) {
        match &decision.error_message {
            Some(message) if !decision.allow_event => println!("✋ Send blocked: {}", message),
            _ => println!("📨 Send allowed."),
        }
        if let Ok(mut slot) = self.decision.lock() {
            *slot = Some(decision);
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConsoleDialogHost;

#[async_trait]
impl DialogHost for ConsoleDialogHost {
    async fn display_dialog(
        &self,
        url: &str,
        options: &DialogOptions,
    ) -> Result<OpenedDialog, SurfaceError> {
        println!(
            "Opening confirmation dialog {} ({}% x {}%)",
            url, options.width, options.height
        );
        let (events, receiver) = mpsc::unbounded_channel();
        Ok(OpenedDialog {
            dialog: Box::new(ConsoleDialog {
                events,
                closed: Arc::new(AtomicBool::new(false)),
                prompted: AtomicBool::new(false),
            }),
            events: receiver,
        })
    }
}

struct ConsoleDialog {
    events: UnboundedSender<DialogEvent>,
    closed: Arc<AtomicBool>,
    prompted: AtomicBool,
}

#[async_trait]
impl Dialog for ConsoleDialog {
    async fn message_child(&self, message: &str) -> Result<(), SurfaceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SurfaceError::Closed);
        }
        let document: Value = serde_json::from_str(message).map_err(|e| {
            warn!("Dialog could not read payload: {}", e);
            SurfaceError::NotReady
        })?;
        if self.prompted.swap(true, Ordering::SeqCst) {
            debug!("Dialog already showing a prompt, ignoring repeated payload");
            return Ok(());
        }

        print!("{}", render(&document));
        let seconds = document["autoSendSeconds"]
            .as_u64()
            .unwrap_or(u64::from(AUTO_SEND_SECONDS));
        println!(
            "Sending in {}s. [Enter/y] send now, [n] cancel, [x] close window",
            seconds
        );

        tokio::spawn(prompt(
            self.events.clone(),
            self.closed.clone(),
            Duration::from_secs(seconds),
        ));
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn render(document: &Value) -> String {
    let mut out = format!(
        "\n--- Confirm {} ---\nFrom: {} <{}>\n",
        document["itemType"].as_str().unwrap_or("email"),
        document["fromName"].as_str().unwrap_or_default(),
        document["fromEmail"].as_str().unwrap_or_default()
    );
    for group in document["recipients"].as_array().into_iter().flatten() {
        let members: Vec<String> = group["recipients"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|r| {
                format!(
                    "{} <{}>",
                    r["displayName"].as_str().unwrap_or_default(),
                    r["emailAddress"].as_str().unwrap_or_default()
                )
            })
            .collect();
        let members = if members.is_empty() {
            "(none)".to_string()
        } else {
            members.join(", ")
        };
        out.push_str(&format!(
            "{}: {}\n",
            group["type"].as_str().unwrap_or("?"),
            members
        ));
    }
    out
}

/// Maps one line of user input to what the surface posts back.
fn event_for_input(line: &str) -> DialogEvent {
    match line.trim().to_lowercase().as_str() {
        "n" | "no" | "cancel" => DialogEvent::Message(json!({"action": "cancel"}).to_string()),
        "x" | "close" => DialogEvent::Lifecycle(DIALOG_CLOSED_BY_USER),
        _ => DialogEvent::Message(json!({"action": "send", "reason": "user"}).to_string()),
    }
}

async fn prompt(events: UnboundedSender<DialogEvent>, closed: Arc<AtomicBool>, timer: Duration) {
    // Plain thread so a pending read never holds up runtime shutdown.
    let (tx, rx) = oneshot::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line);
        if let Ok(n) = read {
            if n > 0 {
                tx.send(line).ok();
            }
        }
    });

    let event = match tokio::time::timeout(timer, rx).await {
        Ok(Ok(line)) => event_for_input(&line),
        // stdin closed: let the countdown finish
        Ok(Err(_)) => {
            tokio::time::sleep(timer).await;
            timer_expired()
        }
        Err(_) => timer_expired(),
    };

    if closed.load(Ordering::SeqCst) {
        return;
    }
    events.send(event).ok();
}

fn timer_expired() -> DialogEvent {
    println!("Timer expired, sending.");
    DialogEvent::Message(json!({"action": "send", "reason": "timer"}).to_string())
}
