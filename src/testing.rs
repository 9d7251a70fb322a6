//! Scripted stand-ins for the host, shared by the unit tests.

use crate::completion::{Decision, SendEvent};
use crate::dialog::{Dialog, DialogEvent, DialogHost, DialogOptions, OpenedDialog, SurfaceError};
use crate::mailbox::{AsyncAccessor, AsyncResult, Field, ItemField, MailItem};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Default)]
pub(crate) struct RecordingEvent {
    decisions: Mutex<Vec<Decision>>,
}

impl RecordingEvent {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn decisions(&self) -> Vec<Decision> {
        self.decisions.lock().unwrap().clone()
    }
}

impl SendEvent for RecordingEvent {
    fn completed(&self, decision: Decision) {
        self.decisions.lock().unwrap().push(decision);
    }
}

pub(crate) struct StubAccessor {
    result: AsyncResult,
    delay: Option<Duration>,
}

impl StubAccessor {
    pub(crate) fn new(result: AsyncResult) -> Self {
        Self {
            result,
            delay: None,
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AsyncAccessor for StubAccessor {
    async fn get_async(&self) -> AsyncResult {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

pub(crate) struct PanickingAccessor;

#[async_trait]
impl AsyncAccessor for PanickingAccessor {
    async fn get_async(&self) -> AsyncResult {
        panic!("host accessor blew up")
    }
}

#[derive(Default)]
pub(crate) struct MapItem {
    fields: HashMap<ItemField, Field>,
}

impl MapItem {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, field: ItemField, value: Field) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub(crate) fn with_accessor(self, field: ItemField, accessor: impl AsyncAccessor + 'static) -> Self {
        self.with(field, Field::Accessor(Arc::new(accessor)))
    }
}

impl MailItem for MapItem {
    fn field(&self, field: ItemField) -> Field {
        self.fields.get(&field).cloned().unwrap_or(Field::Absent)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum DialogScript {
    FailOpen,
    /// `message_child` fails this many times, then succeeds.
    ReadyAfter(u32),
    NeverReady,
}

#[derive(Default)]
struct DialogRecord {
    attempts: AtomicU32,
    closed: AtomicBool,
    delivered: Mutex<Vec<String>>,
}

pub(crate) struct ScriptedDialogHost {
    script: DialogScript,
    record: Arc<DialogRecord>,
    events: Mutex<Option<UnboundedReceiver<DialogEvent>>>,
    opened_with: Mutex<Option<(String, DialogOptions)>>,
}

impl ScriptedDialogHost {
    /// The returned sender plays the surface's side of the event channel.
    pub(crate) fn new(script: DialogScript) -> (Arc<Self>, UnboundedSender<DialogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Arc::new(Self {
            script,
            record: Arc::new(DialogRecord::default()),
            events: Mutex::new(Some(rx)),
            opened_with: Mutex::new(None),
        });
        (host, tx)
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.record.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.record.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn delivered(&self) -> Vec<String> {
        self.record.delivered.lock().unwrap().clone()
    }

    pub(crate) fn opened_with(&self) -> Option<(String, DialogOptions)> {
        self.opened_with.lock().unwrap().clone()
    }
}

#[async_trait]
impl DialogHost for ScriptedDialogHost {
    async fn display_dialog(
        &self,
        url: &str,
        options: &DialogOptions,
    ) -> Result<OpenedDialog, SurfaceError> {
        if let DialogScript::FailOpen = self.script {
            return Err(SurfaceError::OpenFailed("display_dialog refused".into()));
        }
        *self.opened_with.lock().unwrap() = Some((url.to_string(), options.clone()));
        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| SurfaceError::OpenFailed("dialog already opened".into()))?;
        Ok(OpenedDialog {
            dialog: Box::new(ScriptedDialog {
                script: self.script,
                record: self.record.clone(),
            }),
            events,
        })
    }
}

struct ScriptedDialog {
    script: DialogScript,
    record: Arc<DialogRecord>,
}

#[async_trait]
impl Dialog for ScriptedDialog {
    async fn message_child(&self, message: &str) -> Result<(), SurfaceError> {
        let attempt = self.record.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let ready = match self.script {
            DialogScript::ReadyAfter(failures) => attempt > failures,
            DialogScript::FailOpen | DialogScript::NeverReady => false,
        };
        if !ready {
            return Err(SurfaceError::NotReady);
        }
        self.record
            .delivered
            .lock()
            .unwrap()
            .push(message.to_string());
        Ok(())
    }

    fn close(&self) {
        self.record.closed.store(true, Ordering::SeqCst);
    }
}
