use anyhow::{bail, Context};
use send_guard::config::AppConfig;
use send_guard::console::{ConsoleDialogHost, ConsoleSendEvent, FixtureItem};
use send_guard::dialog::SurfaceController;
use send_guard::mailbox::{HostDataAccessor, RecipientAggregator};
use send_guard::SendRouter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // --- Load .env file at the very beginning ---
    if let Ok(path) = dotenvy::dotenv() {
        println!("Loaded .env file from: {:?}", path);
    }

    env_logger::init();

    let Some(item_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: send-guard <item.json>");
    };

    let config = AppConfig::load().context("Failed to load config")?;
    let item = FixtureItem::load(&item_path)?;

    let router = SendRouter::new(
        HostDataAccessor::new(),
        RecipientAggregator::new(),
        SurfaceController::new(
            Arc::new(ConsoleDialogHost),
            config.dialog.clone(),
            config.handshake.clone(),
        ),
    );

    let event = ConsoleSendEvent::new();
    router
        .dispatch(item.trigger(), Some(event.clone()), &item)
        .await;

    match event.decision() {
        Some(decision) if decision.allow_event => Ok(ExitCode::SUCCESS),
        Some(_) => Ok(ExitCode::from(2)),
        None => bail!("send event was never resolved"),
    }
}
