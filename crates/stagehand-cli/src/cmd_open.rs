use std::path::{Path, PathBuf};
use std::time::Duration;

use stagehand_bridge::{EngineCommand, EngineProcess, Service};
use stagehand_core::protocol::{Notification, Request};
use stagehand_mirror::Mirror;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::{self, Overrides, Settings};
use crate::logging;

pub struct OpenParams {
    pub path: Option<PathBuf>,
    pub overrides: Overrides,
    /// Print a line per notification instead of opening the terminal UI.
    pub plain: bool,
}

/// `stagehand open [PATH]`
pub fn execute(params: OpenParams, config_path: &Path) -> anyhow::Result<()> {
    let config = config::read_config(config_path)?;
    let settings = Settings::resolve(&config, params.overrides);
    if settings.engine.is_empty() {
        anyhow::bail!(
            "No engine configured. Pass --engine <CMD> or run `stagehand config set engine <CMD>`."
        );
    }

    let path = params.path.as_deref().map(resolve_repo_dir).transpose()?;

    let log = logging::init(settings.log_file.as_deref())?;
    tracing::info!(log_file = %log.log_file.display(), "stagehand starting");
    let command = EngineCommand::from_argv(&settings.engine)?.with_cwd(path.clone());

    let runtime = tokio::runtime::Runtime::new()?;
    let (engine, notifications) = EngineProcess::spawn(runtime.handle(), &command)?;
    engine.send_all(startup_requests(path.as_deref()))?;

    let result = if params.plain || cfg!(not(feature = "tui")) {
        watch_plain(&runtime, &engine, notifications)
    } else {
        run_tui(&engine, notifications, settings.author)
    };

    engine.shutdown();
    drop(engine);
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

#[cfg(feature = "tui")]
fn run_tui(
    engine: &EngineProcess,
    notifications: UnboundedReceiver<Notification>,
    author: String,
) -> anyhow::Result<()> {
    crate::tui::run(engine, notifications, author)
}

#[cfg(not(feature = "tui"))]
fn run_tui(
    _engine: &EngineProcess,
    _notifications: UnboundedReceiver<Notification>,
    _author: String,
) -> anyhow::Result<()> {
    anyhow::bail!("built without the `tui` feature; use --plain")
}

/// Absolute form of the directory passed to `open`. The engine runs there, so
/// it has to exist.
fn resolve_repo_dir(path: &Path) -> anyhow::Result<PathBuf> {
    let resolved = match std::fs::canonicalize(path) {
        Ok(p) => p,
        Err(e) => anyhow::bail!("cannot open {}: {e}", path.display()),
    };
    if !resolved.is_dir() {
        anyhow::bail!("cannot open {}: not a directory", path.display());
    }
    Ok(resolved)
}

/// What the engine is asked for before the first notification arrives.
pub fn startup_requests(path: Option<&Path>) -> Vec<Request> {
    let mut requests = Vec::new();
    if let Some(path) = path {
        requests.push(Request::SetWorkingDirectory {
            path: path.to_string_lossy().into_owned(),
        });
    }
    requests.push(Request::RequestStatusRefresh);
    requests.push(Request::RequestLog);
    requests
}

fn watch_plain(
    runtime: &tokio::runtime::Runtime,
    engine: &EngineProcess,
    mut notifications: UnboundedReceiver<Notification>,
) -> anyhow::Result<()> {
    eprintln!("stagehand (plain mode). Press Ctrl-C to stop.\n");
    let mut mirror = Mirror::new();
    while let Some(n) = runtime.block_on(notifications.recv()) {
        let kind = n.kind();
        match mirror.update(n) {
            Ok(requests) => engine.send_all(requests)?,
            Err(e) => {
                tracing::warn!(error = %e, "notification rejected");
                eprintln!("warning: {e}");
            }
        }
        println!("{}", summary(kind, &mirror));
    }
    eprintln!("engine closed the connection");
    Ok(())
}

/// One status line describing the mirror after a notification.
pub fn summary(kind: &str, mirror: &Mirror) -> String {
    let session = mirror.session();
    let branch = mirror.branches().current.as_deref().unwrap_or("-");
    let mut line = format!(
        "{kind:<17} repo={} branch={branch} staged={} unstaged={} tasks={} log={}",
        if session.repo_name.is_empty() {
            "-"
        } else {
            session.repo_name.as_str()
        },
        mirror.staged().len(),
        mirror.unstaged().len(),
        mirror.tasks().len(),
        mirror.log().len(),
    );
    if session.init_prompt {
        line.push_str(" [no repository: run init]");
    }
    if let Some(notice) = mirror.notice() {
        line.push_str(&format!(" [{}]", notice.text));
    }
    line
}
