//! The Child Process Supervisor (C9): resolves and supervises an optional
//! sibling stdio-transport MCP binary exposing the same tool catalogue.
//! Mirrors the priority-ordered candidate probing the teacher used for
//! `init_model_library`, and the "best-effort, never escalate" failure
//! posture of its auto-save task.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::{Child, Command};

const MAX_RESTART_ATTEMPTS: u32 = 3;
const RESTART_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Restarting,
    Disabled,
}

struct Inner {
    state: SupervisorState,
    child: Option<Child>,
    attempts: u32,
}

/// Supervises a single child process instance, serializing start/stop under
/// its own lock per spec §5's "concurrent start/stop calls must be
/// serialized" requirement.
pub struct Supervisor {
    binary_path: Option<PathBuf>,
    port: u16,
    inner: Mutex<Inner>,
    shutting_down: AtomicBool,
}

/// Probe a small ordered candidate list for a sibling stdio MCP binary.
/// Returns `None` if nothing is found — the HTTP transport remains the
/// only surface, which is an accepted, non-fatal configuration.
fn resolve_binary() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CANVAS_MCP_STDIO_BIN") {
        let candidate = PathBuf::from(path);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))?;

    for name in ["canvas-mcp-stdio", "canvas-mcp"] {
        let candidate = exe_dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

impl Supervisor {
    pub fn new(port: u16) -> Self {
        let binary_path = resolve_binary();
        match &binary_path {
            Some(path) => tracing::info!(path = %path.display(), "stdio MCP binary resolved"),
            None => tracing::info!("no stdio MCP binary found; HTTP transport only"),
        }
        Self {
            binary_path,
            port,
            inner: Mutex::new(Inner {
                state: SupervisorState::Idle,
                child: None,
                attempts: 0,
            }),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.inner.lock().state
    }

    /// Spawn the child if a binary was resolved. No-op otherwise.
    pub async fn start(self: &std::sync::Arc<Self>) {
        let Some(binary_path) = self.binary_path.clone() else {
            return;
        };
        self.spawn_and_watch(binary_path);
    }

    fn spawn_and_watch(self: &std::sync::Arc<Self>, binary_path: PathBuf) {
        {
            let mut inner = self.inner.lock();
            inner.state = SupervisorState::Starting;
        }

        let child = Command::new(&binary_path)
            .env("CANVAS_SERVER_URL", format!("http://localhost:{}", self.port))
            .env("NO_COLOR", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("failed to spawn stdio MCP child: {e}");
                self.inner.lock().state = SupervisorState::Disabled;
                return;
            }
        };

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        {
            let mut inner = self.inner.lock();
            inner.state = SupervisorState::Running;
            inner.child = Some(child);
        }
        tracing::info!("stdio MCP child running");

        let this = self.clone();
        tokio::spawn(async move {
            this.watch_for_exit(binary_path).await;
        });
    }

    async fn watch_for_exit(self: std::sync::Arc<Self>, binary_path: PathBuf) {
        // parking_lot::Mutex is sync; wait() is async, so the child is taken
        // out and the lock is dropped before awaiting it.
        let mut child = match self.inner.lock().child.take() {
            Some(child) => child,
            None => return,
        };
        let status = child.wait().await;

        if self.shutting_down.load(Ordering::SeqCst) {
            return;
        }

        match status {
            Ok(status) => tracing::warn!(%status, "stdio MCP child exited unexpectedly"),
            Err(e) => tracing::warn!("failed to wait on stdio MCP child: {e}"),
        }

        let attempts = {
            let mut inner = self.inner.lock();
            inner.attempts += 1;
            inner.attempts
        };

        if attempts > MAX_RESTART_ATTEMPTS {
            tracing::warn!("stdio MCP child exceeded restart budget; disabling supervisor");
            self.inner.lock().state = SupervisorState::Disabled;
            return;
        }

        self.inner.lock().state = SupervisorState::Restarting;
        tokio::time::sleep(RESTART_DELAY).await;
        if self.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        self.spawn_and_watch(binary_path);
    }

    /// Sends SIGTERM to the child (spec §4.9). Falls back to a hard kill
    /// only if the process has no pid to signal (already gone).
    pub fn stop(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let mut inner = self.inner.lock();
        if let Some(child) = inner.child.as_mut() {
            match child.id() {
                Some(pid) => {
                    // SAFETY: pid is the live child's own pid, SIGTERM is a
                    // plain signal with no memory-safety implications.
                    let rc = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
                    if rc != 0 {
                        tracing::warn!(pid, "SIGTERM delivery failed; falling back to SIGKILL");
                        let _ = child.start_kill();
                    }
                }
                None => {
                    let _ = child.start_kill();
                }
            }
        }
        inner.child = None;
        inner.state = SupervisorState::Idle;
    }
}

async fn forward_stderr(stderr: tokio::process::ChildStderr) {
    use tokio::io::{AsyncBufReadExt, BufReader};
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(target: "canvas_mcp_stdio", "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_with_no_binary_resolved_in_test_env() {
        let supervisor = Supervisor::new(3100);
        assert_eq!(supervisor.state(), SupervisorState::Idle);
    }
}
