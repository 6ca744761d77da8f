//! Delegated extraction through `yt-dlp`.

mod format;

use async_trait::async_trait;
use exn::ResultExt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

pub use self::format::{Format, FormatPolicy, Info, UnknownFormatPolicy};
use crate::error::{ErrorKind, Result};

/// A generic media extraction routine: URL in, structured info out.
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    async fn extract_info(&self, url: &str) -> Result<Info>;
}

/// The `yt-dlp` executable, run as a child process.
#[derive(Debug, Clone)]
pub enum YtDlp {
    /// A directly executable binary.
    Binary { path: PathBuf },
    /// The Python module, run through an interpreter (`python3 -m yt_dlp`).
    Module { python: PathBuf },
}
impl YtDlp {
    /// Use an explicit binary if configured, otherwise search `PATH`.
    pub fn discover(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                tracing::warn!(path = %path.display(), "configured yt-dlp binary does not exist");
                exn::bail!(ErrorKind::ToolNotFound("yt-dlp"));
            }
            return Ok(Self::Binary { path });
        }
        if let Ok(path) = which::which("yt-dlp") {
            return Ok(Self::Binary { path });
        }
        tracing::info!("yt-dlp executable not found in PATH");
        for interpreter in ["python3", "python"] {
            let Ok(python) = which::which(interpreter) else { continue };
            let installed = std::process::Command::new(&python)
                .args(["-m", "yt_dlp", "--version"])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|status| status.success());
            if installed {
                tracing::trace!(python = %python.display(), "Discovered yt_dlp Python module");
                return Ok(Self::Module { python });
            }
        }
        exn::bail!(ErrorKind::ToolNotFound("yt-dlp"));
    }

    fn command(&self) -> Command {
        match self {
            Self::Binary { path } => Command::new(path),
            Self::Module { python } => {
                let mut command = Command::new(python);
                command.args(["-m", "yt_dlp"]);
                command
            },
        }
    }
}

#[async_trait]
impl InfoExtractor for YtDlp {
    #[instrument(skip(self))]
    async fn extract_info(&self, url: &str) -> Result<Info> {
        let output = self
            .command()
            .args(["--dump-single-json", "--no-download", "--no-playlist", "--no-warnings", "--", url])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .or_raise(|| ErrorKind::ToolNotFound("yt-dlp"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, stderr = %stderr.trim(), "yt-dlp failed");
            exn::bail!(classify_failure(&stderr));
        }
        serde_json::from_slice(&output.stdout).or_raise(|| ErrorKind::MalformedResponse("yt-dlp output"))
    }
}

/// yt-dlp reports missing posts only through its error message.
fn classify_failure(stderr: &str) -> ErrorKind {
    let stderr = stderr.to_ascii_lowercase();
    let not_found = ["404", "not found", "unavailable", "does not exist", "has been removed"];
    if not_found.iter().any(|needle| stderr.contains(needle)) {
        ErrorKind::UpstreamNotFound
    } else {
        ErrorKind::Upstream
    }
}
