//! Audio playback capability and the external-player backend

use crate::error::MediaFault;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Default decoder/player program
pub const DEFAULT_PLAYER_PROGRAM: &str = "mpg123";

/// Plays one clip to completion
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Open, decode and stream `clip` until it finishes. All resources are
    /// released on every exit path.
    async fn play(&self, clip: &Path) -> Result<(), MediaFault>;
}

/// Plays clips by running an external decoder/player, e.g. `mpg123 -q <clip>`
#[derive(Debug, Clone)]
pub struct ProcessAudioPlayer {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessAudioPlayer {
    /// `args` are passed before the clip path
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for ProcessAudioPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER_PROGRAM, vec!["-q".into()])
    }
}

#[async_trait]
impl AudioPlayer for ProcessAudioPlayer {
    async fn play(&self, clip: &Path) -> Result<(), MediaFault> {
        if !tokio::fs::try_exists(clip).await.unwrap_or(false) {
            return Err(MediaFault::NotFound(clip.to_path_buf()));
        }

        debug!("[AUDIO] {} {:?} {}", self.program.display(), self.args, clip.display());

        // kill_on_drop reaps the player if this future is abandoned
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(clip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| MediaFault::Spawn {
                path: clip.to_path_buf(),
                source,
            })?;

        if !status.success() {
            return Err(MediaFault::Playback {
                path: clip.to_path_buf(),
                status,
            });
        }
        Ok(())
    }
}
