//! rembg command line engine implementation.
//!
//! Each request spawns `rembg i` with the image on stdin and reads the
//! processed PNG from stdout. Processes are never reused.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use rembg_common::RemovalOptions;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::RemovalEngine;
use crate::config::EngineConfig;
use crate::error::{Error, Result};

/// Engine backed by the `rembg` executable.
pub struct RembgCliEngine {
    config: EngineConfig,
}

impl RembgCliEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Base command with wrapper arguments (e.g., `uv run rembg`) applied.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        for arg in &self.config.binary_args {
            cmd.arg(arg);
        }
        cmd
    }

    /// Arguments for `rembg i`, reading stdin and writing stdout.
    ///
    /// Matting flags are only passed when alpha matting is enabled. Values use
    /// the `--flag=value` form so negative numbers are not read as options.
    fn removal_args(options: &RemovalOptions) -> Vec<String> {
        let mut args = vec![
            "i".to_string(),
            "-m".to_string(),
            options.model.as_str().to_string(),
        ];

        if options.alpha_matting {
            args.push("-a".to_string());
            args.push(format!(
                "--alpha-matting-foreground-threshold={}",
                options.alpha_matting_foreground_threshold
            ));
            args.push(format!(
                "--alpha-matting-background-threshold={}",
                options.alpha_matting_background_threshold
            ));
            args.push(format!(
                "--alpha-matting-erode-size={}",
                options.alpha_matting_erode_size
            ));
        }

        args.push("-".to_string());
        args.push("-".to_string());
        args
    }

    fn spawn_error(&self, err: io::Error) -> Error {
        Error::EngineNotAvailable(format!(
            "failed to spawn '{}': {}",
            self.config.binary, err
        ))
    }
}

#[async_trait]
impl RemovalEngine for RembgCliEngine {
    fn engine_type(&self) -> &'static str {
        "cli"
    }

    async fn health_check(&self) -> Result<()> {
        let status = self
            .command()
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(Error::EngineNotAvailable(format!(
                "'{} --help' exited with {}",
                self.config.binary, status
            )));
        }

        Ok(())
    }

    async fn remove_background(
        &self,
        image: Vec<u8>,
        options: &RemovalOptions,
    ) -> Result<Vec<u8>> {
        let mut cmd = self.command();
        cmd.args(Self::removal_args(options))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
        tracing::debug!(
            "Spawned {} for model {} (pid: {:?})",
            self.config.binary,
            options.model,
            child.id()
        );

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Internal("rembg stdin was not captured".to_string()))?;

        // Feed stdin on its own task so a full stdout pipe cannot deadlock us.
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&image).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::InferenceFailed(format!("failed to wait for rembg: {}", e)))?;

        let write_result = writer
            .await
            .map_err(|e| Error::Internal(format!("stdin writer task failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(Error::InferenceFailed(if stderr.is_empty() {
                format!("rembg exited with {}", output.status)
            } else {
                stderr.to_string()
            }));
        }

        write_result.map_err(|e| {
            Error::InferenceFailed(format!("failed to send image to rembg: {}", e))
        })?;

        if output.stdout.is_empty() {
            return Err(Error::InferenceFailed("rembg produced no output".to_string()));
        }

        Ok(output.stdout)
    }
}
