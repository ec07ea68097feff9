use anyhow::{Context, Result};
use engine::render::RenderCommand;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<FormatInfo>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

/// Pull the container duration in seconds out of ffprobe's JSON output.
fn parse_probe_duration(stdout: &[u8]) -> Result<f64> {
    let probe_output: ProbeOutput =
        serde_json::from_slice(stdout).context("Failed to parse ffprobe JSON output")?;

    let duration = probe_output
        .format
        .and_then(|f| f.duration)
        .context("ffprobe reported no duration")?
        .trim()
        .parse::<f64>()
        .context("ffprobe duration is not a number")?;

    if !(duration.is_finite() && duration > 0.0) {
        anyhow::bail!("ffprobe reported a non-positive duration: {}", duration);
    }
    Ok(duration)
}

pub struct FFmpegWrapper;

impl FFmpegWrapper {
    /// Duration of an audio or video file in seconds.
    pub async fn probe_duration(media_path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("json")
            .arg(media_path)
            .output()
            .await
            .context("Failed to execute ffprobe. Make sure FFmpeg is installed.")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffprobe failed: {}", stderr);
        }

        parse_probe_duration(&output.stdout)
    }

    /// Run a generated render command to completion.
    pub async fn run(command: &RenderCommand) -> Result<()> {
        if let Some(parent) = command.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let output = Command::new("ffmpeg")
            .args(&command.ffmpeg_args)
            .output()
            .await
            .context("Failed to execute ffmpeg. Make sure FFmpeg is installed.")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            anyhow::bail!("ffmpeg failed to burn captions: {}", tail);
        }

        Ok(())
    }
}
