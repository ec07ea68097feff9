use anyhow::Context;
use engine::{RawTiming, TranscribeError, Transcriber};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::media::compute_file_checksum;

#[derive(Debug, Deserialize)]
struct WordEntry {
    #[serde(alias = "text")]
    word: String,
    start: f64,
    end: f64,
}

#[derive(Debug, Default, Deserialize)]
struct SegmentEntry {
    #[serde(default)]
    words: Vec<WordEntry>,
}

/// Either a flat `words` list or whisper-style `segments[].words`.
#[derive(Debug, Default, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    words: Vec<WordEntry>,
    #[serde(default)]
    segments: Vec<SegmentEntry>,
}

impl TranscribeResponse {
    fn into_raw_timings(self) -> Vec<RawTiming> {
        let words = if self.words.is_empty() {
            self.segments.into_iter().flat_map(|s| s.words).collect()
        } else {
            self.words
        };
        words
            .into_iter()
            .map(|w| RawTiming {
                word: w.word.trim().to_string(),
                start: w.start,
                end: w.end,
            })
            .filter(|w| !w.word.is_empty())
            .collect()
    }
}

/// Word timestamps from the ML service `/transcribe` endpoint.
pub struct MlServiceTranscriber {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl MlServiceTranscriber {
    /// Must be called off the async runtime (e.g. inside `spawn_blocking`).
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build transcription HTTP client")?;
        Ok(MlServiceTranscriber {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl Transcriber for MlServiceTranscriber {
    fn name(&self) -> &str {
        "ml_service"
    }

    fn transcribe(&self, audio_path: &Path) -> Result<Vec<RawTiming>, TranscribeError> {
        let response = self
            .client
            .post(format!("{}/transcribe", self.base_url))
            .json(&serde_json::json!({
                "mediaPath": audio_path.to_string_lossy(),
                "wordTimestamps": true,
            }))
            .send()?;

        if !response.status().is_success() {
            return Err(format!("ML service transcribe failed: {}", response.status()).into());
        }

        let body: TranscribeResponse = response.json()?;
        Ok(body.into_raw_timings())
    }
}

/// Consults the transcript cache before the wrapped transcriber and stores
/// non-empty results under the audio checksum.
pub struct CachedTranscriber {
    db: Arc<Database>,
    inner: Box<dyn Transcriber>,
}

impl CachedTranscriber {
    pub fn new(db: Arc<Database>, inner: Box<dyn Transcriber>) -> Self {
        CachedTranscriber { db, inner }
    }
}

impl Transcriber for CachedTranscriber {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn transcribe(&self, audio_path: &Path) -> Result<Vec<RawTiming>, TranscribeError> {
        let checksum = compute_file_checksum(audio_path)?;

        match self.db.get_transcript(&checksum) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<RawTiming>>(&json) {
                Ok(words) => {
                    debug!("transcript cache hit for {}", checksum);
                    return Ok(words);
                }
                Err(e) => warn!("ignoring unreadable cached transcript {}: {}", checksum, e),
            },
            Ok(None) => {}
            Err(e) => warn!("transcript cache lookup failed: {:?}", e),
        }

        let words = self.inner.transcribe(audio_path)?;

        if !words.is_empty() {
            let json = serde_json::to_string(&words)?;
            if let Err(e) = self.db.store_transcript(&checksum, &json) {
                warn!("failed to cache transcript {}: {:?}", checksum, e);
            } else {
                info!("cached {} recognized words for {}", words.len(), checksum);
            }
        }
        Ok(words)
    }
}
