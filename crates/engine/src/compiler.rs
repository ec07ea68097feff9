use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::animation::{build_animation, AnimationWindow};
use crate::chunker::chunk;
use crate::error::CaptionError;
use crate::reconcile::{reconcile, ReconcileStrategy};
use crate::source::{get_raw_timings, TimingSource, Transcriber};
use crate::timeline::{CaptionSettings, CaptionStyle, Chunk};
use crate::tokenizer::tokenize;

/// One caption as handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    pub chunk: Chunk,
    pub animation: AnimationWindow,
    pub style: CaptionStyle,
}

impl CaptionCue {
    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    pub fn alpha_at(&self, t: f64) -> f64 {
        self.animation.alpha_at(t)
    }

    pub fn y_offset_at(&self, t: f64) -> f64 {
        self.animation.y_offset_at(t)
    }
}

/// Every caption for one narration, in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub cues: Vec<CaptionCue>,
    pub strategy: ReconcileStrategy,
    pub token_count: usize,
    pub duration: f64,
}

impl CaptionTrack {
    /// Cues whose window contains `t`. At most one for a repaired timeline.
    pub fn cues_at(&self, t: f64) -> Vec<&CaptionCue> {
        self.cues
            .iter()
            .filter(|cue| cue.animation.contains(t))
            .collect()
    }
}

fn validate_inputs(
    text: &str,
    total_duration: f64,
    settings: &CaptionSettings,
) -> Result<(), CaptionError> {
    if text.trim().is_empty() {
        return Err(CaptionError::EmptyText);
    }
    if !(total_duration.is_finite() && total_duration > 0.0) {
        return Err(CaptionError::InvalidDuration(total_duration));
    }
    settings.validate()
}

/// Turn narration text plus a timing source into animated caption cues.
pub fn compile_captions(
    text: &str,
    source: &TimingSource,
    total_duration: f64,
    settings: &CaptionSettings,
    style: &CaptionStyle,
) -> Result<CaptionTrack, CaptionError> {
    validate_inputs(text, total_duration, settings)?;

    let tokens = tokenize(text);
    let (timings, strategy) = reconcile(&tokens, source, total_duration, settings);
    let chunks = chunk(&timings, settings.max_tokens_per_chunk);
    debug!(
        "compiled {} tokens into {} chunks ({:?} timing)",
        tokens.len(),
        chunks.len(),
        strategy
    );

    let cues = chunks
        .into_iter()
        .map(|chunk| {
            let animation = build_animation(
                &chunk,
                settings.fade_in,
                settings.fade_out,
                settings.slide_offset,
            );
            CaptionCue {
                chunk,
                animation,
                style: style.clone(),
            }
        })
        .collect();

    Ok(CaptionTrack {
        cues,
        strategy,
        token_count: tokens.len(),
        duration: total_duration,
    })
}

/// Full pipeline: one transcription attempt, then `compile_captions`.
/// Input errors are reported before the transcriber is invoked.
pub fn caption_narration(
    text: &str,
    audio_path: &Path,
    total_duration: f64,
    transcriber: Option<&dyn Transcriber>,
    settings: &CaptionSettings,
    style: &CaptionStyle,
) -> Result<CaptionTrack, CaptionError> {
    validate_inputs(text, total_duration, settings)?;
    let source = get_raw_timings(transcriber, audio_path);
    compile_captions(text, &source, total_duration, settings, style)
}
