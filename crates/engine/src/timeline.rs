use serde::{Deserialize, Serialize};

use crate::error::CaptionError;

pub const DEFAULT_MAX_TOKENS_PER_CHUNK: usize = 3;
pub const DEFAULT_COUNT_TOLERANCE: usize = 2;
pub const DEFAULT_MIN_TOKEN_DURATION: f64 = 0.3;
pub const DEFAULT_FADE_IN: f64 = 0.2;
pub const DEFAULT_FADE_OUT: f64 = 0.15;
pub const DEFAULT_SLIDE_OFFSET: f64 = 40.0;

/// One whitespace-delimited word of the narration, punctuation included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub ordinal: usize,
}

/// A word recognized by the transcription service. Seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// A token paired with a timestamp that respects the timeline invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTiming {
    pub token: Token,
    pub start: f64,
    pub end: f64,
}

impl ResolvedTiming {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A run of tokens shown on screen together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub tokens: Vec<ResolvedTiming>,
}

impl Chunk {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn token_refs(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().map(|t| &t.token)
    }
}

/// Styling handed to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
}

fn default_font_size() -> u32 {
    70
}

fn default_color() -> String {
    "white".to_string()
}

fn default_stroke_color() -> String {
    "black".to_string()
}

fn default_stroke_width() -> u32 {
    3
}

impl Default for CaptionStyle {
    fn default() -> Self {
        CaptionStyle {
            font_size: default_font_size(),
            color: default_color(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
        }
    }
}

/// Tunables for reconciliation, chunking and animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSettings {
    #[serde(default = "default_max_tokens_per_chunk")]
    pub max_tokens_per_chunk: usize,
    /// Largest token/recognized-word count difference still mapped positionally.
    #[serde(default = "default_count_tolerance")]
    pub count_tolerance: usize,
    #[serde(default = "default_min_token_duration")]
    pub min_token_duration: f64,
    #[serde(default = "default_fade_in")]
    pub fade_in: f64,
    #[serde(default = "default_fade_out")]
    pub fade_out: f64,
    #[serde(default = "default_slide_offset")]
    pub slide_offset: f64,
}

fn default_max_tokens_per_chunk() -> usize {
    DEFAULT_MAX_TOKENS_PER_CHUNK
}

fn default_count_tolerance() -> usize {
    DEFAULT_COUNT_TOLERANCE
}

fn default_min_token_duration() -> f64 {
    DEFAULT_MIN_TOKEN_DURATION
}

fn default_fade_in() -> f64 {
    DEFAULT_FADE_IN
}

fn default_fade_out() -> f64 {
    DEFAULT_FADE_OUT
}

fn default_slide_offset() -> f64 {
    DEFAULT_SLIDE_OFFSET
}

impl Default for CaptionSettings {
    fn default() -> Self {
        CaptionSettings {
            max_tokens_per_chunk: DEFAULT_MAX_TOKENS_PER_CHUNK,
            count_tolerance: DEFAULT_COUNT_TOLERANCE,
            min_token_duration: DEFAULT_MIN_TOKEN_DURATION,
            fade_in: DEFAULT_FADE_IN,
            fade_out: DEFAULT_FADE_OUT,
            slide_offset: DEFAULT_SLIDE_OFFSET,
        }
    }
}

impl CaptionSettings {
    pub fn validate(&self) -> Result<(), CaptionError> {
        if self.max_tokens_per_chunk == 0 {
            return Err(CaptionError::InvalidSettings(
                "max_tokens_per_chunk must be at least 1".to_string(),
            ));
        }
        if !(self.min_token_duration.is_finite() && self.min_token_duration > 0.0) {
            return Err(CaptionError::InvalidSettings(format!(
                "min_token_duration must be positive, got {}",
                self.min_token_duration
            )));
        }
        for (name, value) in [("fade_in", self.fade_in), ("fade_out", self.fade_out)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CaptionError::InvalidSettings(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.slide_offset.is_finite() {
            return Err(CaptionError::InvalidSettings(
                "slide_offset must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
