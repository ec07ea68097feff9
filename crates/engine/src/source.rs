use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::timeline::RawTiming;

pub type TranscribeError = Box<dyn std::error::Error + Send + Sync>;

/// Where per-word timing comes from for one narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "words")]
pub enum TimingSource {
    External(Vec<RawTiming>),
    Unavailable,
}

impl TimingSource {
    pub fn raw_timings(&self) -> &[RawTiming] {
        match self {
            TimingSource::External(words) => words,
            TimingSource::Unavailable => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, TimingSource::External(_))
    }
}

/// An out-of-process speech-to-text capability that returns word timestamps.
///
/// Implementations block until the recognizer answers; any deadline belongs
/// to the implementation (e.g. an HTTP client timeout), not to the engine.
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    fn transcribe(&self, audio_path: &Path) -> Result<Vec<RawTiming>, TranscribeError>;
}

/// Ask the transcriber once for word timings. Never fails: an absent
/// transcriber or any error it raises becomes `TimingSource::Unavailable`.
pub fn get_raw_timings(transcriber: Option<&dyn Transcriber>, audio_path: &Path) -> TimingSource {
    let Some(transcriber) = transcriber else {
        debug!("no transcriber configured, using fallback timing");
        return TimingSource::Unavailable;
    };

    match transcriber.transcribe(audio_path) {
        Ok(words) => {
            let total = words.len();
            let words: Vec<RawTiming> = words
                .into_iter()
                .filter(|w| w.start.is_finite() && w.end.is_finite())
                .collect();
            if words.len() != total {
                debug!(
                    "dropped {} recognized words with non-finite timestamps",
                    total - words.len()
                );
            }
            debug!(
                transcriber = transcriber.name(),
                "received {} recognized words for {:?}",
                words.len(),
                audio_path
            );
            TimingSource::External(words)
        }
        Err(e) => {
            warn!(
                transcriber = transcriber.name(),
                "transcription of {:?} failed, using fallback timing: {}", audio_path, e
            );
            TimingSource::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<RawTiming>);

    impl Transcriber for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn transcribe(&self, _audio_path: &Path) -> Result<Vec<RawTiming>, TranscribeError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Transcriber for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn transcribe(&self, _audio_path: &Path) -> Result<Vec<RawTiming>, TranscribeError> {
            Err("decoder crashed".into())
        }
    }

    fn raw(word: &str, start: f64, end: f64) -> RawTiming {
        RawTiming {
            word: word.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn missing_transcriber_is_unavailable() {
        assert_eq!(
            get_raw_timings(None, Path::new("narration.mp3")),
            TimingSource::Unavailable
        );
    }

    #[test]
    fn failing_transcriber_is_unavailable() {
        let source = get_raw_timings(Some(&Broken), Path::new("narration.mp3"));
        assert!(!source.is_available());
        assert!(source.raw_timings().is_empty());
    }

    #[test]
    fn words_are_passed_through() {
        let words = vec![raw("hello", 0.0, 0.4), raw("world", 0.4, 0.9)];
        let source = get_raw_timings(Some(&Fixed(words.clone())), Path::new("a.wav"));
        assert_eq!(source, TimingSource::External(words));
    }

    #[test]
    fn non_finite_words_are_dropped() {
        let words = vec![raw("hello", 0.0, 0.4), raw("bad", f64::NAN, 1.0)];
        let source = get_raw_timings(Some(&Fixed(words)), Path::new("a.wav"));
        assert_eq!(source.raw_timings().len(), 1);
        assert_eq!(source.raw_timings()[0].word, "hello");
    }
}
