use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::source::TimingSource;
use crate::timeline::{CaptionSettings, RawTiming, ResolvedTiming, Token};

/// Which timing path produced a resolved timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStrategy {
    Positional,
    Uniform,
}

/// Spread `total_duration` evenly over the tokens. The last token ends at
/// exactly `total_duration`.
pub fn uniform_timings(tokens: &[Token], total_duration: f64) -> Vec<ResolvedTiming> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let count = tokens.len();
    let per_token = total_duration / count as f64;

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let end = if i + 1 == count {
                total_duration
            } else {
                (i + 1) as f64 * per_token
            };
            ResolvedTiming {
                token: token.clone(),
                start: i as f64 * per_token,
                end,
            }
        })
        .collect()
}

/// Map recognized words onto the known tokens by position. Tokens past the
/// end of `raw` reuse the last recognized timing.
fn positional_timings(tokens: &[Token], raw: &[RawTiming]) -> Vec<ResolvedTiming> {
    let last = raw.len() - 1;
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let timing = &raw[i.min(last)];
            ResolvedTiming {
                token: token.clone(),
                start: timing.start,
                end: timing.end,
            }
        })
        .collect()
}

/// Force `start[i] >= end[i-1]` and `end[i] > start[i]` on a timeline.
pub fn repair_timeline(timings: &mut [ResolvedTiming], min_token_duration: f64) {
    let mut prev_end = 0.0_f64;
    let mut repaired = 0usize;

    for timing in timings.iter_mut() {
        let original = (timing.start, timing.end);

        if timing.start < prev_end {
            timing.start = prev_end;
        }
        if timing.end <= timing.start {
            timing.end = timing.start + min_token_duration;
        }
        if (timing.start, timing.end) != original {
            repaired += 1;
        }
        prev_end = timing.end;
    }

    if repaired > 0 {
        debug!("repaired {} of {} token timings", repaired, timings.len());
    }
}

/// Resolve per-token timing from whatever source is available. The token
/// text is authoritative; recognized words only contribute timestamps.
pub fn reconcile(
    tokens: &[Token],
    source: &TimingSource,
    total_duration: f64,
    settings: &CaptionSettings,
) -> (Vec<ResolvedTiming>, ReconcileStrategy) {
    let raw = source.raw_timings();
    if raw.is_empty() {
        return (uniform_timings(tokens, total_duration), ReconcileStrategy::Uniform);
    }

    let count_delta = tokens.len().abs_diff(raw.len());
    if count_delta > settings.count_tolerance {
        info!(
            "recognized {} words for {} tokens (tolerance {}), using uniform timing",
            raw.len(),
            tokens.len(),
            settings.count_tolerance
        );
        return (uniform_timings(tokens, total_duration), ReconcileStrategy::Uniform);
    }

    let mut timings = positional_timings(tokens, raw);
    repair_timeline(&mut timings, settings.min_token_duration);
    (timings, ReconcileStrategy::Positional)
}
