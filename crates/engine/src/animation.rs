//! Time-windowed opacity and slide-up curves for a caption chunk.
//!
//! Every curve is piecewise linear with breakpoints at `start`,
//! `fade_in_end`, `fade_out_start` and `end`, so a renderer can either
//! sample `alpha_at`/`y_offset_at` per frame or rebuild the same closed form
//! in its own expression language.

use serde::{Deserialize, Serialize};

use crate::timeline::Chunk;

/// Visibility state of a chunk at a given playback time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Hidden,
    FadingIn,
    Visible,
    FadingOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationWindow {
    pub start: f64,
    pub end: f64,
    pub fade_in_end: f64,
    pub fade_out_start: f64,
    /// Display units the caption sits below its rest position when it appears.
    pub slide_offset: f64,
}

impl AnimationWindow {
    pub fn fade_in_duration(&self) -> f64 {
        self.fade_in_end - self.start
    }

    pub fn fade_out_duration(&self) -> f64 {
        self.end - self.fade_out_start
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    pub fn phase_at(&self, t: f64) -> Phase {
        if !self.contains(t) {
            Phase::Hidden
        } else if t < self.fade_in_end {
            Phase::FadingIn
        } else if t < self.fade_out_start {
            Phase::Visible
        } else {
            Phase::FadingOut
        }
    }

    /// Opacity in `[0, 1]`; zero outside `[start, end)`.
    pub fn alpha_at(&self, t: f64) -> f64 {
        let alpha = match self.phase_at(t) {
            Phase::Hidden => 0.0,
            Phase::FadingIn => (t - self.start) / self.fade_in_duration(),
            Phase::Visible => 1.0,
            Phase::FadingOut => {
                let fade_out = self.fade_out_duration();
                if fade_out > 0.0 {
                    (self.end - t) / fade_out
                } else {
                    1.0
                }
            }
        };
        alpha.clamp(0.0, 1.0)
    }

    /// Vertical offset from rest position, moving with the fade-in.
    pub fn y_offset_at(&self, t: f64) -> f64 {
        if self.fade_in_end <= self.start {
            return 0.0;
        }
        if t <= self.start {
            return self.slide_offset;
        }
        if t >= self.fade_in_end {
            return 0.0;
        }
        let progress = (t - self.start) / self.fade_in_duration();
        self.slide_offset * (1.0 - progress.clamp(0.0, 1.0))
    }
}

/// Build the animation for one chunk. When the chunk is shorter than both
/// fades together, the fades shrink by the same factor so they sum to the
/// chunk duration and meet at a single instant.
pub fn build_animation(
    chunk: &Chunk,
    fade_in_duration: f64,
    fade_out_duration: f64,
    slide_offset: f64,
) -> AnimationWindow {
    let start = chunk.start;
    let end = chunk.end;
    let duration = end - start;
    let fades = fade_in_duration + fade_out_duration;

    let (fade_in_end, fade_out_start) = if fades <= 0.0 {
        (start, end)
    } else if duration >= fades {
        (start + fade_in_duration, end - fade_out_duration)
    } else {
        let meet = start + duration * (fade_in_duration / fades);
        (meet, meet)
    };

    AnimationWindow {
        start,
        end,
        fade_in_end,
        fade_out_start,
        slide_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_between(start: f64, end: f64) -> Chunk {
        Chunk {
            text: "test".to_string(),
            start,
            end,
            tokens: Vec::new(),
        }
    }

    fn sample_times(window: &AnimationWindow, steps: usize) -> Vec<f64> {
        let span = window.end - window.start;
        (0..=steps)
            .map(|i| window.start - 0.1 + (span + 0.2) * i as f64 / steps as f64)
            .collect()
    }

    #[test]
    fn nominal_window_holds_full_opacity() {
        let window = build_animation(&chunk_between(1.0, 3.0), 0.2, 0.15, 40.0);
        assert!((window.fade_in_end - 1.2).abs() < 1e-9);
        assert!((window.fade_out_start - 2.85).abs() < 1e-9);

        assert_eq!(window.alpha_at(0.5), 0.0);
        assert_eq!(window.alpha_at(1.0), 0.0);
        assert!((window.alpha_at(1.1) - 0.5).abs() < 1e-9);
        assert_eq!(window.alpha_at(2.0), 1.0);
        assert_eq!(window.alpha_at(3.0), 0.0);
        assert_eq!(window.alpha_at(4.0), 0.0);
    }

    #[test]
    fn slide_tracks_fade_in() {
        let window = build_animation(&chunk_between(1.0, 3.0), 0.2, 0.15, 40.0);
        assert_eq!(window.y_offset_at(1.0), 40.0);
        assert!((window.y_offset_at(1.1) - 20.0).abs() < 1e-9);
        assert_eq!(window.y_offset_at(1.2), 0.0);
        assert_eq!(window.y_offset_at(2.9), 0.0);
    }

    #[test]
    fn short_chunk_compresses_fades_proportionally() {
        let window = build_animation(&chunk_between(2.0, 2.1), 0.2, 0.15, 40.0);
        let fade_in = window.fade_in_duration();
        let fade_out = window.fade_out_duration();

        assert!((fade_in + fade_out - 0.1).abs() < 1e-9);
        assert!((fade_in / fade_out - 0.2 / 0.15).abs() < 1e-6);
        assert_eq!(window.fade_in_end, window.fade_out_start);

        for t in sample_times(&window, 200) {
            let alpha = window.alpha_at(t);
            assert!(alpha.is_finite());
            assert!((0.0..=1.0).contains(&alpha));
        }
    }

    #[test]
    fn alpha_is_continuous_inside_window() {
        for (start, end) in [(0.0, 2.0), (0.0, 0.35), (0.0, 0.05)] {
            let window = build_animation(&chunk_between(start, end), 0.2, 0.15, 40.0);
            let steps = 1000;
            let dt = (end - start) / steps as f64;
            let max_slope = 1.0 / window.fade_in_duration().min(window.fade_out_duration());
            for i in 0..steps - 1 {
                let t = start + i as f64 * dt;
                let jump = (window.alpha_at(t + dt) - window.alpha_at(t)).abs();
                assert!(jump <= max_slope * dt + 1e-9, "jump of {} at t={}", jump, t);
            }
        }
    }

    #[test]
    fn reaches_full_opacity_only_with_room_to_hold() {
        let window = build_animation(&chunk_between(0.0, 1.0), 0.2, 0.15, 40.0);
        assert_eq!(window.alpha_at(0.5), 1.0);
        assert_eq!(window.phase_at(0.5), Phase::Visible);
    }

    #[test]
    fn phases_progress_in_order() {
        let window = build_animation(&chunk_between(1.0, 2.0), 0.2, 0.2, 40.0);
        let phases: Vec<Phase> = [0.9, 1.1, 1.5, 1.9, 2.0]
            .iter()
            .map(|&t| window.phase_at(t))
            .collect();
        assert_eq!(
            phases,
            vec![
                Phase::Hidden,
                Phase::FadingIn,
                Phase::Visible,
                Phase::FadingOut,
                Phase::Hidden
            ]
        );
    }

    #[test]
    fn zero_fades_cut_hard() {
        let window = build_animation(&chunk_between(0.0, 1.0), 0.0, 0.0, 40.0);
        assert_eq!(window.alpha_at(0.0), 1.0);
        assert_eq!(window.alpha_at(0.999), 1.0);
        assert_eq!(window.alpha_at(1.0), 0.0);
        assert_eq!(window.y_offset_at(0.5), 0.0);
    }

    #[test]
    fn zero_fade_in_shows_caption_at_rest() {
        let window = build_animation(&chunk_between(0.0, 1.0), 0.0, 0.15, 40.0);
        assert_eq!(window.alpha_at(0.0), 1.0);
        assert_eq!(window.y_offset_at(0.0), 0.0);
        assert_eq!(window.y_offset_at(-0.5), 0.0);
        assert_eq!(crate::render::offset_expression(&window), "0");
    }
}
