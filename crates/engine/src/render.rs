use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::animation::AnimationWindow;
use crate::compiler::CaptionCue;

pub struct RenderCommand {
    pub ffmpeg_args: Vec<String>,
    pub output_path: PathBuf,
}

/// Placement of the caption block on the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionLayout {
    /// Vertical center of the caption as a fraction of frame height.
    #[serde(default = "default_position_y")]
    pub position_y: f64,
    #[serde(default)]
    pub font_file: Option<String>,
}

fn default_position_y() -> f64 {
    0.75
}

impl Default for CaptionLayout {
    fn default() -> Self {
        CaptionLayout {
            position_y: default_position_y(),
            font_file: None,
        }
    }
}

fn num(value: f64) -> String {
    format!("{:.6}", value)
}

/// Escape caption text for a single-quoted drawtext `text` option.
///
/// The option parser strips one level of backslashes before drawtext runs
/// its own `%` expansion and unescaping, so `\` and `%` need two levels.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\\\\\"),
            '\'' => out.push('\u{2019}'),
            '%' => out.push_str("\\\\%"),
            ':' => out.push_str("\\:"),
            _ => out.push(c),
        }
    }
    out
}

/// ffmpeg expression for `AnimationWindow::alpha_at`, valid inside the
/// window (drawtext's `enable` hides the text outside it).
pub fn alpha_expression(window: &AnimationWindow) -> String {
    let fade_in = window.fade_in_duration();
    let fade_out = window.fade_out_duration();

    let fade_out_part = if fade_out > 0.0 {
        format!(
            "if(lt(t,{}),1,({}-t)/{})",
            num(window.fade_out_start),
            num(window.end),
            num(fade_out)
        )
    } else {
        "1".to_string()
    };

    if fade_in > 0.0 {
        format!(
            "if(lt(t,{}),(t-{})/{},{})",
            num(window.fade_in_end),
            num(window.start),
            num(fade_in),
            fade_out_part
        )
    } else {
        fade_out_part
    }
}

/// ffmpeg expression for `AnimationWindow::y_offset_at` inside the window.
pub fn offset_expression(window: &AnimationWindow) -> String {
    let fade_in = window.fade_in_duration();
    if fade_in <= 0.0 || window.slide_offset == 0.0 {
        return "0".to_string();
    }
    format!(
        "if(lt(t,{}),{}*(1-(t-{})/{}),0)",
        num(window.fade_in_end),
        num(window.slide_offset),
        num(window.start),
        num(fade_in)
    )
}

fn drawtext(cue: &CaptionCue, layout: &CaptionLayout) -> String {
    let window = &cue.animation;
    let style = &cue.style;

    let mut options = vec![format!("text='{}'", escape_drawtext(cue.text()))];
    if let Some(font_file) = &layout.font_file {
        options.push(format!("fontfile='{}'", escape_drawtext(font_file)));
    }
    options.push(format!("fontsize={}", style.font_size));
    options.push(format!("fontcolor={}", style.color));
    options.push(format!("bordercolor={}", style.stroke_color));
    options.push(format!("borderw={}", style.stroke_width));
    options.push("x=(w-text_w)/2".to_string());
    options.push(format!(
        "y='h*{}-text_h/2+{}'",
        num(layout.position_y),
        offset_expression(window)
    ));
    options.push(format!("alpha='{}'", alpha_expression(window)));
    options.push(format!(
        "enable='gte(t,{})*lt(t,{})'",
        num(window.start),
        num(window.end)
    ));

    format!("drawtext={}", options.join(":"))
}

/// Filter chain burning every cue into the video stream.
pub fn caption_filter(cues: &[CaptionCue], layout: &CaptionLayout) -> String {
    if cues.is_empty() {
        return "null".to_string();
    }
    cues.iter()
        .map(|cue| drawtext(cue, layout))
        .collect::<Vec<_>>()
        .join(",")
}

/// Generate the ffmpeg command that overlays captions on `video_path`.
/// Audio is copied untouched.
pub fn burn_captions_command(
    video_path: &Path,
    cues: &[CaptionCue],
    layout: &CaptionLayout,
    output_path: PathBuf,
) -> RenderCommand {
    let args = vec![
        "-i".to_string(),
        video_path.to_string_lossy().to_string(),
        "-vf".to_string(),
        caption_filter(cues, layout),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "medium".to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-y".to_string(),
        output_path.to_string_lossy().to_string(),
    ];

    RenderCommand {
        ffmpeg_args: args,
        output_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_captions;
    use crate::source::TimingSource;
    use crate::timeline::{CaptionSettings, CaptionStyle};

    fn window(start: f64, end: f64, fade_in_end: f64, fade_out_start: f64) -> AnimationWindow {
        AnimationWindow {
            start,
            end,
            fade_in_end,
            fade_out_start,
            slide_offset: 40.0,
        }
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape_drawtext("don't"), "don\u{2019}t");
        assert_eq!(escape_drawtext("100%: done"), "100\\\\%\\: done");
        assert_eq!(escape_drawtext("a\\b"), "a\\\\\\\\b");
    }

    /// Undo the option-level unescape ffmpeg applies to a quoted value.
    fn option_unescape(value: &str) -> String {
        let mut out = String::new();
        let mut chars = value.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn percent_survives_option_parsing_escaped() {
        let seen_by_drawtext = option_unescape(&escape_drawtext("Give 100% today."));
        assert_eq!(seen_by_drawtext, "Give 100\\% today.");
        assert!(!seen_by_drawtext.replace("\\%", "").contains('%'));
    }

    #[test]
    fn backslash_survives_option_parsing_escaped() {
        assert_eq!(option_unescape(&escape_drawtext("a\\b")), "a\\\\b");
    }

    #[test]
    fn alpha_expression_has_three_segments() {
        let expr = alpha_expression(&window(1.0, 3.0, 1.2, 2.85));
        assert_eq!(
            expr,
            "if(lt(t,1.200000),(t-1.000000)/0.200000,if(lt(t,2.850000),1,(3.000000-t)/0.150000))"
        );
    }

    #[test]
    fn zero_fades_render_constant_alpha() {
        assert_eq!(alpha_expression(&window(0.0, 1.0, 0.0, 1.0)), "1");
        assert_eq!(offset_expression(&window(0.0, 1.0, 0.0, 1.0)), "0");
    }

    #[test]
    fn offset_expression_slides_during_fade_in() {
        assert_eq!(
            offset_expression(&window(1.0, 3.0, 1.2, 2.85)),
            "if(lt(t,1.200000),40.000000*(1-(t-1.000000)/0.200000),0)"
        );
    }

    #[test]
    fn one_drawtext_per_cue() {
        let track = compile_captions(
            "One two three. Four five.",
            &TimingSource::Unavailable,
            5.0,
            &CaptionSettings::default(),
            &CaptionStyle::default(),
        )
        .unwrap();
        let filter = caption_filter(&track.cues, &CaptionLayout::default());

        assert_eq!(filter.matches("drawtext=").count(), track.cues.len());
        assert!(filter.contains("text='One two three.'"));
        assert!(filter.contains("fontsize=70"));
        assert!(filter.contains("bordercolor=black"));
    }

    #[test]
    fn empty_cue_list_passes_video_through() {
        let cmd = burn_captions_command(
            Path::new("in.mp4"),
            &[],
            &CaptionLayout::default(),
            PathBuf::from("out.mp4"),
        );
        let vf = cmd.ffmpeg_args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(cmd.ffmpeg_args[vf + 1], "null");
        assert_eq!(cmd.ffmpeg_args.last().unwrap(), "out.mp4");
    }
}
