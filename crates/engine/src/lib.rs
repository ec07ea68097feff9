pub mod animation;
pub mod chunker;
pub mod compiler;
pub mod error;
pub mod reconcile;
pub mod render;
pub mod source;
pub mod srt;
pub mod timeline;
pub mod tokenizer;

pub use animation::{build_animation, AnimationWindow, Phase};
pub use chunker::chunk;
pub use compiler::*;
pub use error::CaptionError;
pub use reconcile::{reconcile, repair_timeline, uniform_timings, ReconcileStrategy};
pub use source::{get_raw_timings, TimingSource, TranscribeError, Transcriber};
pub use timeline::*;
pub use tokenizer::tokenize;
