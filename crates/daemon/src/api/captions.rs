use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use engine::render::{burn_captions_command, CaptionLayout};
use engine::srt::to_srt;
use engine::{caption_narration, CaptionError, CaptionSettings, CaptionStyle, CaptionTrack, Transcriber};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::DaemonConfig;
use crate::db::Database;
use crate::media::ffmpeg::FFmpegWrapper;
use crate::transcribe::{CachedTranscriber, MlServiceTranscriber};

type AppState = (Arc<Database>, Arc<DaemonConfig>);

#[derive(Deserialize, Clone, Debug)]
pub struct CaptionRequest {
    pub text: String,
    pub audio_path: String,
    /// Narration length in seconds; probed from the audio when absent.
    pub duration: Option<f64>,
    pub style: Option<CaptionStyle>,
    pub settings: Option<CaptionSettings>,
}

#[derive(Deserialize, Debug)]
pub struct BurnRequest {
    #[serde(flatten)]
    pub captions: CaptionRequest,
    pub video_path: String,
    pub output_path: String,
    pub layout: Option<CaptionLayout>,
}

#[derive(Serialize)]
pub struct BurnResponse {
    output_path: String,
    cue_count: usize,
}

pub fn router(db: Arc<Database>, config: Arc<DaemonConfig>) -> Router {
    Router::new()
        .route("/", post(create_captions))
        .route("/srt", post(export_srt))
        .route("/burn", post(burn_captions))
        .with_state((db, config))
}

fn status_for(err: &CaptionError) -> StatusCode {
    match err {
        CaptionError::EmptyText | CaptionError::InvalidDuration(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CaptionError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
    }
}

/// Cache-backed ML service transcriber, or `None` when no service is
/// configured or its client cannot be built. Blocking: call off the runtime.
fn configured_transcriber(
    db: Arc<Database>,
    config: &DaemonConfig,
    request_id: Uuid,
) -> Option<CachedTranscriber> {
    let url = config.ml_service_url.as_deref()?;
    match MlServiceTranscriber::new(url, config.transcribe_timeout) {
        Ok(service) => Some(CachedTranscriber::new(db, Box::new(service))),
        Err(e) => {
            warn!(%request_id, "transcription client unavailable: {:?}", e);
            None
        }
    }
}

/// Run the caption engine for one request on the blocking pool.
async fn build_track(
    db: Arc<Database>,
    config: Arc<DaemonConfig>,
    req: CaptionRequest,
) -> Result<CaptionTrack, StatusCode> {
    let request_id = Uuid::new_v4();
    let audio_path = PathBuf::from(&req.audio_path);

    let duration = match req.duration {
        Some(duration) => duration,
        None => FFmpegWrapper::probe_duration(&audio_path).await.map_err(|e| {
            warn!(%request_id, "could not probe narration duration: {:?}", e);
            StatusCode::BAD_REQUEST
        })?,
    };

    let settings = req
        .settings
        .unwrap_or_else(|| config.caption_settings.clone());
    let style = req.style.unwrap_or_else(|| config.caption_style.clone());
    let text = req.text;

    let result = tokio::task::spawn_blocking(move || {
        let transcriber = configured_transcriber(db, &config, request_id);
        caption_narration(
            &text,
            &audio_path,
            duration,
            transcriber.as_ref().map(|t| t as &dyn Transcriber),
            &settings,
            &style,
        )
    })
    .await
    .map_err(|e| {
        error!(%request_id, "caption task panicked: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match result {
        Ok(track) => {
            info!(
                %request_id,
                "built {} captions from {} tokens ({:?} timing)",
                track.cues.len(),
                track.token_count,
                track.strategy
            );
            Ok(track)
        }
        Err(e) => {
            warn!(%request_id, "rejected caption request: {}", e);
            Err(status_for(&e))
        }
    }
}

async fn create_captions(
    State((db, config)): State<AppState>,
    Json(req): Json<CaptionRequest>,
) -> Result<Json<CaptionTrack>, StatusCode> {
    let track = build_track(db, config, req).await?;
    Ok(Json(track))
}

async fn export_srt(
    State((db, config)): State<AppState>,
    Json(req): Json<CaptionRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let track = build_track(db, config, req).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/x-subrip; charset=utf-8")],
        to_srt(&track.cues),
    ))
}

async fn burn_captions(
    State((db, config)): State<AppState>,
    Json(req): Json<BurnRequest>,
) -> Result<Json<BurnResponse>, StatusCode> {
    let video_path = PathBuf::from(&req.video_path);
    if !video_path.exists() {
        return Err(StatusCode::NOT_FOUND);
    }

    let track = build_track(db, config, req.captions).await?;
    let layout = req.layout.unwrap_or_default();
    let command = burn_captions_command(
        &video_path,
        &track.cues,
        &layout,
        PathBuf::from(&req.output_path),
    );

    FFmpegWrapper::run(&command).await.map_err(|e| {
        error!("caption burn failed: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(BurnResponse {
        output_path: req.output_path,
        cue_count: track.cues.len(),
    }))
}
