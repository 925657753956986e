use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use courier_media::data_uri::{audio_extension, DataUri};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;

/// Router-level body ceiling; kept above the largest per-kind limit so the
/// 400 always comes from our validator, not the framework.
pub const MAX_UPLOAD_BODY_BYTES: usize = 56 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Audio,
    Video,
}

impl UploadKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Image => "图片",
            Self::Audio => "音频",
            Self::Video => "视频",
        }
    }

    fn max_bytes(&self) -> usize {
        match self {
            Self::Image => MAX_IMAGE_BYTES,
            Self::Audio => MAX_AUDIO_BYTES,
            Self::Video => MAX_VIDEO_BYTES,
        }
    }

    fn limit_label(&self) -> &'static str {
        match self {
            Self::Image => "4MB",
            Self::Audio => "10MB",
            Self::Video => "50MB",
        }
    }

    fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Image => &["png", "jpg", "jpeg", "gif", "webp", "bmp"],
            Self::Audio => &["mp3", "wav", "m4a", "ogg", "webm", "flac", "aac"],
            Self::Video => &["mp4", "mov", "avi", "mkv", "webm"],
        }
    }

    fn mime_for(&self, extension: &str) -> &'static str {
        match (self, extension) {
            (Self::Image, "png") => "image/png",
            (Self::Image, "jpg" | "jpeg") => "image/jpeg",
            (Self::Image, "gif") => "image/gif",
            (Self::Image, "webp") => "image/webp",
            (Self::Image, "bmp") => "image/bmp",
            (Self::Audio, "mp3") => "audio/mpeg",
            (Self::Audio, "wav") => "audio/wav",
            (Self::Audio, "m4a") => "audio/mp4",
            (Self::Audio, "ogg") => "audio/ogg",
            (Self::Audio, "webm") => "audio/webm",
            (Self::Audio, "flac") => "audio/flac",
            (Self::Audio, "aac") => "audio/aac",
            (Self::Video, "mp4") => "video/mp4",
            (Self::Video, "mov") => "video/quicktime",
            (Self::Video, "avi") => "video/x-msvideo",
            (Self::Video, "mkv") => "video/x-matroska",
            (Self::Video, "webm") => "video/webm",
            _ => "application/octet-stream",
        }
    }
}

/// Checks extension allow-list and size ceiling; returns the MIME type for
/// the data URI on success. The exact limit is accepted, one byte over is
/// not.
pub fn validate_upload(
    kind: UploadKind,
    file_name: &str,
    size: usize,
) -> Result<&'static str, ApiError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest(format!("{}文件缺少扩展名", kind.label())))?;

    if !kind.allowed_extensions().contains(&extension.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "不支持的{}格式: .{}，支持的格式: {}",
            kind.label(),
            extension,
            kind.allowed_extensions().join("、"),
        )));
    }

    if size == 0 {
        return Err(ApiError::BadRequest(format!("{}文件为空", kind.label())));
    }

    if size > kind.max_bytes() {
        return Err(ApiError::BadRequest(format!(
            "{}文件太大，不能超过{}",
            kind.label(),
            kind.limit_label(),
        )));
    }

    Ok(kind.mime_for(&extension))
}

#[derive(Debug, Serialize)]
pub struct UploadReply {
    pub success: bool,
    pub data_url: String,
    pub file_name: String,
    pub file_size: usize,
    pub mime_type: &'static str,
}

async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("无效的上传请求: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("读取上传内容失败: {e}")))?;
            return Ok((file_name, data.to_vec()));
        }
    }
    Err(ApiError::BadRequest("缺少文件字段 file".to_string()))
}

async fn handle_upload(kind: UploadKind, multipart: Multipart) -> ApiResult<Json<UploadReply>> {
    let (file_name, data) = read_file_field(multipart).await?;
    let mime_type = validate_upload(kind, &file_name, data.len())?;

    Ok(Json(UploadReply {
        success: true,
        data_url: DataUri::encode(mime_type, &data),
        file_name,
        file_size: data.len(),
        mime_type,
    }))
}

pub async fn upload_image(multipart: Multipart) -> ApiResult<Json<UploadReply>> {
    handle_upload(UploadKind::Image, multipart).await
}

pub async fn upload_audio(multipart: Multipart) -> ApiResult<Json<UploadReply>> {
    handle_upload(UploadKind::Audio, multipart).await
}

pub async fn upload_video(multipart: Multipart) -> ApiResult<Json<UploadReply>> {
    handle_upload(UploadKind::Video, multipart).await
}

#[derive(Debug, Deserialize)]
pub struct RecordBody {
    pub audio_data: String,

    #[serde(default)]
    pub transcribe: bool,

    #[serde(default)]
    pub language: Option<String>,

    /// Client-side transcript; takes precedence over server-side
    /// transcription when present.
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordReply {
    pub success: bool,
    pub data_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_source: Option<&'static str>,
}

/// Accepts an in-browser recording as a data URI and optionally transcribes
/// it.
pub async fn upload_record(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecordBody>,
) -> ApiResult<Json<RecordReply>> {
    let parsed = DataUri::parse(&body.audio_data)
        .map_err(|e| ApiError::BadRequest(format!("无效的音频数据: {e}")))?;
    if parsed.data.len() > MAX_AUDIO_BYTES {
        return Err(ApiError::BadRequest("音频文件太大，不能超过10MB".to_string()));
    }

    let (transcript, transcript_source) = match body.transcript.filter(|t| !t.trim().is_empty()) {
        Some(transcript) => (Some(transcript), Some("client")),
        None if body.transcribe => {
            let file_name = format!("recording.{}", audio_extension(&parsed.mime));
            match state
                .transcriber
                .transcribe(parsed.data, &file_name, body.language)
                .await
            {
                Ok(result) => (Some(result.text), Some("server")),
                Err(error) => {
                    warn!(error = %error, "recording transcription failed");
                    (None, None)
                }
            }
        }
        None => (None, None),
    };

    Ok(Json(RecordReply {
        success: true,
        data_url: body.audio_data,
        transcript,
        transcript_source,
    }))
}
