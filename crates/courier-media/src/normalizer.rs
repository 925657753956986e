use std::sync::Arc;

use tracing::{debug, warn};

use crate::data_uri::{audio_extension, DataUri};
use crate::frames::{describe_frames, FrameExtractor, UnavailableExtractor};
use crate::message::IncomingMessage;
use crate::stt::TranscriberChain;

const AUDIO_FALLBACK_NOTE: &str =
    "（用户发送了一段音频，转写失败，请结合用户的文字描述进行回答。）";
const VIDEO_FALLBACK_NOTE: &str =
    "（用户发送了一段视频，无法解析画面，请让用户用文字描述视频中的场景、动作、时间线和关键事件。）";

const DEFAULT_MAX_FRAMES: usize = 8;

/// Flattens audio/video attachments into text annotations so every provider
/// receives at most text plus a single image. After `normalize` no message
/// carries an `audio` or `video` payload.
pub struct Normalizer {
    transcriber: TranscriberChain,
    extractor: Arc<dyn FrameExtractor>,
    max_frames: usize,
}

impl Normalizer {
    pub fn new(transcriber: TranscriberChain) -> Self {
        Self {
            transcriber,
            extractor: Arc::new(UnavailableExtractor),
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn FrameExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub async fn normalize(&self, messages: Vec<IncomingMessage>) -> Vec<IncomingMessage> {
        let mut normalized = Vec::with_capacity(messages.len());
        for message in messages {
            normalized.push(self.normalize_one(message).await);
        }
        normalized
    }

    async fn normalize_one(&self, mut message: IncomingMessage) -> IncomingMessage {
        if let Some(audio) = message.audio.take() {
            let annotation = self.flatten_audio(&audio).await;
            push_annotation(&mut message.text, &annotation);
        }

        if let Some(video) = message.video.take() {
            let (annotation, frame_image) = self.flatten_video(&video);
            push_annotation(&mut message.text, &annotation);
            // The caller's own image wins over an extracted frame.
            if message.image.is_none() {
                message.image = frame_image;
            }
        }

        message
    }

    async fn flatten_audio(&self, audio: &str) -> String {
        let parsed = match DataUri::parse(audio) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(error = %error, "unreadable audio attachment");
                return AUDIO_FALLBACK_NOTE.to_string();
            }
        };

        let file_name = format!("audio.{}", audio_extension(&parsed.mime));
        match self.transcriber.transcribe(parsed.data, &file_name, None).await {
            Ok(transcript) if !transcript.text.trim().is_empty() => {
                debug!(provider = %transcript.provider, "audio transcribed");
                format!("[语音转写] “{}”", transcript.text.trim())
            }
            Ok(_) => AUDIO_FALLBACK_NOTE.to_string(),
            Err(error) => {
                warn!(error = %error, "audio transcription failed");
                AUDIO_FALLBACK_NOTE.to_string()
            }
        }
    }

    fn flatten_video(&self, video: &str) -> (String, Option<String>) {
        let parsed = match DataUri::parse(video) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(error = %error, "unreadable video attachment");
                return (VIDEO_FALLBACK_NOTE.to_string(), None);
            }
        };

        match self.extractor.extract(&parsed.data, self.max_frames) {
            Ok(frames) if !frames.is_empty() => {
                let image = DataUri::encode("image/png", &frames[0].png);
                (describe_frames(&frames), Some(image))
            }
            Ok(_) => (VIDEO_FALLBACK_NOTE.to_string(), None),
            Err(error) => {
                warn!(error = %error, "key-frame extraction failed");
                (VIDEO_FALLBACK_NOTE.to_string(), None)
            }
        }
    }
}

fn push_annotation(text: &mut String, annotation: &str) {
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(annotation);
}
