use crate::error::MediaError;

/// One extracted key frame with the per-frame measurements used to build a
/// textual summary. All measurements are normalized to `0.0..=1.0`.
#[derive(Debug, Clone)]
pub struct KeyFrame {
    /// PNG-encoded frame image.
    pub png: Vec<u8>,
    pub brightness: f32,
    /// Mean absolute pixel delta against the previous key frame.
    pub motion: f32,
    pub edge_density: f32,
}

/// Key-frame extraction seam. Real decoders (ffmpeg/OpenCV grade) live
/// outside this crate; the default implementation reports that decoding is
/// unavailable so the normalizer can fall back to a guidance note.
pub trait FrameExtractor: Send + Sync {
    fn extract(&self, video: &[u8], max_frames: usize) -> Result<Vec<KeyFrame>, MediaError>;
}

pub struct UnavailableExtractor;

impl FrameExtractor for UnavailableExtractor {
    fn extract(&self, _video: &[u8], _max_frames: usize) -> Result<Vec<KeyFrame>, MediaError> {
        Err(MediaError::ExtractionUnavailable(
            "no video decoder is linked into this build".to_string(),
        ))
    }
}

/// Turns frame measurements into a short natural-language description that
/// text-only models can reason about.
pub fn describe_frames(frames: &[KeyFrame]) -> String {
    let count = frames.len() as f32;
    let brightness = frames.iter().map(|f| f.brightness).sum::<f32>() / count;
    let motion = frames.iter().map(|f| f.motion).sum::<f32>() / count;
    let edge_density = frames.iter().map(|f| f.edge_density).sum::<f32>() / count;

    let brightness_text = if brightness > 0.66 {
        "画面整体明亮"
    } else if brightness > 0.33 {
        "画面亮度适中"
    } else {
        "画面整体偏暗"
    };
    let motion_text = if motion > 0.4 {
        "镜头或主体运动明显"
    } else if motion > 0.1 {
        "画面有少量变化"
    } else {
        "画面基本静止"
    };
    let edge_text = if edge_density > 0.5 {
        "细节纹理丰富"
    } else {
        "构图较为简洁"
    };

    format!(
        "[视频分析] 共提取 {} 个关键帧：{}，{}，{}。第一帧已作为图片附上，请结合图片与用户的文字提问进行回答。",
        frames.len(),
        brightness_text,
        motion_text,
        edge_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(brightness: f32, motion: f32, edge_density: f32) -> KeyFrame {
        KeyFrame {
            png: vec![0u8; 4],
            brightness,
            motion,
            edge_density,
        }
    }

    #[test]
    fn bright_busy_video() {
        let summary = describe_frames(&[frame(0.9, 0.7, 0.8), frame(0.8, 0.6, 0.7)]);
        assert!(summary.contains("共提取 2 个关键帧"));
        assert!(summary.contains("画面整体明亮"));
        assert!(summary.contains("运动明显"));
        assert!(summary.contains("细节纹理丰富"));
    }

    #[test]
    fn dark_static_video() {
        let summary = describe_frames(&[frame(0.1, 0.0, 0.2)]);
        assert!(summary.contains("画面整体偏暗"));
        assert!(summary.contains("画面基本静止"));
        assert!(summary.contains("构图较为简洁"));
    }

    #[test]
    fn unavailable_extractor_reports_error() {
        let result = UnavailableExtractor.extract(b"fake", 8);
        assert!(matches!(result, Err(MediaError::ExtractionUnavailable(_))));
    }
}
