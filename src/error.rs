//! Error kinds for the capture-to-identification pipeline.
//!
//! Propagation policy:
//! - Acquisition and capture errors surface as a transient, localized banner
//!   and abort only the current attempt.
//! - Chat-send failures are rendered inside the transcript as a bot message,
//!   never as a banner.
//! - Capability absence degrades features silently, except text-to-speech,
//!   which alerts the user once.

use crate::language::Language;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PointLensError>;

/// Typed failure kinds across the pipeline.
#[derive(Debug, Error)]
pub enum PointLensError {
    /// Camera or microphone permission was denied by the user or platform.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No usable capture device, or the device refused the constraints.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The video source has no decoded frame to capture yet.
    #[error("video frame not ready")]
    CaptureNotReady,

    /// Raster or encoder failure while producing the annotated still.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Reasoning-service transport failure, non-success status, or an
    /// empty identification response.
    #[error("reasoning service error: {0}")]
    Service(String),

    /// Multi-turn chat send failure.
    #[error("chat send failed: {0}")]
    Chat(String),

    /// Speech capability absent on this device.
    #[error("speech capability unsupported")]
    SpeechUnsupported,

    /// Invalid or incomplete configuration (missing credentials, bad file).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PointLensError {
    /// Localized, user-visible banner text for this error.
    ///
    /// Chat errors never reach a banner (they are rendered as bot messages),
    /// but a text is provided for completeness.
    pub fn banner(&self, language: Language) -> &'static str {
        match (self, language) {
            (Self::PermissionDenied, Language::En) => {
                "Camera access was denied. Please allow camera permission."
            }
            (Self::PermissionDenied, Language::Ko) => {
                "카메라 접근이 거부되었습니다. 카메라 권한을 허용해 주세요."
            }
            (Self::DeviceUnavailable(_), Language::En) => {
                "The camera could not be started."
            }
            (Self::DeviceUnavailable(_), Language::Ko) => "카메라를 시작할 수 없습니다.",
            (Self::CaptureNotReady, Language::En) => {
                "The video isn't ready yet. Please tap again."
            }
            (Self::CaptureNotReady, Language::Ko) => {
                "영상이 아직 준비되지 않았어요. 다시 탭해 주세요."
            }
            (Self::Capture(_), Language::En) => "Couldn't capture the image. Please tap again.",
            (Self::Capture(_), Language::Ko) => "이미지를 캡처하지 못했어요. 다시 탭해 주세요.",
            (Self::Service(_), Language::En) => {
                "Couldn't identify the object. Please try again."
            }
            (Self::Service(_), Language::Ko) => "물체를 인식하지 못했어요. 다시 시도해 주세요.",
            (Self::Chat(_), Language::En) => "The conversation service is unavailable.",
            (Self::Chat(_), Language::Ko) => "대화 서비스를 사용할 수 없습니다.",
            (Self::SpeechUnsupported, Language::En) => {
                "Speech is not supported on this device."
            }
            (Self::SpeechUnsupported, Language::Ko) => "이 기기는 음성을 지원하지 않습니다.",
            (Self::Config(_), Language::En) => "The app is not configured correctly.",
            (Self::Config(_), Language::Ko) => "앱 설정이 올바르지 않습니다.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banners_are_localized() {
        let err = PointLensError::CaptureNotReady;
        assert_ne!(err.banner(Language::En), err.banner(Language::Ko));
    }

    #[test]
    fn display_includes_detail() {
        let err = PointLensError::Service("HTTP 503".into());
        assert!(err.to_string().contains("HTTP 503"));
    }
}
