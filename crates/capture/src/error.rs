//! 캡처 세션 에러 타입

use shelfguard_core::error::{CaptureError, ShelfguardError};

/// 캡처 세션에서 발생하는 에러
#[derive(Debug, thiserror::Error)]
pub enum CaptureSessionError {
    /// 디코더 협력자가 보고한 기타 에러
    #[error("decoder error: {0}")]
    Decoder(String),

    /// 카메라 권한 거부
    #[error("camera permission denied")]
    PermissionDenied,

    /// 사용 가능한 카메라 없음
    #[error("no camera device found")]
    DeviceNotFound,

    /// 기동 타임아웃 초과
    #[error("camera start timed out after {limit_secs}s")]
    StartTimeout {
        /// 타임아웃 한도 (초)
        limit_secs: u64,
    },

    /// 활성 상태가 아닌 세션에서 디코드를 기다림
    #[error("capture session is not active")]
    NotActive,

    /// 디코드 대기 중 세션이 종료됨
    #[error("capture session closed while waiting for a decode")]
    SessionClosed,

    /// 세션 설정 오류
    #[error("invalid capture config for '{field}': {reason}")]
    Config {
        /// 문제가 된 설정 필드
        field: String,
        /// 거부 사유
        reason: String,
    },

    /// 프레임 채널 통신 실패
    #[error("frame channel error: {0}")]
    Channel(String),
}

impl From<CaptureSessionError> for ShelfguardError {
    fn from(err: CaptureSessionError) -> Self {
        let capture = match err {
            CaptureSessionError::PermissionDenied => CaptureError::PermissionDenied,
            CaptureSessionError::DeviceNotFound => CaptureError::DeviceNotFound,
            CaptureSessionError::StartTimeout { limit_secs } => {
                CaptureError::StartTimeout { limit_secs }
            }
            other => CaptureError::Device(other.to_string()),
        };
        ShelfguardError::Capture(capture)
    }
}
