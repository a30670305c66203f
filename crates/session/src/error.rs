//! 오케스트레이터 에러 타입

use shelfguard_capture::CaptureSessionError;
use shelfguard_core::error::{ConfigError, ResolveError, ShelfguardError};
use shelfguard_resolver::DirectoryError;

/// 스캔 오케스트레이터에서 발생하는 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanOrchestratorError {
    /// 캡처 세션 에러
    #[error("capture error: {0}")]
    Capture(#[from] CaptureSessionError),

    /// 제품 디렉토리 에러
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// 해석 이벤트 채널 에러
    #[error("resolution channel error: {0}")]
    Channel(String),

    /// 빌더 설정 오류
    #[error("invalid orchestrator config for '{field}': {reason}")]
    Config {
        /// 문제가 된 설정 필드
        field: String,
        /// 거부 사유
        reason: String,
    },
}

impl From<ScanOrchestratorError> for ShelfguardError {
    fn from(err: ScanOrchestratorError) -> Self {
        match err {
            ScanOrchestratorError::Capture(e) => e.into(),
            ScanOrchestratorError::Directory(e) => e.into(),
            ScanOrchestratorError::Channel(msg) => {
                ShelfguardError::Resolve(ResolveError::Channel(msg))
            }
            ScanOrchestratorError::Config { field, reason } => {
                ShelfguardError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
