//! 에러 타입 — 도메인별 에러 정의

/// Shelfguard 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ShelfguardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 캡처 세션 에러
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// 스캔 해석 에러
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 캡처 세션 에러
///
/// 카메라 기동 실패를 사용자에게 그대로 보여줄 수 있는 분류입니다.
/// 디코더 협력자의 원시 에러 문자열은 여기로 변환된 뒤에만 상위로 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// 카메라 권한 거부
    #[error("camera permission denied: grant camera access in your browser or OS settings and retry")]
    PermissionDenied,

    /// 사용 가능한 카메라 없음
    #[error("no camera device found: connect a camera or choose a different device and retry")]
    DeviceNotFound,

    /// 카메라 기동 타임아웃
    #[error("camera did not start within {limit_secs}s: close other apps using the camera and retry")]
    StartTimeout { limit_secs: u64 },

    /// 기타 디바이스 에러
    #[error("camera device error: {0}")]
    Device(String),
}

/// 스캔 해석 에러
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// 제품 디렉토리 조회 실패
    #[error("directory error: {0}")]
    Directory(String),

    /// 채널 통신 실패
    #[error("channel error: {0}")]
    Channel(String),
}
