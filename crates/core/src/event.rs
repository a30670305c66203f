//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 캡처와 해석 사이의 모든 통신은 이벤트 기반 메시지 패싱으로 수행됩니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::ScanOutcome;

// --- 모듈명 상수 ---

/// 캡처 세션 모듈명
pub const MODULE_CAPTURE: &str = "capture";
/// 해석기(정규화/디렉토리) 모듈명
pub const MODULE_RESOLVER: &str = "resolver";
/// 세션 오케스트레이터 모듈명
pub const MODULE_SESSION: &str = "session";

// --- 이벤트 타입 상수 ---

/// 디코드 이벤트 타입
pub const EVENT_TYPE_DECODE: &str = "decode";
/// 해석 이벤트 타입
pub const EVENT_TYPE_RESOLUTION: &str = "resolution";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
///
/// 각 이벤트의 발생 시각, 생성 모듈, 추적 ID를 담고 있어
/// 스캔 한 건의 흐름(디코드 → 해석)을 연결할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명 (예: "capture", "session")
    pub source_module: String,
    /// 추적 ID — 같은 스캔 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    ///
    /// 이벤트 체인에서 동일한 추적 ID를 유지할 때 사용합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    ///
    /// 새로운 이벤트 체인의 시작점에서 사용합니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 디코더 협력자가 전달한 디코드 프레임 이벤트
///
/// 외부 디코더가 심볼 하나를 성공적으로 읽을 때마다 생성됩니다.
/// 한 캡처 세션은 이 이벤트를 최대 한 건만 소비합니다.
#[derive(Debug, Clone)]
pub struct DecodeEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 디코딩된 텍스트 (바코드 숫자열 또는 QR 페이로드)
    pub text: String,
    /// 심볼 종류명 (예: "qr", "ean13"), 협력자가 보고하지 않으면 None
    pub symbology: Option<String>,
}

impl DecodeEvent {
    /// 새로운 trace를 시작하는 디코드 이벤트를 생성합니다.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_CAPTURE),
            text: text.into(),
            symbology: None,
        }
    }
}

impl Event for DecodeEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_DECODE
    }
}

impl fmt::Display for DecodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecodeEvent[{}] symbology={} len={}",
            &self.id[..8.min(self.id.len())],
            self.symbology.as_deref().unwrap_or("unknown"),
            self.text.len(),
        )
    }
}

/// 오케스트레이터의 해석 결과 이벤트
///
/// 스캔 한 건이 해석될 때마다 생성되어 표시 계층에 전달됩니다.
#[derive(Debug, Clone)]
pub struct ResolutionEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 해석 결과
    pub outcome: ScanOutcome,
}

impl ResolutionEvent {
    /// 새로운 trace를 시작하는 해석 이벤트를 생성합니다.
    pub fn new(outcome: ScanOutcome) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_SESSION),
            outcome,
        }
    }

    /// 기존 trace에 연결된 해석 이벤트를 생성합니다.
    ///
    /// 디코드 이벤트의 trace_id를 이어받아 스캔 흐름을 연결합니다.
    pub fn with_trace(outcome: ScanOutcome, trace_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_SESSION, trace_id),
            outcome,
        }
    }
}

impl Event for ResolutionEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_RESOLUTION
    }
}

impl fmt::Display for ResolutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResolutionEvent[{}] {}",
            &self.id[..8.min(self.id.len())],
            self.outcome,
        )
    }
}

/// SystemTime을 사람이 읽을 수 있는 형태로 변환합니다.
fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}
