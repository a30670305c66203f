//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `shelfguard_`
//! - 모듈명: `capture_`, `resolver_`, `session_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(shelfguard_core::metrics::CAPTURE_FRAMES_DECODED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 조회 결과 레이블 키 (hit, miss)
pub const LABEL_RESULT: &str = "result";

/// 모듈 레이블 키
pub const LABEL_MODULE: &str = "module";

// ─── Capture 메트릭 ────────────────────────────────────────────────

/// Capture: 기동에 성공한 캡처 세션 수 (counter)
pub const CAPTURE_SESSIONS_STARTED_TOTAL: &str = "shelfguard_capture_sessions_started_total";

/// Capture: 기동에 실패한 캡처 세션 수 (counter)
pub const CAPTURE_SESSIONS_FAILED_TOTAL: &str = "shelfguard_capture_sessions_failed_total";

/// Capture: 세션이 소비한 디코드 프레임 수 (counter)
pub const CAPTURE_FRAMES_DECODED_TOTAL: &str = "shelfguard_capture_frames_decoded_total";

// ─── Resolver 메트릭 ───────────────────────────────────────────────

/// Resolver: 정규화된 스캔 페이로드 수 (counter)
pub const RESOLVER_PAYLOADS_NORMALIZED_TOTAL: &str = "shelfguard_resolver_payloads_normalized_total";

/// Resolver: 구조화 파싱 실패로 원문 조회로 폴백한 수 (counter)
pub const RESOLVER_STRUCTURED_FALLBACKS_TOTAL: &str =
    "shelfguard_resolver_structured_fallbacks_total";

/// Resolver: 제품 디렉토리 조회 수 (counter, label: result)
pub const RESOLVER_LOOKUPS_TOTAL: &str = "shelfguard_resolver_lookups_total";

// ─── Session 메트릭 ────────────────────────────────────────────────

/// Session: 제품 레코드로 해석된 스캔 수 (counter)
pub const SESSION_SCANS_RESOLVED_TOTAL: &str = "shelfguard_session_scans_resolved_total";

/// Session: 디렉토리에 없는 바코드 스캔 수 (counter)
pub const SESSION_UNKNOWN_PRODUCTS_TOTAL: &str = "shelfguard_session_unknown_products_total";

/// Session: 접수된 유통기한 경과 신고 수 (counter)
pub const SESSION_REPORTS_ACKNOWLEDGED_TOTAL: &str =
    "shelfguard_session_reports_acknowledged_total";

/// Session: 현재 스캔 이력 엔트리 수 (gauge)
pub const SESSION_HISTORY_SIZE: &str = "shelfguard_session_history_size";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다. 레코더가 설치되지 않은
/// 상태에서 호출해도 no-op이므로 안전합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    // Capture
    describe_counter!(
        CAPTURE_SESSIONS_STARTED_TOTAL,
        "Total number of capture sessions that reached the active state"
    );
    describe_counter!(
        CAPTURE_SESSIONS_FAILED_TOTAL,
        "Total number of capture sessions that failed to start"
    );
    describe_counter!(
        CAPTURE_FRAMES_DECODED_TOTAL,
        "Total number of decoded frames consumed by capture sessions"
    );

    // Resolver
    describe_counter!(
        RESOLVER_PAYLOADS_NORMALIZED_TOTAL,
        "Total number of scan payloads normalized"
    );
    describe_counter!(
        RESOLVER_STRUCTURED_FALLBACKS_TOTAL,
        "Total number of structured payloads that fell back to raw lookup"
    );
    describe_counter!(
        RESOLVER_LOOKUPS_TOTAL,
        "Total number of product directory lookups (by result: hit, miss)"
    );

    // Session
    describe_counter!(
        SESSION_SCANS_RESOLVED_TOTAL,
        "Total number of scans resolved to a product record"
    );
    describe_counter!(
        SESSION_UNKNOWN_PRODUCTS_TOTAL,
        "Total number of scans for barcodes missing from the directory"
    );
    describe_counter!(
        SESSION_REPORTS_ACKNOWLEDGED_TOTAL,
        "Total number of acknowledged expired-product reports"
    );
    describe_gauge!(
        SESSION_HISTORY_SIZE,
        "Current number of entries in the recent scan history"
    );
}
