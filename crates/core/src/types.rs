//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 제품 레코드, 스캔 페이로드, 해석 결과 등 모든 모듈이 공유하는
//! 데이터 구조를 정의합니다.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// --- 합성 레코드 기본값 상수 ---

/// 구조화 페이로드에 이름이 없을 때 사용하는 기본 제품명
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
/// 구조화 페이로드에 브랜드가 없을 때 사용하는 기본 브랜드명
pub const UNKNOWN_BRAND: &str = "Unknown Brand";
/// 구조화 페이로드에 카테고리가 없을 때 사용하는 기본 카테고리
pub const CATEGORY_GENERAL: &str = "General";
/// 유통기한 미상을 나타내는 센티넬 값
pub const EXPIRY_UNKNOWN: &str = "N/A";
/// 합성 레코드에 사용하는 대체 이미지 URL
pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1540340061722-9293d5163008?w=400&auto=format&fit=crop";

/// 제품 안전 상태
///
/// 저장된 값이 아니라 유통기한으로부터 파생되는 판정입니다.
/// 디렉토리 조회 시점마다 [`ProductStatus::evaluate`]로 다시 계산됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// 안전 (유통기한 이내 또는 판정 불가)
    #[default]
    Safe,
    /// 유통기한 경과
    Expired,
}

impl ProductStatus {
    /// 유통기한 문자열을 기준 시각과 비교하여 상태를 판정합니다.
    ///
    /// 지원 형식:
    /// - RFC 3339: `2026-03-15T00:00:00Z`
    /// - 날짜만: `2026-03-15` (UTC 자정으로 해석)
    ///
    /// 파싱된 시각이 `now`보다 엄격히 이전이면 [`Expired`](Self::Expired)입니다.
    /// `"N/A"`, 빈 문자열, 파싱 불가능한 값은 모두 [`Safe`](Self::Safe)로
    /// 판정합니다. 판정 불가능한 제품을 기한 경과로 표시하지 않습니다.
    pub fn evaluate(expiry: &str, now: DateTime<Utc>) -> Self {
        let trimmed = expiry.trim();
        if trimmed.is_empty() || trimmed == EXPIRY_UNKNOWN {
            return Self::Safe;
        }

        let parsed = DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            });

        match parsed {
            Ok(expiry_at) if expiry_at < now => Self::Expired,
            Ok(_) => Self::Safe,
            Err(_) => Self::Safe,
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// 제품 레코드
///
/// 디렉토리에 등록된 제품 또는 구조화 페이로드에서 합성된 제품을 나타냅니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// 레코드 고유 ID
    pub id: String,
    /// 바코드 (디렉토리 내에서 유일)
    pub barcode: String,
    /// 제품명
    pub name: String,
    /// 브랜드명
    pub brand: String,
    /// 카테고리
    pub category: String,
    /// 유통기한 문자열 (`YYYY-MM-DD` 또는 `"N/A"`)
    pub expiry_date: String,
    /// 안전 상태 (해석 시점에 재계산됨)
    pub status: ProductStatus,
    /// 커뮤니티 신고 횟수
    pub report_count: u32,
    /// 제품 이미지 URL
    pub image_url: String,
}

impl fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) [{}] barcode={} exp={}",
            self.name, self.brand, self.status, self.barcode, self.expiry_date,
        )
    }
}

/// 구조화 QR 페이로드
///
/// QR 코드에 직접 담긴 JSON 객체의 serde 뷰입니다.
/// 모든 필드가 선택적이며 알 수 없는 키는 무시됩니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredPayload {
    /// 제품명
    pub name: Option<String>,
    /// 브랜드명
    pub brand: Option<String>,
    /// 카테고리 (와이어 키: `cat`)
    #[serde(rename = "cat")]
    pub category: Option<String>,
    /// 유통기한 (와이어 키: `exp`)
    #[serde(rename = "exp")]
    pub expiry: Option<String>,
}

/// 스캔 페이로드 분류 결과
///
/// 정규화 진입점에서 단 한 번 생성됩니다. `{`로 시작하는 텍스트는
/// 구조화 페이로드로 파싱을 시도하고, 실패하면 원문 그대로
/// [`Raw`](Self::Raw)로 강등됩니다. 분류는 절대 실패하지 않습니다.
#[derive(Debug, Clone)]
pub enum ScanPayload {
    /// 파싱에 성공한 구조화 페이로드
    Structured(StructuredPayload),
    /// 디렉토리 조회에 사용할 원문 텍스트 (트림됨)
    Raw(String),
}

impl ScanPayload {
    /// 디코딩된 텍스트를 분류합니다.
    ///
    /// 입력은 먼저 트림됩니다. 구조화 페이로드 파싱 실패는 에러가 아니라
    /// [`Raw`](Self::Raw) 분기입니다.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            match serde_json::from_str::<StructuredPayload>(trimmed) {
                Ok(payload) => return Self::Structured(payload),
                Err(e) => {
                    tracing::debug!(
                        error = %e,
                        "structured payload parse failed, falling back to raw lookup"
                    );
                }
            }
        }
        Self::Raw(trimmed.to_owned())
    }
}

/// 스캔 해석 결과
///
/// 오케스트레이터가 표시 계층에 돌려주는 최종 결과입니다.
/// [`Unknown`](Self::Unknown)은 정상 분기이며, 미등록 제품 신고를
/// 유도하는 용도로 사용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// 제품이 해석됨 (디렉토리 조회 또는 페이로드 합성)
    Resolved(ProductRecord),
    /// 디렉토리에 없는 바코드
    Unknown {
        /// 조회에 사용된 바코드 텍스트
        barcode: String,
    },
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(record) => write!(f, "resolved: {record}"),
            Self::Unknown { barcode } => write!(f, "unknown barcode: {barcode}"),
        }
    }
}
