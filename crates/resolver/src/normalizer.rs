//! 스캔 페이로드 정규화
//!
//! [`PayloadNormalizer`]는 디코딩된 텍스트를 해석 파이프라인의 입력으로
//! 변환하는 단일 진입점입니다. 결과는 둘 중 하나입니다.
//!
//! - [`NormalizedScan::Product`]: 구조화 QR 페이로드에서 합성된 제품 레코드
//! - [`NormalizedScan::Lookup`]: 디렉토리 조회에 사용할 원문 텍스트
//!
//! 정규화는 절대 실패하지 않습니다. 깨진 JSON, 빈 입력, 과대 입력은
//! 모두 조회 분기로 강등됩니다.

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, warn};

use shelfguard_core::metrics::{
    RESOLVER_PAYLOADS_NORMALIZED_TOTAL, RESOLVER_STRUCTURED_FALLBACKS_TOTAL,
};
use shelfguard_core::types::{
    CATEGORY_GENERAL, EXPIRY_UNKNOWN, PLACEHOLDER_IMAGE, ProductRecord, ProductStatus,
    ScanPayload, UNKNOWN_BRAND, UNKNOWN_PRODUCT,
};

/// 입력 텍스트 크기 상한 기본값 (바이트)
///
/// QR 코드 한 장의 실용적 상한을 넉넉히 웃도는 값입니다.
const DEFAULT_MAX_INPUT_SIZE: usize = 4096;

/// 정규화 결과
#[derive(Debug, Clone)]
pub enum NormalizedScan {
    /// 구조화 페이로드에서 합성된 제품 레코드
    Product(ProductRecord),
    /// 디렉토리 조회에 사용할 텍스트 (트림됨)
    Lookup(String),
}

/// 스캔 페이로드 정규화기
///
/// 합성 레코드의 ID와 상태 판정 시각을 주입 가능한 소스에서 얻습니다.
/// 기본값은 UUID v4와 현재 시각입니다.
pub struct PayloadNormalizer {
    id_source: Box<dyn Fn() -> String + Send + Sync>,
    clock: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    max_input_size: usize,
}

impl PayloadNormalizer {
    /// 기본 정규화기를 생성합니다 (UUID v4 ID, 시스템 시계).
    pub fn new() -> Self {
        Self {
            id_source: Box::new(|| uuid::Uuid::new_v4().to_string()),
            clock: Box::new(Utc::now),
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 합성 레코드 ID 소스를 교체합니다.
    pub fn with_id_source(
        mut self,
        id_source: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.id_source = Box::new(id_source);
        self
    }

    /// 상태 판정에 사용할 시계를 교체합니다.
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// 입력 크기 상한을 변경합니다.
    pub fn with_max_input_size(mut self, max_input_size: usize) -> Self {
        self.max_input_size = max_input_size;
        self
    }

    /// 디코딩된 텍스트를 정규화합니다.
    ///
    /// 크기 상한을 넘는 입력은 파싱을 시도하지 않고 조회 분기로 보냅니다.
    pub fn normalize(&self, raw: &str) -> NormalizedScan {
        counter!(RESOLVER_PAYLOADS_NORMALIZED_TOTAL).increment(1);
        let trimmed = raw.trim();

        if trimmed.len() > self.max_input_size {
            warn!(
                len = trimmed.len(),
                limit = self.max_input_size,
                "oversized scan payload, skipping structured parse"
            );
            return NormalizedScan::Lookup(trimmed.to_owned());
        }

        match ScanPayload::classify(trimmed) {
            ScanPayload::Structured(payload) => {
                let expiry = payload.expiry.unwrap_or_else(|| EXPIRY_UNKNOWN.to_owned());
                let status = ProductStatus::evaluate(&expiry, (self.clock)());
                let record = ProductRecord {
                    id: (self.id_source)(),
                    // 원문 전체가 바코드 역할을 합니다. 같은 QR을 다시 찍으면
                    // 이력에서 같은 엔트리로 합쳐집니다.
                    barcode: trimmed.to_owned(),
                    name: payload.name.unwrap_or_else(|| UNKNOWN_PRODUCT.to_owned()),
                    brand: payload.brand.unwrap_or_else(|| UNKNOWN_BRAND.to_owned()),
                    category: payload
                        .category
                        .unwrap_or_else(|| CATEGORY_GENERAL.to_owned()),
                    expiry_date: expiry,
                    status,
                    report_count: 0,
                    image_url: PLACEHOLDER_IMAGE.to_owned(),
                };
                debug!(record = %record, "synthesized product from structured payload");
                NormalizedScan::Product(record)
            }
            ScanPayload::Raw(text) => {
                if text.starts_with('{') {
                    // '{'로 시작했지만 파싱에 실패한 경우
                    counter!(RESOLVER_STRUCTURED_FALLBACKS_TOTAL).increment(1);
                }
                NormalizedScan::Lookup(text)
            }
        }
    }
}

impl Default for PayloadNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_normalizer() -> PayloadNormalizer {
        PayloadNormalizer::new()
            .with_id_source(|| "fixed-id".to_owned())
            .with_clock(|| Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap())
    }

    #[test]
    fn structured_payload_synthesizes_product() {
        let normalizer = fixed_normalizer();
        let raw = r#"{"name":"Oat Bar","brand":"Grano","cat":"Snacks","exp":"2026-09-01"}"#;

        match normalizer.normalize(raw) {
            NormalizedScan::Product(record) => {
                assert_eq!(record.id, "fixed-id");
                assert_eq!(record.name, "Oat Bar");
                assert_eq!(record.brand, "Grano");
                assert_eq!(record.category, "Snacks");
                assert_eq!(record.expiry_date, "2026-09-01");
                assert_eq!(record.status, ProductStatus::Safe);
                assert_eq!(record.report_count, 0);
                assert_eq!(record.image_url, PLACEHOLDER_IMAGE);
                assert_eq!(record.barcode, raw);
            }
            NormalizedScan::Lookup(_) => panic!("expected synthesized product"),
        }
    }

    #[test]
    fn missing_fields_use_defaults() {
        let normalizer = fixed_normalizer();
        match normalizer.normalize("{}") {
            NormalizedScan::Product(record) => {
                assert_eq!(record.name, UNKNOWN_PRODUCT);
                assert_eq!(record.brand, UNKNOWN_BRAND);
                assert_eq!(record.category, CATEGORY_GENERAL);
                assert_eq!(record.expiry_date, EXPIRY_UNKNOWN);
                assert_eq!(record.status, ProductStatus::Safe);
            }
            NormalizedScan::Lookup(_) => panic!("expected synthesized product"),
        }
    }

    #[test]
    fn past_expiry_marks_expired() {
        let normalizer = fixed_normalizer();
        match normalizer.normalize(r#"{"name":"Old Milk","exp":"2025-12-01"}"#) {
            NormalizedScan::Product(record) => {
                assert_eq!(record.status, ProductStatus::Expired);
            }
            NormalizedScan::Lookup(_) => panic!("expected synthesized product"),
        }
    }

    #[test]
    fn malformed_json_falls_back_to_lookup() {
        let normalizer = fixed_normalizer();
        match normalizer.normalize("{broken json") {
            NormalizedScan::Lookup(text) => assert_eq!(text, "{broken json"),
            NormalizedScan::Product(_) => panic!("expected lookup fallback"),
        }
    }

    #[test]
    fn plain_barcode_is_lookup() {
        let normalizer = fixed_normalizer();
        match normalizer.normalize("  4780005111223\n") {
            NormalizedScan::Lookup(text) => assert_eq!(text, "4780005111223"),
            NormalizedScan::Product(_) => panic!("expected lookup"),
        }
    }

    #[test]
    fn oversized_input_skips_parse() {
        let normalizer = fixed_normalizer().with_max_input_size(16);
        let big = format!("{{\"name\":\"{}\"}}", "x".repeat(64));
        match normalizer.normalize(&big) {
            NormalizedScan::Lookup(text) => assert_eq!(text, big),
            NormalizedScan::Product(_) => panic!("oversized input must not be parsed"),
        }
    }

    #[test]
    fn default_normalizer_generates_uuid_ids() {
        let normalizer = PayloadNormalizer::default();
        match normalizer.normalize("{}") {
            NormalizedScan::Product(record) => {
                assert_eq!(record.id.len(), 36);
            }
            NormalizedScan::Lookup(_) => panic!("expected synthesized product"),
        }
    }
}
