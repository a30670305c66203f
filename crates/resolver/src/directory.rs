//! 제품 디렉토리 조회
//!
//! [`ProductDirectory`]는 스캔 파이프라인과 제품 레코드 저장소 사이의
//! 경계입니다. [`StaticProductDirectory`]는 내장 데모 카탈로그와 JSON
//! 카탈로그 파일을 담는 인메모리 구현입니다.

use std::collections::HashSet;
use std::path::Path;

use metrics::counter;
use tracing::debug;

use shelfguard_core::metrics::{LABEL_RESULT, RESOLVER_LOOKUPS_TOTAL};
use shelfguard_core::types::{ProductRecord, ProductStatus};

use crate::error::DirectoryError;

/// 제품 레코드 조회 인터페이스
///
/// 없는 바코드는 에러가 아니라 `Ok(None)`입니다. 에러는 백엔드 실패에만
/// 사용합니다.
pub trait ProductDirectory: Send + Sync + 'static {
    /// 바코드 정확 일치로 제품을 찾습니다.
    fn find_by_barcode(
        &self,
        barcode: &str,
    ) -> impl Future<Output = Result<Option<ProductRecord>, DirectoryError>> + Send;

    /// 디렉토리의 모든 레코드를 반환합니다.
    fn all(&self) -> impl Future<Output = Result<Vec<ProductRecord>, DirectoryError>> + Send;
}

/// 인메모리 제품 디렉토리
#[derive(Debug)]
pub struct StaticProductDirectory {
    products: Vec<ProductRecord>,
}

impl StaticProductDirectory {
    /// 레코드 목록으로 디렉토리를 만듭니다.
    ///
    /// 카탈로그 안에서 바코드는 유일해야 합니다.
    pub fn new(products: Vec<ProductRecord>) -> Result<Self, DirectoryError> {
        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.barcode.as_str()) {
                return Err(DirectoryError::DuplicateBarcode(product.barcode.clone()));
            }
        }
        Ok(Self { products })
    }

    /// 안전/기한 경과/신고된 제품이 하나씩 담긴 내장 데모 카탈로그
    pub fn demo() -> Self {
        Self {
            products: vec![
                ProductRecord {
                    id: "1".to_owned(),
                    barcode: "4780005111223".to_owned(),
                    name: "Classic Milk 3.2%".to_owned(),
                    brand: "Latto".to_owned(),
                    category: "Dairy".to_owned(),
                    expiry_date: "2026-03-15".to_owned(),
                    status: ProductStatus::Safe,
                    report_count: 0,
                    image_url:
                        "https://images.unsplash.com/photo-1563636619-e91000f21fca?w=400&auto=format&fit=crop"
                            .to_owned(),
                },
                ProductRecord {
                    id: "2".to_owned(),
                    barcode: "4780001234567".to_owned(),
                    name: "Yogurt Strawberry".to_owned(),
                    brand: "Biorich".to_owned(),
                    category: "Dairy".to_owned(),
                    expiry_date: "2025-12-01".to_owned(),
                    status: ProductStatus::Expired,
                    report_count: 12,
                    image_url:
                        "https://images.unsplash.com/photo-1571212215582-45470ecaf34d?w=400&auto=format&fit=crop"
                            .to_owned(),
                },
                ProductRecord {
                    id: "3".to_owned(),
                    barcode: "4780009876543".to_owned(),
                    name: "Mineral Water 1.5L".to_owned(),
                    brand: "Family".to_owned(),
                    category: "Beverages".to_owned(),
                    expiry_date: "2027-01-10".to_owned(),
                    status: ProductStatus::Safe,
                    report_count: 2,
                    image_url:
                        "https://images.unsplash.com/photo-1548919973-5cfe5d4fc474?w=400&auto=format&fit=crop"
                            .to_owned(),
                },
            ],
        }
    }

    /// 레코드 배열이 담긴 JSON 파일에서 카탈로그를 로드합니다.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DirectoryError::CatalogLoad {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
        let products: Vec<ProductRecord> =
            serde_json::from_str(&content).map_err(|e| DirectoryError::CatalogLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::new(products)
    }

    /// 디렉토리의 레코드 수
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// 디렉토리가 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductDirectory for StaticProductDirectory {
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<ProductRecord>, DirectoryError> {
        let found = self.products.iter().find(|p| p.barcode == barcode).cloned();
        let result = if found.is_some() { "hit" } else { "miss" };
        counter!(RESOLVER_LOOKUPS_TOTAL, LABEL_RESULT => result).increment(1);
        debug!(barcode, result, "directory lookup");
        Ok(found)
    }

    async fn all(&self) -> Result<Vec<ProductRecord>, DirectoryError> {
        Ok(self.products.clone())
    }
}
