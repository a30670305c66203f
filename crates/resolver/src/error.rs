//! 디렉토리 에러 타입

use shelfguard_core::error::{ResolveError, ShelfguardError};

/// 제품 디렉토리에서 발생하는 에러
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// 카탈로그에 중복된 바코드가 있음
    #[error("duplicate barcode in catalog: {0}")]
    DuplicateBarcode(String),

    /// 카탈로그 파일 로딩 실패
    #[error("failed to load catalog '{path}': {reason}")]
    CatalogLoad {
        /// 카탈로그 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 백엔드 조회 실패
    #[error("directory backend error: {0}")]
    Backend(String),
}

impl From<DirectoryError> for ShelfguardError {
    fn from(err: DirectoryError) -> Self {
        ShelfguardError::Resolve(ResolveError::Directory(err.to_string()))
    }
}
