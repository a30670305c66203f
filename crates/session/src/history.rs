//! 최근 스캔 이력 버퍼
//!
//! [`RecentHistory`]는 바코드 기준으로 중복을 제거하는 고정 용량 버퍼입니다.
//! 같은 제품을 다시 스캔하면 기존 엔트리가 맨 앞으로 이동하며,
//! 용량을 넘으면 가장 오래된 엔트리가 밀려납니다.

use std::collections::VecDeque;

use metrics::gauge;
use tracing::debug;

use shelfguard_core::metrics::SESSION_HISTORY_SIZE;
use shelfguard_core::types::ProductRecord;

/// 이력 기본 용량
pub const DEFAULT_CAPACITY: usize = 5;

/// 최근 스캔 이력
///
/// 엔트리는 최신 순으로 정렬됩니다 (인덱스 0이 가장 최근 스캔).
pub struct RecentHistory {
    entries: VecDeque<ProductRecord>,
    capacity: usize,
    total_pushed: u64,
    deduplicated: u64,
}

impl RecentHistory {
    /// 기본 용량(5)의 이력을 생성합니다.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 지정한 용량의 이력을 생성합니다.
    ///
    /// 용량 0은 1로 보정됩니다.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            total_pushed: 0,
            deduplicated: 0,
        }
    }

    /// 레코드를 이력 맨 앞에 추가합니다.
    ///
    /// 같은 바코드의 기존 엔트리는 제거된 뒤 새 레코드로 대체됩니다.
    /// 기존 엔트리를 대체한 경우 `true`를 반환합니다.
    pub fn push(&mut self, record: ProductRecord) -> bool {
        self.total_pushed += 1;

        let replaced = if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.barcode == record.barcode)
        {
            self.entries.remove(pos);
            self.deduplicated += 1;
            debug!(barcode = record.barcode.as_str(), "history entry refreshed");
            true
        } else {
            false
        };

        self.entries.push_front(record);
        self.entries.truncate(self.capacity);
        gauge!(SESSION_HISTORY_SIZE).set(self.entries.len() as f64);
        replaced
    }

    /// 레코드 ID로 엔트리를 찾습니다.
    pub fn get(&self, id: &str) -> Option<&ProductRecord> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// 가장 최근 엔트리를 반환합니다.
    pub fn latest(&self) -> Option<&ProductRecord> {
        self.entries.front()
    }

    /// 최신 순으로 엔트리를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.entries.iter()
    }

    /// 현재 이력의 복사본을 반환합니다 (최신 순).
    pub fn snapshot(&self) -> Vec<ProductRecord> {
        self.entries.iter().cloned().collect()
    }

    /// 현재 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 이력이 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 이력 용량
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 지금까지 추가된 총 레코드 수
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// 중복 제거로 대체된 엔트리 수
    pub fn deduplicated_count(&self) -> u64 {
        self.deduplicated
    }
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new()
    }
}
