//! 스캔 오케스트레이터
//!
//! [`ScanOrchestrator`]는 스캔 한 건의 전체 흐름을 관리합니다.
//!
//! ```text
//! 디코드 텍스트 ─▶ 정규화 ─┬─▶ 합성 레코드 ────────────┐
//!                          └─▶ 디렉토리 조회 ─┬─▶ 적중 ─┴─▶ 선택 + 이력 + 이벤트
//!                                             └─▶ 미적중 ─▶ Unknown (선택 유지)
//! ```
//!
//! 해석된 레코드의 안전 상태는 저장된 값이 아니라 해석 시점의 시계로
//! 다시 판정합니다. 어제 안전했던 제품이 오늘 기한 경과로 나올 수 있습니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use shelfguard_capture::{BarcodeDecoder, CaptureSession};
use shelfguard_core::event::ResolutionEvent;
use shelfguard_core::metrics::{
    SESSION_REPORTS_ACKNOWLEDGED_TOTAL, SESSION_SCANS_RESOLVED_TOTAL,
    SESSION_UNKNOWN_PRODUCTS_TOTAL,
};
use shelfguard_core::types::{ProductRecord, ProductStatus, ScanOutcome};
use shelfguard_resolver::{NormalizedScan, PayloadNormalizer, ProductDirectory};

use crate::error::ScanOrchestratorError;
use crate::history::RecentHistory;

/// 해석 이벤트 채널 버퍼 기본 크기
const DEFAULT_RESOLUTION_CHANNEL_CAPACITY: usize = 32;

/// 스캔 세션 오케스트레이터
///
/// 빌더([`ScanOrchestratorBuilder`])로 조립합니다.
pub struct ScanOrchestrator<P: ProductDirectory> {
    directory: Arc<P>,
    normalizer: PayloadNormalizer,
    history: RecentHistory,
    selected: Option<ProductRecord>,
    resolution_tx: mpsc::Sender<ResolutionEvent>,
    clock: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    scans_resolved: u64,
    unknown_products: u64,
    reports_acknowledged: u64,
}

impl<P: ProductDirectory> ScanOrchestrator<P> {
    /// 빌더를 반환합니다.
    pub fn builder() -> ScanOrchestratorBuilder<P> {
        ScanOrchestratorBuilder::new()
    }

    /// 디코딩된 텍스트 한 건을 해석합니다.
    ///
    /// 해석된 레코드는 선택 상태가 되고 이력에 추가됩니다.
    /// 미등록 바코드는 `Unknown`을 반환하며 선택 상태를 바꾸지 않습니다.
    pub async fn submit_scan(
        &mut self,
        raw: &str,
    ) -> Result<ScanOutcome, ScanOrchestratorError> {
        self.resolve(raw, None).await
    }

    async fn resolve(
        &mut self,
        raw: &str,
        trace_id: Option<String>,
    ) -> Result<ScanOutcome, ScanOrchestratorError> {
        match self.normalizer.normalize(raw) {
            NormalizedScan::Product(record) => Ok(self.finish_resolved(record, trace_id)),
            NormalizedScan::Lookup(barcode) => {
                match self.directory.find_by_barcode(&barcode).await? {
                    Some(mut record) => {
                        // 저장된 상태는 과거 판정입니다. 지금 기준으로 다시 계산합니다.
                        record.status =
                            ProductStatus::evaluate(&record.expiry_date, (self.clock)());
                        Ok(self.finish_resolved(record, trace_id))
                    }
                    None => {
                        self.unknown_products += 1;
                        counter!(SESSION_UNKNOWN_PRODUCTS_TOTAL).increment(1);
                        info!(barcode = barcode.as_str(), "scan resolved to unknown product");
                        let outcome = ScanOutcome::Unknown {
                            barcode: barcode.clone(),
                        };
                        self.publish(resolution_event(outcome.clone(), trace_id));
                        Ok(outcome)
                    }
                }
            }
        }
    }

    /// 캡처 세션 한 건을 구동하여 프레임을 받고 해석합니다.
    ///
    /// 기동이나 디코드가 실패하면 세션을 정리한 뒤 에러를 반환합니다.
    pub async fn run_capture<D: BarcodeDecoder>(
        &mut self,
        session: &mut CaptureSession<D>,
    ) -> Result<ScanOutcome, ScanOrchestratorError> {
        if let Err(err) = session.start().await {
            session.close().await;
            return Err(err.into());
        }

        let decode = match session.next_decode().await {
            Ok(decode) => decode,
            Err(err) => {
                session.close().await;
                return Err(err.into());
            }
        };
        session.close().await;

        debug!(event = %decode, "capture session produced a decode");
        // 디코드 이벤트의 trace_id를 해석 이벤트로 이어 스캔 흐름을 연결합니다.
        let trace_id = decode.metadata.trace_id.clone();
        self.resolve(&decode.text, Some(trace_id)).await
    }

    /// 이력 엔트리를 ID로 선택합니다. 없으면 `false`를 반환합니다.
    pub fn select_history_entry(&mut self, id: &str) -> bool {
        match self.history.get(id) {
            Some(record) => {
                self.selected = Some(record.clone());
                true
            }
            None => false,
        }
    }

    /// 현재 선택된 레코드
    pub fn selected(&self) -> Option<&ProductRecord> {
        self.selected.as_ref()
    }

    /// 선택을 해제합니다.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// 최근 스캔 이력
    pub fn history(&self) -> &RecentHistory {
        &self.history
    }

    /// 선택된 기한 경과 제품에 대한 신고를 접수합니다.
    ///
    /// 선택된 레코드가 기한 경과 상태일 때만 접수되며, 접수 후 선택이
    /// 해제됩니다. 접수되면 `true`를 반환합니다.
    pub fn report_expired(&mut self) -> bool {
        match &self.selected {
            Some(record) if record.status == ProductStatus::Expired => {
                self.reports_acknowledged += 1;
                counter!(SESSION_REPORTS_ACKNOWLEDGED_TOTAL).increment(1);
                info!(
                    barcode = record.barcode.as_str(),
                    name = record.name.as_str(),
                    "expired product report acknowledged"
                );
                self.selected = None;
                true
            }
            _ => false,
        }
    }

    /// 제품으로 해석된 스캔 수
    pub fn scans_resolved(&self) -> u64 {
        self.scans_resolved
    }

    /// 미등록 바코드 스캔 수
    pub fn unknown_products(&self) -> u64 {
        self.unknown_products
    }

    /// 접수된 신고 수
    pub fn reports_acknowledged(&self) -> u64 {
        self.reports_acknowledged
    }

    fn finish_resolved(&mut self, record: ProductRecord, trace_id: Option<String>) -> ScanOutcome {
        self.scans_resolved += 1;
        counter!(SESSION_SCANS_RESOLVED_TOTAL).increment(1);
        info!(record = %record, "scan resolved");

        self.selected = Some(record.clone());
        self.history.push(record.clone());

        let outcome = ScanOutcome::Resolved(record);
        self.publish(resolution_event(outcome.clone(), trace_id));
        outcome
    }

    fn publish(&self, event: ResolutionEvent) {
        // 구독자가 밀려 있어도 스캔 흐름은 막지 않습니다.
        if let Err(err) = self.resolution_tx.try_send(event) {
            debug!(error = %err, "resolution event dropped");
        }
    }
}

/// trace_id가 있으면 기존 스캔 흐름에 연결된 해석 이벤트를 만듭니다.
fn resolution_event(outcome: ScanOutcome, trace_id: Option<String>) -> ResolutionEvent {
    match trace_id {
        Some(trace_id) => ResolutionEvent::with_trace(outcome, trace_id),
        None => ResolutionEvent::new(outcome),
    }
}

/// [`ScanOrchestrator`] 빌더
pub struct ScanOrchestratorBuilder<P: ProductDirectory> {
    directory: Option<Arc<P>>,
    normalizer: Option<PayloadNormalizer>,
    history_capacity: usize,
    resolution_tx: Option<mpsc::Sender<ResolutionEvent>>,
    resolution_channel_capacity: usize,
    clock: Option<Box<dyn Fn() -> DateTime<Utc> + Send + Sync>>,
}

impl<P: ProductDirectory> ScanOrchestratorBuilder<P> {
    fn new() -> Self {
        Self {
            directory: None,
            normalizer: None,
            history_capacity: crate::history::DEFAULT_CAPACITY,
            resolution_tx: None,
            resolution_channel_capacity: DEFAULT_RESOLUTION_CHANNEL_CAPACITY,
            clock: None,
        }
    }

    /// 제품 디렉토리를 설정합니다 (필수).
    pub fn directory(mut self, directory: Arc<P>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// 정규화기를 교체합니다. 기본값은 [`PayloadNormalizer::new`]입니다.
    pub fn normalizer(mut self, normalizer: PayloadNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// 이력 용량을 설정합니다. 기본값은 5입니다.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// 외부에서 만든 해석 이벤트 송신자를 사용합니다.
    ///
    /// 설정하면 `build()`가 수신자를 만들지 않습니다.
    pub fn resolution_sender(mut self, tx: mpsc::Sender<ResolutionEvent>) -> Self {
        self.resolution_tx = Some(tx);
        self
    }

    /// 내부 생성 채널의 버퍼 크기를 설정합니다. 기본값은 32입니다.
    pub fn resolution_channel_capacity(mut self, capacity: usize) -> Self {
        self.resolution_channel_capacity = capacity;
        self
    }

    /// 상태 재판정에 사용할 시계를 교체합니다.
    pub fn clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// 오케스트레이터를 조립합니다.
    ///
    /// 외부 송신자를 설정하지 않았다면 해석 이벤트 수신자를 함께 반환합니다.
    pub fn build(
        self,
    ) -> Result<(ScanOrchestrator<P>, Option<mpsc::Receiver<ResolutionEvent>>), ScanOrchestratorError>
    {
        let Some(directory) = self.directory else {
            return Err(ScanOrchestratorError::Config {
                field: "directory".to_owned(),
                reason: "product directory is required".to_owned(),
            });
        };
        if self.resolution_channel_capacity == 0 {
            return Err(ScanOrchestratorError::Config {
                field: "resolution_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let (resolution_tx, resolution_rx) = match self.resolution_tx {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = mpsc::channel(self.resolution_channel_capacity);
                (tx, Some(rx))
            }
        };

        if self.history_capacity == 0 {
            warn!("history capacity 0 clamped to 1");
        }

        let orchestrator = ScanOrchestrator {
            directory,
            normalizer: self.normalizer.unwrap_or_default(),
            history: RecentHistory::with_capacity(self.history_capacity),
            selected: None,
            resolution_tx,
            clock: self.clock.unwrap_or_else(|| Box::new(Utc::now)),
            scans_resolved: 0,
            unknown_products: 0,
            reports_acknowledged: 0,
        };
        Ok((orchestrator, resolution_rx))
    }
}

impl<P: ProductDirectory> Default for ScanOrchestratorBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use shelfguard_resolver::StaticProductDirectory;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn build_orchestrator() -> (
        ScanOrchestrator<StaticProductDirectory>,
        mpsc::Receiver<ResolutionEvent>,
    ) {
        let (orchestrator, rx) = ScanOrchestrator::builder()
            .directory(Arc::new(StaticProductDirectory::demo()))
            .normalizer(
                PayloadNormalizer::new()
                    .with_id_source(|| "synth-id".to_owned())
                    .with_clock(fixed_now),
            )
            .clock(fixed_now)
            .build()
            .expect("builder should succeed");
        (orchestrator, rx.expect("internal channel expected"))
    }

    #[tokio::test]
    async fn known_barcode_resolves_and_selects() {
        let (mut orchestrator, mut rx) = build_orchestrator();

        let outcome = orchestrator.submit_scan("4780005111223").await.unwrap();
        match outcome {
            ScanOutcome::Resolved(record) => assert_eq!(record.name, "Classic Milk 3.2%"),
            ScanOutcome::Unknown { .. } => panic!("expected resolved"),
        }
        assert_eq!(orchestrator.selected().unwrap().barcode, "4780005111223");
        assert_eq!(orchestrator.history().len(), 1);
        assert_eq!(orchestrator.scans_resolved(), 1);

        let event = rx.try_recv().expect("resolution event expected");
        assert!(matches!(event.outcome, ScanOutcome::Resolved(_)));
    }

    #[tokio::test]
    async fn unknown_barcode_keeps_selection() {
        let (mut orchestrator, _rx) = build_orchestrator();
        orchestrator.submit_scan("4780005111223").await.unwrap();

        let outcome = orchestrator.submit_scan("9999999999999").await.unwrap();
        assert!(matches!(outcome, ScanOutcome::Unknown { .. }));
        // 선택 상태는 그대로
        assert_eq!(orchestrator.selected().unwrap().barcode, "4780005111223");
        // 이력에도 추가되지 않음
        assert_eq!(orchestrator.history().len(), 1);
        assert_eq!(orchestrator.unknown_products(), 1);
    }

    #[tokio::test]
    async fn resolution_rederives_status_with_injected_clock() {
        // 데모 카탈로그의 우유는 2026-03-15 만료, 저장 상태는 safe
        let late = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let (mut orchestrator, _rx) = ScanOrchestrator::builder()
            .directory(Arc::new(StaticProductDirectory::demo()))
            .clock(move || late)
            .build()
            .unwrap();

        let outcome = orchestrator.submit_scan("4780005111223").await.unwrap();
        match outcome {
            ScanOutcome::Resolved(record) => assert_eq!(record.status, ProductStatus::Expired),
            ScanOutcome::Unknown { .. } => panic!("expected resolved"),
        }
    }

    #[tokio::test]
    async fn structured_payload_bypasses_directory() {
        let (mut orchestrator, _rx) = build_orchestrator();
        let outcome = orchestrator
            .submit_scan(r#"{"name":"Oat Bar","exp":"2026-09-01"}"#)
            .await
            .unwrap();
        match outcome {
            ScanOutcome::Resolved(record) => {
                assert_eq!(record.id, "synth-id");
                assert_eq!(record.name, "Oat Bar");
            }
            ScanOutcome::Unknown { .. } => panic!("expected synthesized product"),
        }
    }

    #[tokio::test]
    async fn report_expired_requires_expired_selection() {
        let (mut orchestrator, _rx) = build_orchestrator();

        // 안전한 제품 선택 중에는 신고 불가
        orchestrator.submit_scan("4780005111223").await.unwrap();
        assert!(!orchestrator.report_expired());
        assert!(orchestrator.selected().is_some());

        // 기한 경과 제품 (2025-12-01 < 2026-01-15)
        orchestrator.submit_scan("4780001234567").await.unwrap();
        assert!(orchestrator.report_expired());
        // 신고 후 선택 해제
        assert!(orchestrator.selected().is_none());
        assert_eq!(orchestrator.reports_acknowledged(), 1);

        // 선택이 없으면 신고 불가
        assert!(!orchestrator.report_expired());
    }

    #[tokio::test]
    async fn select_history_entry_by_id() {
        let (mut orchestrator, _rx) = build_orchestrator();
        orchestrator.submit_scan("4780005111223").await.unwrap();
        orchestrator.submit_scan("4780009876543").await.unwrap();

        let milk_id = orchestrator
            .history()
            .iter()
            .find(|e| e.barcode == "4780005111223")
            .map(|e| e.id.clone())
            .expect("milk in history");

        orchestrator.clear_selection();
        assert!(orchestrator.select_history_entry(&milk_id));
        assert_eq!(orchestrator.selected().unwrap().barcode, "4780005111223");
        assert!(!orchestrator.select_history_entry("no-such-id"));
    }

    #[tokio::test]
    async fn history_deduplicates_rescans() {
        let (mut orchestrator, _rx) = build_orchestrator();
        orchestrator.submit_scan("4780005111223").await.unwrap();
        orchestrator.submit_scan("4780009876543").await.unwrap();
        orchestrator.submit_scan("4780005111223").await.unwrap();

        assert_eq!(orchestrator.history().len(), 2);
        assert_eq!(
            orchestrator.history().latest().unwrap().barcode,
            "4780005111223"
        );
    }

    #[tokio::test]
    async fn full_event_channel_does_not_block_scans() {
        let (mut orchestrator, _rx) = ScanOrchestrator::builder()
            .directory(Arc::new(StaticProductDirectory::demo()))
            .clock(fixed_now)
            .resolution_channel_capacity(1)
            .build()
            .unwrap();

        // 수신자가 읽지 않아도 스캔은 계속 성공해야 합니다.
        for _ in 0..4 {
            orchestrator.submit_scan("4780005111223").await.unwrap();
        }
        assert_eq!(orchestrator.scans_resolved(), 4);
    }

    #[test]
    fn builder_requires_directory() {
        let result = ScanOrchestrator::<StaticProductDirectory>::builder().build();
        assert!(matches!(
            result,
            Err(ScanOrchestratorError::Config { .. })
        ));
    }

    #[test]
    fn builder_with_external_sender_returns_no_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let (_orchestrator, receiver) = ScanOrchestrator::builder()
            .directory(Arc::new(StaticProductDirectory::demo()))
            .resolution_sender(tx)
            .build()
            .unwrap();
        assert!(receiver.is_none());
        assert!(rx.try_recv().is_err());
    }
}
