//! 리플레이 디코더
//!
//! [`ReplayDecoder`]는 미리 디코딩된 프레임 목록으로 [`BarcodeDecoder`]를
//! 구현합니다. 캡처 세션이 디코드를 한 건만 소비하므로 `start` 한 번에
//! 프레임도 한 건만 전달합니다. 전달되지 않은 프레임은 큐에 남아
//! 다음 세션에서 이어서 재생됩니다.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use shelfguard_core::event::DecodeEvent;

use crate::decoder::{BarcodeDecoder, DecoderConfig, DecoderError, DeviceSelector};

/// 고정된 프레임 텍스트 목록을 재생하는 디코더
///
/// 복제 비용이 낮고, 복제본은 같은 프레임 큐를 공유합니다. 세션이 한
/// 핸들을 소유하는 동안 다른 핸들로 [`remaining`](Self::remaining)을
/// 관찰할 수 있습니다.
#[derive(Clone)]
pub struct ReplayDecoder {
    inner: Arc<ReplayInner>,
}

struct ReplayInner {
    frames: Mutex<VecDeque<String>>,
    start_error: Option<String>,
    frame_delay: Duration,
    scanning: AtomicBool,
    stops: AtomicU64,
    cancel: Mutex<CancellationToken>,
}

impl ReplayDecoder {
    /// `frames`를 순서대로 재생하는 디코더를 생성합니다.
    pub fn new(frames: Vec<String>) -> Self {
        Self {
            inner: Arc::new(ReplayInner {
                frames: Mutex::new(frames.into()),
                start_error: None,
                frame_delay: Duration::ZERO,
                scanning: AtomicBool::new(false),
                stops: AtomicU64::new(0),
                cancel: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// 프레임 전달 전에 지연을 둡니다 (디코드 지연 시뮬레이션).
    pub fn with_frame_delay(self, delay: Duration) -> Self {
        let mut inner = Self::unwrap_inner(self.inner);
        inner.frame_delay = delay;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// 모든 `start` 호출을 주어진 백엔드 메시지로 실패시킵니다.
    ///
    /// 하드웨어 없이 권한/디바이스 실패를 재현할 때 사용합니다.
    pub fn with_start_error(self, message: impl Into<String>) -> Self {
        let mut inner = Self::unwrap_inner(self.inner);
        inner.start_error = Some(message.into());
        Self {
            inner: Arc::new(inner),
        }
    }

    // 빌더 메서드는 복제본이 생기기 전에 호출되므로 Arc가 유일합니다.
    fn unwrap_inner(inner: Arc<ReplayInner>) -> ReplayInner {
        match Arc::try_unwrap(inner) {
            Ok(inner) => inner,
            Err(shared) => ReplayInner {
                frames: Mutex::new(shared.snapshot_frames().into()),
                start_error: shared.start_error.clone(),
                frame_delay: shared.frame_delay,
                scanning: AtomicBool::new(false),
                stops: AtomicU64::new(0),
                cancel: Mutex::new(CancellationToken::new()),
            },
        }
    }

    /// 아직 전달되지 않은 프레임 수
    pub fn remaining(&self) -> usize {
        self.inner.lock_frames().len()
    }

    /// `stop`이 호출된 횟수
    pub fn stop_count(&self) -> u64 {
        self.inner.stops.load(Ordering::SeqCst)
    }
}

impl ReplayInner {
    fn lock_frames(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        match self.frames.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn snapshot_frames(&self) -> Vec<String> {
        self.lock_frames().iter().cloned().collect()
    }

    fn swap_cancel_token(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        let mut guard = match self.cancel.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.cancel();
        *guard = fresh.clone();
        fresh
    }

    fn cancel_current(&self) {
        match self.cancel.lock() {
            Ok(guard) => guard.cancel(),
            Err(poisoned) => poisoned.into_inner().cancel(),
        }
    }
}

impl BarcodeDecoder for ReplayDecoder {
    async fn start(
        &self,
        _selector: &DeviceSelector,
        _config: &DecoderConfig,
        frames: mpsc::Sender<DecodeEvent>,
    ) -> Result<(), DecoderError> {
        if let Some(message) = &self.inner.start_error {
            return Err(DecoderError(message.clone()));
        }

        let token = self.inner.swap_cancel_token();
        self.inner.scanning.store(true, Ordering::SeqCst);

        // 세션은 디코드를 한 건만 소비하므로 프레임도 한 건만 꺼냅니다.
        // 미리 채널에 밀어 넣은 프레임은 세션이 수신자를 버릴 때 함께
        // 사라지므로, 전달이 확정되기 전에는 큐에서 꺼내지 않습니다.
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if !inner.frame_delay.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => {
                        inner.scanning.store(false, Ordering::SeqCst);
                        return;
                    }
                    _ = tokio::time::sleep(inner.frame_delay) => {}
                }
            }

            let frame = inner.lock_frames().pop_front();
            match frame {
                Some(frame) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            // 전달되지 못한 프레임은 다음 세션 몫입니다.
                            inner.lock_frames().push_front(frame);
                        }
                        result = frames.send(DecodeEvent::new(frame.clone())) => {
                            if result.is_err() {
                                inner.lock_frames().push_front(frame);
                            }
                        }
                    }
                }
                None => debug!("replay decoder has no frames left"),
            }
            inner.scanning.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), DecoderError> {
        self.inner.cancel_current();
        self.inner.scanning.store(false, Ordering::SeqCst);
        self.inner.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_scanning(&self) -> bool {
        self.inner.scanning.load(Ordering::SeqCst)
    }
}
