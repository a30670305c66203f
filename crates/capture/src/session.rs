//! 캡처 세션 상태머신
//!
//! [`CaptureSession`]은 디코더 협력자의 수명주기를 관리하는 상태머신입니다.
//!
//! # 상태 전이
//!
//! ```text
//! Idle ──start()──▶ Requesting ──성공──▶ Active ──프레임 수신──▶ Decoded
//!                       │                  │
//!                       └──실패──▶ Failed  └──close()──▶ Idle
//! ```
//!
//! 한 세션은 디코드 프레임을 최대 한 건만 소비합니다. 프레임을 받으면
//! 디바이스를 즉시 정리하므로 이후 협력자가 보내는 프레임은 버려집니다.
//! `close()`는 몇 번을 호출해도 안전하며 디바이스 정리는 한 번만 수행됩니다.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shelfguard_core::config::CaptureConfig;
use shelfguard_core::event::DecodeEvent;
use shelfguard_core::metrics::{
    CAPTURE_FRAMES_DECODED_TOTAL, CAPTURE_SESSIONS_FAILED_TOTAL, CAPTURE_SESSIONS_STARTED_TOTAL,
};

use crate::decoder::{BarcodeDecoder, DecoderConfig, DeviceSelector, Symbology};
use crate::error::CaptureSessionError;

/// 프레임 채널 버퍼 크기
const FRAME_CHANNEL_CAPACITY: usize = 16;

/// 세션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// 대기 상태 (초기 상태, close 후 복귀)
    Idle,
    /// 디바이스 기동 요청 중
    Requesting,
    /// 디바이스 활성, 프레임 대기 중
    Active,
    /// 프레임 한 건 소비 완료
    Decoded,
    /// 기동 실패
    Failed,
}

/// 카메라 캡처 세션
///
/// 디코더 협력자 `D`를 구동하여 프레임 한 건을 얻는 단위 작업을 나타냅니다.
pub struct CaptureSession<D: BarcodeDecoder> {
    decoder: Arc<D>,
    selector: DeviceSelector,
    config: DecoderConfig,
    start_timeout: Duration,
    state: SessionState,
    frame_rx: Option<mpsc::Receiver<DecodeEvent>>,
    cancel: CancellationToken,
    device_stopped: bool,
}

impl<D: BarcodeDecoder> CaptureSession<D> {
    /// 기본 설정으로 세션을 생성합니다.
    pub fn new(decoder: Arc<D>) -> Self {
        Self {
            decoder,
            selector: DeviceSelector::default(),
            config: DecoderConfig::default(),
            start_timeout: Duration::from_secs(
                shelfguard_core::config::DEFAULT_START_TIMEOUT_SECS,
            ),
            state: SessionState::Idle,
            frame_rx: None,
            cancel: CancellationToken::new(),
            device_stopped: true,
        }
    }

    /// 캡처 설정으로부터 세션을 생성합니다.
    ///
    /// 설정의 심볼 이름을 파싱하며, 알 수 없는 이름이 있으면 에러를 반환합니다.
    pub fn from_config(decoder: Arc<D>, config: &CaptureConfig) -> Result<Self, CaptureSessionError> {
        let mut symbologies = Vec::with_capacity(config.symbologies.len());
        for name in &config.symbologies {
            let Some(sym) = Symbology::from_name(name) else {
                return Err(CaptureSessionError::Config {
                    field: "capture.symbologies".to_owned(),
                    reason: format!("unknown symbology '{name}'"),
                });
            };
            symbologies.push(sym);
        }

        let selector = if config.device == "user" {
            DeviceSelector::user()
        } else {
            DeviceSelector::environment()
        };

        Ok(Self {
            decoder,
            selector,
            config: DecoderConfig {
                target_fps: config.target_fps,
                viewfinder_fraction: config.viewfinder_fraction,
                aspect_ratio: config.aspect_ratio,
                symbologies,
            },
            start_timeout: Duration::from_secs(config.start_timeout_secs),
            state: SessionState::Idle,
            frame_rx: None,
            cancel: CancellationToken::new(),
            device_stopped: true,
        })
    }

    /// 디바이스를 기동하고 세션을 Active 상태로 전이합니다.
    ///
    /// 이미 진행 중인 세션이 있으면 먼저 정리합니다. 기동이
    /// `start_timeout` 안에 끝나지 않으면 `StartTimeout`으로 실패합니다.
    pub async fn start(&mut self) -> Result<(), CaptureSessionError> {
        if matches!(self.state, SessionState::Requesting | SessionState::Active) {
            debug!("restarting capture session, shutting down previous device");
            self.shutdown_device().await;
        }

        self.cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        self.state = SessionState::Requesting;
        self.device_stopped = false;

        match timeout(
            self.start_timeout,
            self.decoder.start(&self.selector, &self.config, tx),
        )
        .await
        {
            Err(_elapsed) => {
                // 늦게라도 기동된 디바이스가 남지 않도록 정리합니다.
                self.shutdown_device().await;
                self.state = SessionState::Failed;
                counter!(CAPTURE_SESSIONS_FAILED_TOTAL).increment(1);
                warn!(
                    limit_secs = self.start_timeout.as_secs(),
                    "capture session start timed out"
                );
                Err(CaptureSessionError::StartTimeout {
                    limit_secs: self.start_timeout.as_secs(),
                })
            }
            Ok(Err(decoder_err)) => {
                self.device_stopped = true;
                self.state = SessionState::Failed;
                counter!(CAPTURE_SESSIONS_FAILED_TOTAL).increment(1);
                let err = classify_decoder_error(&decoder_err.0);
                warn!(error = %decoder_err.0, "capture session failed to start");
                Err(err)
            }
            Ok(Ok(())) => {
                self.frame_rx = Some(rx);
                self.state = SessionState::Active;
                counter!(CAPTURE_SESSIONS_STARTED_TOTAL).increment(1);
                info!(
                    facing_mode = self.selector.facing_mode.as_str(),
                    "capture session active"
                );
                Ok(())
            }
        }
    }

    /// 디코드 프레임 한 건을 기다립니다.
    ///
    /// 프레임을 받으면 디바이스를 정리하고 Decoded 상태로 전이합니다.
    /// Active 상태가 아니면 `NotActive`를 반환합니다.
    pub async fn next_decode(&mut self) -> Result<DecodeEvent, CaptureSessionError> {
        if self.state != SessionState::Active {
            return Err(CaptureSessionError::NotActive);
        }
        let Some(mut rx) = self.frame_rx.take() else {
            return Err(CaptureSessionError::NotActive);
        };
        let cancel = self.cancel.clone();

        let received = tokio::select! {
            _ = cancel.cancelled() => return Err(CaptureSessionError::SessionClosed),
            received = rx.recv() => received,
        };

        match received {
            Some(event) => {
                self.state = SessionState::Decoded;
                self.shutdown_device().await;
                counter!(CAPTURE_FRAMES_DECODED_TOTAL).increment(1);
                debug!(event = %event, "decode frame consumed");
                Ok(event)
            }
            None => {
                self.state = SessionState::Failed;
                Err(CaptureSessionError::Decoder(
                    "frame channel closed before a decode arrived".to_owned(),
                ))
            }
        }
    }

    /// 세션을 종료하고 Idle 상태로 되돌립니다.
    ///
    /// 몇 번을 호출해도 안전하며 디바이스 정리는 한 번만 수행됩니다.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        self.frame_rx = None;
        self.shutdown_device().await;
        self.state = SessionState::Idle;
    }

    /// 현재 상태명을 반환합니다 (로깅용).
    pub fn state_name(&self) -> &'static str {
        match self.state {
            SessionState::Idle => "idle",
            SessionState::Requesting => "requesting",
            SessionState::Active => "active",
            SessionState::Decoded => "decoded",
            SessionState::Failed => "failed",
        }
    }

    /// 세션이 프레임을 기다리고 있는지 여부
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    async fn shutdown_device(&mut self) {
        if self.device_stopped {
            return;
        }
        self.device_stopped = true;
        if let Err(err) = self.decoder.stop().await {
            warn!(error = %err, "decoder stop failed during shutdown");
        }
    }
}

// 디코더 협력자 `D`에 Debug를 요구하지 않도록 직접 구현합니다.
impl<D: BarcodeDecoder> fmt::Debug for CaptureSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &self.state)
            .field("facing_mode", &self.selector.facing_mode)
            .field("start_timeout", &self.start_timeout)
            .field("device_stopped", &self.device_stopped)
            .finish_non_exhaustive()
    }
}

/// 디코더 협력자의 원시 에러 문자열을 세션 에러로 분류합니다.
///
/// 브라우저 계열 백엔드의 `NotAllowedError`/`NotFoundError` 네이밍과
/// OS 계열 백엔드의 소문자 메시지를 함께 인식합니다.
fn classify_decoder_error(message: &str) -> CaptureSessionError {
    if message.contains("NotAllowedError")
        || message.contains("Permission denied")
        || message.contains("permission denied")
    {
        CaptureSessionError::PermissionDenied
    } else if message.contains("NotFoundError") || message.contains("no camera") {
        CaptureSessionError::DeviceNotFound
    } else {
        CaptureSessionError::Decoder(message.to_owned())
    }
}
