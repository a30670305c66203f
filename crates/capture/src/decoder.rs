//! 바코드 디코더 협력자 인터페이스
//!
//! [`BarcodeDecoder`]는 캡처 세션과 실제로 카메라 프레임에서 심볼을 읽는
//! 쪽 사이의 경계입니다. 운영 빌드는 하드웨어 기반 디코더를, 테스트와
//! 파일 재생은 [`crate::ReplayDecoder`]를 꽂습니다.

use std::fmt;

use tokio::sync::mpsc;

use shelfguard_core::event::DecodeEvent;

/// 캡처 파이프라인이 인식하는 심볼 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    /// QR 코드 (구조화 페이로드가 이 경로로 들어옴)
    Qr,
    /// EAN-13 소매 바코드
    Ean13,
    /// Code 128 선형 바코드
    Code128,
}

impl Symbology {
    /// 설정 파일의 이름으로부터 심볼 종류를 파싱합니다.
    ///
    /// 하이픈/언더스코어 표기 차이로 설정이 깨지지 않도록 흔한 변형
    /// 표기(`qr`, `qr_code`, `ean-13`, ...)를 허용합니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "qr" | "qr_code" | "qrcode" => Some(Self::Qr),
            "ean13" | "ean-13" | "ean_13" => Some(Self::Ean13),
            "code128" | "code-128" | "code_128" => Some(Self::Code128),
            _ => None,
        }
    }

    /// 로그와 이벤트에 쓰는 표준 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Ean13 => "ean13",
            Self::Code128 => "code128",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 디코더가 열어야 할 카메라 선택
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    /// 디바이스 계층에 요청하는 방향 ("environment" 또는 "user")
    pub facing_mode: String,
}

impl DeviceSelector {
    /// 후면 카메라. 진열대 스캔의 기본값입니다.
    pub fn environment() -> Self {
        Self {
            facing_mode: "environment".to_owned(),
        }
    }

    /// 전면 카메라
    pub fn user() -> Self {
        Self {
            facing_mode: "user".to_owned(),
        }
    }
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self::environment()
    }
}

/// 디코더 협력자에게 전달되는 런타임 설정
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// 심볼 탐지 목표 프레임레이트
    pub target_fps: u32,
    /// 짧은 변 대비 뷰파인더 박스 크기 비율
    pub viewfinder_fraction: f64,
    /// 뷰파인더 박스 종횡비 (너비 / 높이)
    pub aspect_ratio: f64,
    /// 디코더가 보고해야 할 심볼 종류 목록
    pub symbologies: Vec<Symbology>,
}

impl DecoderConfig {
    /// 주어진 프레임 크기에 대한 뷰파인더 박스를 계산합니다.
    ///
    /// 박스는 짧은 변을 기준으로 잡고 픽셀 단위로 반올림합니다.
    pub fn viewfinder_box(&self, frame_width: u32, frame_height: u32) -> (u32, u32) {
        let shorter = frame_width.min(frame_height) as f64;
        // 0.7 같은 비율은 f64로 정확히 표현되지 않으므로 내림 대신
        // 반올림해야 720 * 0.7이 503이 아닌 504가 됩니다.
        let height = (shorter * self.viewfinder_fraction).round();
        let width = (height * self.aspect_ratio).round();
        (width as u32, height as u32)
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            target_fps: 25,
            viewfinder_fraction: 0.7,
            aspect_ratio: 1.0,
            symbologies: vec![Symbology::Qr, Symbology::Ean13, Symbology::Code128],
        }
    }
}

/// 디코더 협력자가 보고한 원시 에러
///
/// 백엔드 메시지를 그대로 담습니다. 밖으로 나가기 전에 캡처 세션이
/// [`crate::CaptureSessionError`]로 분류합니다.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct DecoderError(pub String);

/// 캡처 세션이 구동하는 인터페이스
///
/// 구현체가 디바이스 수명주기를 소유합니다. `start`는 카메라를 열고
/// [`DecodeEvent`]를 채널로 밀어 넣기 시작하며, `stop`은 디바이스를
/// 해제합니다. `stop`은 `start` 전을 포함해 언제 호출해도 안전해야 합니다.
pub trait BarcodeDecoder: Send + Sync + 'static {
    /// 디바이스를 열고 디코드 이벤트 스트리밍을 시작합니다.
    ///
    /// 디바이스가 기동되면 반환하며, 이후 디코드 프레임은 `frames`
    /// 채널로 도착합니다.
    fn start(
        &self,
        selector: &DeviceSelector,
        config: &DecoderConfig,
        frames: mpsc::Sender<DecodeEvent>,
    ) -> impl Future<Output = Result<(), DecoderError>> + Send;

    /// 스트리밍을 멈추고 디바이스를 해제합니다. 멱등입니다.
    fn stop(&self) -> impl Future<Output = Result<(), DecoderError>> + Send;

    /// 디코더가 현재 프레임을 스트리밍 중인지 여부
    fn is_scanning(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbology_from_name_accepts_variants() {
        assert_eq!(Symbology::from_name("qr"), Some(Symbology::Qr));
        assert_eq!(Symbology::from_name("QR_CODE"), Some(Symbology::Qr));
        assert_eq!(Symbology::from_name("ean-13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::from_name(" code128 "), Some(Symbology::Code128));
        assert_eq!(Symbology::from_name("datamatrix"), None);
    }

    #[test]
    fn symbology_name_roundtrip() {
        for sym in [Symbology::Qr, Symbology::Ean13, Symbology::Code128] {
            assert_eq!(Symbology::from_name(sym.name()), Some(sym));
        }
    }

    #[test]
    fn device_selector_defaults_to_environment() {
        let selector = DeviceSelector::default();
        assert_eq!(selector.facing_mode, "environment");
        assert_eq!(DeviceSelector::user().facing_mode, "user");
    }

    #[test]
    fn decoder_config_default() {
        let config = DecoderConfig::default();
        assert_eq!(config.target_fps, 25);
        assert_eq!(config.symbologies.len(), 3);
    }

    #[test]
    fn viewfinder_box_uses_shorter_edge() {
        let config = DecoderConfig::default();
        // 짧은 변 720, 비율 0.7 -> 504x504 정사각 박스
        assert_eq!(config.viewfinder_box(1280, 720), (504, 504));
        // 가로/세로 방향은 결과에 영향이 없음
        assert_eq!(config.viewfinder_box(720, 1280), (504, 504));
    }

    #[test]
    fn viewfinder_box_rounds_instead_of_truncating() {
        // 720 * 0.7 = 503.999...가 내림으로 503이 되면 안 됩니다.
        let config = DecoderConfig {
            viewfinder_fraction: 0.7,
            ..DecoderConfig::default()
        };
        let (w, h) = config.viewfinder_box(720, 720);
        assert_eq!((w, h), (504, 504));
    }

    #[test]
    fn viewfinder_box_applies_aspect_ratio() {
        let config = DecoderConfig {
            aspect_ratio: 1.5,
            ..DecoderConfig::default()
        };
        let (w, h) = config.viewfinder_box(1000, 1000);
        assert_eq!(h, 700);
        assert_eq!(w, 1050);
    }
}
