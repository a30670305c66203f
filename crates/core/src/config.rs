//! 설정 관리 — shelfguard.toml 파싱 및 런타임 설정
//!
//! [`ShelfguardConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SHELFGUARD_CAPTURE_TARGET_FPS=30` 형식)
//! 3. 설정 파일 (`shelfguard.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), shelfguard_core::error::ShelfguardError> {
//! use shelfguard_core::config::ShelfguardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ShelfguardConfig::load("shelfguard.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ShelfguardConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ShelfguardError};

/// 카메라 기동 타임아웃 기본값 (초)
pub const DEFAULT_START_TIMEOUT_SECS: u64 = 10;
/// 최근 스캔 이력 기본 용량
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Shelfguard 통합 설정
///
/// `shelfguard.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelfguardConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 캡처 세션 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 제품 디렉토리 설정
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// 스캔 이력 설정
    #[serde(default)]
    pub history: HistoryConfig,
}

impl ShelfguardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ShelfguardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ShelfguardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShelfguardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ShelfguardError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ShelfguardError> {
        toml::from_str(toml_str).map_err(|e| {
            ShelfguardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SHELFGUARD_{SECTION}_{FIELD}`
    /// 예: `SHELFGUARD_CAPTURE_DEVICE=user`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SHELFGUARD_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "SHELFGUARD_GENERAL_LOG_FORMAT",
        );

        // Capture
        override_string(&mut self.capture.device, "SHELFGUARD_CAPTURE_DEVICE");
        override_u32(&mut self.capture.target_fps, "SHELFGUARD_CAPTURE_TARGET_FPS");
        override_u64(
            &mut self.capture.start_timeout_secs,
            "SHELFGUARD_CAPTURE_START_TIMEOUT_SECS",
        );
        override_f64(
            &mut self.capture.viewfinder_fraction,
            "SHELFGUARD_CAPTURE_VIEWFINDER_FRACTION",
        );
        override_f64(
            &mut self.capture.aspect_ratio,
            "SHELFGUARD_CAPTURE_ASPECT_RATIO",
        );
        override_csv(
            &mut self.capture.symbologies,
            "SHELFGUARD_CAPTURE_SYMBOLOGIES",
        );

        // Directory
        override_string(
            &mut self.directory.catalog_path,
            "SHELFGUARD_DIRECTORY_CATALOG_PATH",
        );

        // History
        override_usize(&mut self.history.capacity, "SHELFGUARD_HISTORY_CAPACITY");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ShelfguardError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // device 검증
        let valid_devices = ["environment", "user"];
        if !valid_devices.contains(&self.capture.device.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "capture.device".to_owned(),
                reason: format!("must be one of: {}", valid_devices.join(", ")),
            }
            .into());
        }

        if self.capture.target_fps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.target_fps".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.capture.start_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.start_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if !(self.capture.viewfinder_fraction > 0.0 && self.capture.viewfinder_fraction <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "capture.viewfinder_fraction".to_owned(),
                reason: "must be within (0.0, 1.0]".to_owned(),
            }
            .into());
        }

        if self.capture.aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.aspect_ratio".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.capture.symbologies.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "capture.symbologies".to_owned(),
                reason: "at least one symbology is required".to_owned(),
            }
            .into());
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 캡처 세션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 카메라 선택 (environment: 후면, user: 전면)
    pub device: String,
    /// 목표 프레임 레이트
    pub target_fps: u32,
    /// 카메라 기동 타임아웃 (초)
    pub start_timeout_secs: u64,
    /// 뷰파인더 박스 비율 (짧은 변 대비, 0.0~1.0)
    pub viewfinder_fraction: f64,
    /// 뷰파인더 종횡비
    pub aspect_ratio: f64,
    /// 인식할 심볼 종류 (qr, ean13, code128)
    pub symbologies: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: "environment".to_owned(),
            target_fps: 25,
            start_timeout_secs: DEFAULT_START_TIMEOUT_SECS,
            viewfinder_fraction: 0.7,
            aspect_ratio: 1.0,
            symbologies: vec!["qr".to_owned(), "ean13".to_owned(), "code128".to_owned()],
        }
    }
}

/// 제품 디렉토리 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// 카탈로그 JSON 파일 경로 (빈 문자열이면 내장 데모 카탈로그 사용)
    pub catalog_path: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            catalog_path: String::new(),
        }
    }
}

/// 스캔 이력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// 최근 이력 최대 엔트리 수
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_f64(target: &mut f64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<f64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse f64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = ShelfguardConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.capture.device, "environment");
        assert_eq!(config.capture.target_fps, 25);
        assert_eq!(config.capture.start_timeout_secs, 10);
        assert_eq!(config.capture.symbologies.len(), 3);
        assert!(config.directory.catalog_path.is_empty());
        assert_eq!(config.history.capacity, 5);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = ShelfguardConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = ShelfguardConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.capture.device, "environment");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[capture]
device = "user"
"#;
        let config = ShelfguardConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.capture.device, "user");
        assert_eq!(config.capture.target_fps, 25);
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"

[capture]
device = "user"
target_fps = 30
start_timeout_secs = 5
viewfinder_fraction = 0.5
aspect_ratio = 1.5
symbologies = ["qr"]

[directory]
catalog_path = "/etc/shelfguard/catalog.json"

[history]
capacity = 10
"#;
        let config = ShelfguardConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.capture.target_fps, 30);
        assert_eq!(config.capture.start_timeout_secs, 5);
        assert_eq!(config.capture.symbologies, vec!["qr"]);
        assert_eq!(config.directory.catalog_path, "/etc/shelfguard/catalog.json");
        assert_eq!(config.history.capacity, 10);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = ShelfguardConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ShelfguardError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = ShelfguardConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = ShelfguardConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_invalid_device() {
        let mut config = ShelfguardConfig::default();
        config.capture.device = "rear".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("capture.device"));
    }

    #[test]
    fn validate_rejects_zero_fps() {
        let mut config = ShelfguardConfig::default();
        config.capture.target_fps = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target_fps"));
    }

    #[test]
    fn validate_rejects_zero_start_timeout() {
        let mut config = ShelfguardConfig::default();
        config.capture.start_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("start_timeout_secs"));
    }

    #[test]
    fn validate_rejects_out_of_range_viewfinder_fraction() {
        let mut config = ShelfguardConfig::default();
        config.capture.viewfinder_fraction = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("viewfinder_fraction"));

        config.capture.viewfinder_fraction = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_symbologies() {
        let mut config = ShelfguardConfig::default();
        config.capture.symbologies.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("symbologies"));
    }

    #[test]
    fn validate_rejects_zero_history_capacity() {
        let mut config = ShelfguardConfig::default();
        config.history.capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("history.capacity"));
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SHELFGUARD_STR", "overridden") };
        override_string(&mut val, "TEST_SHELFGUARD_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_SHELFGUARD_STR") };
    }

    #[test]
    fn env_override_u32_invalid_keeps_original() {
        let mut val = 25u32;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SHELFGUARD_U32_BAD", "not-a-number") };
        override_u32(&mut val, "TEST_SHELFGUARD_U32_BAD");
        assert_eq!(val, 25); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_SHELFGUARD_U32_BAD") };
    }

    #[test]
    fn env_override_f64() {
        let mut val = 0.7f64;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SHELFGUARD_F64", "0.5") };
        override_f64(&mut val, "TEST_SHELFGUARD_F64");
        assert!((val - 0.5).abs() < f64::EPSILON);
        unsafe { std::env::remove_var("TEST_SHELFGUARD_F64") };
    }

    #[test]
    fn env_override_csv() {
        let mut val = vec!["qr".to_owned()];
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SHELFGUARD_CSV", "ean13, code128") };
        override_csv(&mut val, "TEST_SHELFGUARD_CSV");
        assert_eq!(val, vec!["ean13", "code128"]);
        unsafe { std::env::remove_var("TEST_SHELFGUARD_CSV") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_SHELFGUARD_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = ShelfguardConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = ShelfguardConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.capture.device, parsed.capture.device);
        assert_eq!(config.history.capacity, parsed.history.capacity);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = ShelfguardConfig::from_file("/nonexistent/path/shelfguard.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ShelfguardError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn from_file_parses_written_config() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\ntarget_fps = 15").unwrap();

        let config = ShelfguardConfig::from_file(file.path()).await.unwrap();
        assert_eq!(config.capture.target_fps, 15);
        assert_eq!(config.capture.device, "environment");
    }
}
