#![doc = include_str!("../README.md")]

pub mod decoder;
pub mod error;
pub mod replay;
pub mod session;

pub use decoder::{BarcodeDecoder, DecoderConfig, DecoderError, DeviceSelector, Symbology};
pub use error::CaptureSessionError;
pub use replay::ReplayDecoder;
pub use session::CaptureSession;
