#![doc = include_str!("../README.md")]

pub mod error;
pub mod history;
pub mod orchestrator;

pub use error::ScanOrchestratorError;
pub use history::RecentHistory;
pub use orchestrator::{ScanOrchestrator, ScanOrchestratorBuilder};
