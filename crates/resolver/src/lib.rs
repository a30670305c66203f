#![doc = include_str!("../README.md")]

pub mod directory;
pub mod error;
pub mod normalizer;

pub use directory::{ProductDirectory, StaticProductDirectory};
pub use error::DirectoryError;
pub use normalizer::{NormalizedScan, PayloadNormalizer};
