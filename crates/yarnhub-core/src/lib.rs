//! `yarnhub-core` — configuration and error types shared by every YarnHub crate.

pub mod config;
pub mod error;

pub use config::YarnhubConfig;
pub use error::{Result, YarnhubError};
