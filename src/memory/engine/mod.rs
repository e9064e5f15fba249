//! Recall engine orchestration module.

pub mod core;

pub use self::core::RecallEngine;
