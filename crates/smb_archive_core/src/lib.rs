//! Shared SMB archive domain primitives.
//!
//! This crate owns the invocation contract, the failure taxonomy, destination
//! key layout, and local staging. It intentionally excludes AWS SDK, SMB client,
//! and Lambda runtime concerns.

pub mod contract;
pub mod staging;
pub mod storage_keys;
