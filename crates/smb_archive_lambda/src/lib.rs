//! AWS-oriented adapters and handlers for the SMB archive Lambda.
//!
//! This crate owns runtime integration details (the Lambda handler, parameter
//! store, SMB share and S3 adapters) on top of the contract, staging, and
//! storage key primitives in `smb_archive_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
