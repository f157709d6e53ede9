//! Punchlist - a per-project issue tracking core.
//!
//! This crate provides the issue store service and its storage backends.
//! The HTTP transport lives in the `punchlist-server` crate.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod error;
pub mod id;
pub mod service;
pub mod storage;
