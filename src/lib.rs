//! Workspace placeholder crate.
//!
//! This crate exposes the `desktop-shims` feature flag that maps onto
//! `core-service`. Host applications can depend on `photoset-workspace` and
//! get the uploader façade with the desktop directory reader and console
//! prompt wired in.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
