//! `portcullis-client`: HTTP client for the management REST API.
//!
//! Implements the core source traits so sessions and guards can load the
//! current user, the environment list, and per-scope permission maps.

pub mod management;

pub use management::{ClientSettings, ManagementClient};
