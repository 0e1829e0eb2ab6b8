//! Client and REST bridge for the Rituals Perfume Genie cloud API.
//!
//! [`rituals::RitualsClient`] owns authentication and the authenticated
//! request layer. [`registry`], [`status`] and [`control`] build on it, and
//! [`api`] exposes them over HTTP.

pub mod api;
pub mod config;
pub mod control;
pub mod error;
pub mod reading_cache;
pub mod registry;
pub mod rituals;
pub mod session_store;
pub mod status;

pub use error::{Error, Result};
