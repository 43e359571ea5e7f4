//! Middleware modules
//!
//! Contains authentication middleware.

pub mod auth;
