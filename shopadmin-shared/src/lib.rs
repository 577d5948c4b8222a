//! Shared models and configuration for the ShopAdmin console.
//!
//! Everything here is plain data: the wire shapes exchanged with the backend
//! and the configuration every binary in the workspace resolves at startup.
#![cfg_attr(test, allow(unsafe_code))]

pub mod config;
pub mod models;
