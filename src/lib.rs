//! Homereel - Local network media server
//!
//! This library crate exposes the core functionality for integration testing.

pub mod channels;
pub mod clients;
pub mod config;
pub mod scanner;
pub mod server;
pub mod store;
pub mod streaming;
