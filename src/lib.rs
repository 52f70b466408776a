//! Muse terminal client library
//!
//! This crate exposes modules for integration testing.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod state;
pub mod ui;
pub mod widgets;
