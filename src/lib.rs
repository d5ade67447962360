//! Job application submission client
//!
//! This library drives an application against the hiring API: local
//! validation, an optional resume upload with progress, the apply call, and
//! polling of the server-side AI resume analysis until it settles.

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
pub mod telemetry;
