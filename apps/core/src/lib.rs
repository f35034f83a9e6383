//! Civic feedback triage.
//!
//! Classifies citizen reports by category and severity, screens them for spam,
//! scores their priority and keeps them in a SQLite store with an audit trail.
//! A hosted language model is used when configured; deterministic keyword rules
//! take over whenever it is absent or misbehaves.

pub mod actors;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod sample_data;
pub mod service;
pub mod telemetry;
pub mod triage;

pub use error::AppError;

#[cfg(test)]
mod tests;
