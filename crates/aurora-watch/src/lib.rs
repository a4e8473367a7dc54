pub mod alerts;
pub mod config;
pub mod domain;
pub mod error;
pub mod providers;
pub mod scoring;
pub mod telemetry;
