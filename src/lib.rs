//! # GPS Bridge Library
//!
//! Ingest GPS telemetry from a serial-connected receiver and serve it over HTTP.
//!
//! This library provides the core pipeline: an append-only telemetry store,
//! a serial ingestion loop feeding it, and the HTTP surface (live dashboard,
//! JSON history, downloadable export snapshot) reading from it.

pub mod config;
pub mod error;
pub mod record;
pub mod store;
pub mod export;
pub mod ingest;
pub mod http;
