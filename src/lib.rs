//! # Weathervane
//!
//! A read-only HTTP API serving time-series weather sensor readings for
//! IoT devices out of S3-compatible object storage.
//!
//! Readings are keyed by device, sensor type, and calendar date, and live
//! in two tiers: a hot tier with one object per device/sensor/date, and a
//! cold tier where aged-out dates are consolidated into per-sensor zip
//! archives. Queries prefer the hot tier and fall back to the archive.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐
//! │  HTTP /  │──▶│ QueryEngine  │──▶│ Tier locator  │
//! │   CLI    │   │ catalog +    │   │ hot object /  │
//! └──────────┘   │ aggregation  │   │ cold archive  │
//!                └──────────────┘   └──────┬────────┘
//!                                          ▼
//!                                   ┌──────────────┐
//!                                   │ ObjectStore  │
//!                                   │ (S3 / mem)   │
//!                                   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and object-key conventions |
//! | [`error`] | Typed error taxonomy |
//! | [`decode`] | Row-tolerant reading decoder (comma decimal separator) |
//! | [`catalog`] | Device catalog (`metadata.csv`) reader |
//! | [`storage`] | Object-storage trait, S3 client, in-memory store |
//! | [`tiers`] | Hot/cold tier artifact locator |
//! | [`query`] | Query orchestration and device-wide aggregation |
//! | [`server`] | Axum HTTP API |

pub mod catalog;
pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod query;
pub mod server;
pub mod storage;
pub mod tiers;
