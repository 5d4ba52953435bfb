//! City catalogue API with lazily resolved, upstream-backed trending topics.
//!
//! Layers follow the usual split: `domain` holds records and invariants, `application`
//! the services and repository/client traits, `infra` the Postgres, HTTP, upstream
//! and telemetry adapters, and `config` the layered settings.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
