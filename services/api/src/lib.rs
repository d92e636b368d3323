//! services/api/src/lib.rs
//!
//! The `api` service library: adapters for the `mesto_core` ports, credential
//! services, configuration, logging and the HTTP layer. The binaries in
//! `src/bin` are thin wrappers around it.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod web;
