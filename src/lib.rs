//! SCIM Gateway - Sessions and workflow invocations over a remote SCIM service
//!
//! This crate brokers a web client's access to a remote identity-governance
//! service that only speaks a generic SCIM-style HTTP API: it resolves the
//! caller's identity profile by racing several lookup strategies, enforces a
//! single active session per principal across processes, and invokes remote
//! workflows with tolerant decoding of their attribute-bag results.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
