//! Infrastructure adapters. Implement outbound ports.
//!
//! Backend HTTP, filesystem persistence, OAuth hand-off, terminal UI. Map
//! errors to DomainError.

pub mod backend;
pub mod oauth;
pub mod persistence;
pub mod ui;
