//! dropsync: link a Dropbox account and import Baby Tracker backups, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
