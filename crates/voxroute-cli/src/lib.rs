//! Voxroute developer console.
//!
//! Types transcripts into the routing pipeline as if they were spoken, and
//! inspects the audit log.

pub mod app;
pub mod cli;
pub mod commands;
pub mod console;
pub mod error;
