//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (CLI, RPC layers) decoupled from storage details.

pub mod checkin_service;
pub mod habit_service;
