//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep API/CLI layers decoupled from storage details.

pub mod inbound_mail;
pub mod note_service;
