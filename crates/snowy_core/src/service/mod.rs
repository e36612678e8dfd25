//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate content store and document repository calls into
//!   use-case level APIs.
//! - Keep API/CLI layers decoupled from storage details.

pub mod store_service;
