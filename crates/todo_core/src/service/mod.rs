//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, ownership scoping and repository calls.
//! - Keep boundary layers (CLI, transport) decoupled from storage details.

pub mod auth_service;
pub mod list_params;
pub mod todo_service;
