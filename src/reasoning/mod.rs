//! Reasoning collaborator
//!
//! Text-completion client plus helpers for pulling structured JSON out of
//! free-text model replies.

pub mod client;
pub mod parser;

// Re-export commonly used types
pub use client::{OllamaReasoner, Reasoner};
pub use parser::{extract_json, parse_embedded, JsonShape};
