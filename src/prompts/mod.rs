//! System prompt presets for chat conversations
//!
//! This module provides the named system prompts a caller can attach to a
//! conversation. `general` is the default; unknown preset names are a
//! configuration error so typos never silently change the assistant's
//! behavior.

use crate::error::{ChatLedgerError, Result};

/// Default preset applied when the caller does not name one
pub const DEFAULT_PRESET: &str = "general";

const GENERAL: &str =
    "You are a helpful AI assistant. Provide clear, accurate, and helpful responses.";

const CODING: &str = "You are an expert software developer. Help with coding questions, \
     provide clean code examples, and explain programming concepts clearly.";

const BUSINESS: &str = "You are a business consultant. Provide strategic advice, help with \
     business planning, and offer insights on entrepreneurship and growth.";

const CREATIVE: &str = "You are a creative writing assistant. Help with storytelling, content \
     creation, and creative projects. Be imaginative and inspiring.";

const ACADEMIC: &str = "You are an academic tutor. Explain concepts clearly, help with \
     research, and provide educational guidance across various subjects.";

const SAAS: &str = "You are a SaaS expert. Help with software-as-a-service business models, \
     product development, user experience, and scaling strategies.";

/// Names of all available presets, in display order
pub const PRESET_NAMES: &[&str] = &[
    "general", "coding", "business", "creative", "academic", "saas",
];

/// Look up a system prompt preset by name
///
/// # Errors
///
/// Returns a `Config` error for names outside the preset list.
///
/// # Examples
///
/// ```
/// use chatledger::prompts::preset;
///
/// let prompt = preset("coding").unwrap();
/// assert!(prompt.contains("software developer"));
/// assert!(preset("nonsense").is_err());
/// ```
pub fn preset(name: &str) -> Result<&'static str> {
    match name {
        "general" => Ok(GENERAL),
        "coding" => Ok(CODING),
        "business" => Ok(BUSINESS),
        "creative" => Ok(CREATIVE),
        "academic" => Ok(ACADEMIC),
        "saas" => Ok(SAAS),
        other => Err(ChatLedgerError::Config(format!(
            "Unknown prompt preset: {} (expected one of: {})",
            other,
            PRESET_NAMES.join(", ")
        ))
        .into()),
    }
}
