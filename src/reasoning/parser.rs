//! JSON extraction from free-text model output
//!
//! Models often wrap the JSON they were asked for in prose or markdown
//! fences. `extract_json` finds the first complete top-level object or array
//! using bracket matching that ignores brackets inside string literals.

use crate::errors::{FlowError, Result};
use serde::de::DeserializeOwned;

/// Kind of JSON value to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn open(&self) -> char {
        match self {
            JsonShape::Object => '{',
            JsonShape::Array => '[',
        }
    }

    fn close(&self) -> char {
        match self {
            JsonShape::Object => '}',
            JsonShape::Array => ']',
        }
    }
}

/// Return the first complete top-level JSON value of `shape` in `text`
///
/// ```text
/// depth ← 0, start ← None
/// for each char cᵢ outside string literals:
///   cᵢ = open:  if depth = 0 { start ← i }; depth ← depth + 1
///   cᵢ = close: depth ← depth - 1; if depth = 0 → return text[start..=i]
/// ```
pub fn extract_json(text: &str, shape: JsonShape) -> Option<&str> {
    let (open, close) = (shape.open(), shape.close());
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        // Only track strings once inside the value
        if start.is_some() {
            if escape_next {
                escape_next = false;
                continue;
            }
            if ch == '\\' && in_string {
                escape_next = true;
                continue;
            }
            if ch == '"' {
                in_string = !in_string;
                continue;
            }
            if in_string {
                continue;
            }
        }

        if ch == open {
            if depth == 0 {
                start = Some(i);
            }
            depth += 1;
        } else if ch == close && depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(&text[s..=i]);
                }
            }
        }
    }

    None
}

/// Extract and deserialize the first JSON value of `shape` in `text`
pub fn parse_embedded<T: DeserializeOwned>(text: &str, shape: JsonShape) -> Result<T> {
    let trimmed = text.trim();

    // Fast path: the whole response is the value
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let candidate = extract_json(trimmed, shape).ok_or_else(|| {
        FlowError::Generic(format!("no JSON {:?} found in model output", shape).to_lowercase())
    })?;

    Ok(serde_json::from_str(candidate)?)
}
