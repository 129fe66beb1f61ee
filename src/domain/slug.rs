//! Utilities for deriving deterministic, human-friendly slugs.
//!
//! Slugification itself is total and pure; uniqueness is delegated to a
//! caller-supplied availability predicate so the derivation logic stays free
//! of persistence concerns.

use std::future::Future;

use thiserror::Error;

pub use slug::slugify;

/// Errors that can occur while deriving a slug from source text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a base slug from the provided human-readable text.
///
/// Unlike [`slugify`], which maps unrepresentable input to the empty string,
/// this names the edge case so callers can reject it explicitly.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug that does not collide according to the supplied predicate.
///
/// The `is_available` closure must return `true` when the candidate slug is
/// free to use. Collisions retry with a monotonic numeric suffix (`-1`, `-2`,
/// …); the suffix never repeats a candidate, so the loop terminates once the
/// finite set of taken slugs is exhausted.
pub fn ensure_unique_slug<F>(base: &str, mut is_available: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if is_available(base) {
        return base.to_string();
    }

    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}-{counter}");
        if is_available(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Async variant of [`ensure_unique_slug`] that awaits the availability check.
pub async fn ensure_unique_slug_async<F, Fut, E>(base: &str, mut is_available: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    if is_available(base.to_string()).await? {
        return Ok(base.to_string());
    }

    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}-{counter}");
        if is_available(candidate.clone()).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}
