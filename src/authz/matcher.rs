//! Memoized permission-pattern matching.
//!
//! Patterns compile to anchored regexes over the full action string; `*`
//! expands to `.*`, so `read:*` covers every read action while a literal
//! pattern matches only the identical action. A pattern that fails to
//! compile is recorded as never-matching for the lifetime of the process.

use dashmap::DashMap;
use regex::Regex;

/// Process-wide cache of compiled permission patterns.
///
/// Shared across all requests; entries are inserted lazily on first use and
/// never evicted. The set of distinct patterns is bounded by what tokens
/// actually grant, not by request volume.
#[derive(Default)]
pub struct PatternCache {
    compiled: DashMap<String, Option<Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `pattern` matches the full `action` string.
    ///
    /// Invalid patterns never match and never fail the caller.
    pub fn matches(&self, pattern: &str, action: &str) -> bool {
        let entry = self
            .compiled
            .entry(pattern.to_string())
            .or_insert_with(|| compile(pattern));

        match entry.value() {
            Some(re) => re.is_match(action),
            None => false,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.compiled.len()
    }
}

/// Compile a pattern, anchored over the whole action string.
fn compile(pattern: &str) -> Option<Regex> {
    let anchored = format!("^(?:{})$", pattern.replace('*', ".*"));
    match Regex::new(&anchored) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "Failed to compile permission pattern, treating as never matching"
            );
            None
        }
    }
}
