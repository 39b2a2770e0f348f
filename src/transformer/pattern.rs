//! Segment pattern compilation
//!
//! A [`SegmentPattern`] is the compiled form of the user supplied
//! `expression`. It always matches a whole namespace segment: the expression
//! is wrapped in `^(?:...)$` before compilation, so `1\.1` does not match the
//! segment `11.1.1`.
//!
//! # Example
//!
//! ```
//! use ns_filter::transformer::SegmentPattern;
//!
//! let ip = SegmentPattern::compile(r"([0-9]{1,3}\.){3}([0-9]{1,3})")?;
//! assert!(ip.is_match("10.255.255.100"));
//! assert!(!ip.is_match("host-10.255.255.100"));
//! # Ok::<(), ns_filter::error::PatternError>(())
//! ```

use std::fmt;

use regex::Regex;

use crate::error::PatternError;

/// Compiled whole-segment pattern
#[derive(Clone)]
pub struct SegmentPattern {
    /// Expression as supplied by the caller
    source: String,
    /// Anchored regex
    regex: Regex,
}

impl SegmentPattern {
    /// Compile `expression`
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] carrying the original expression and the
    /// regex diagnostic if the expression is not valid.
    pub fn compile(expression: &str) -> Result<Self, PatternError> {
        // Diagnostics must refer to the caller's text, not the anchored form.
        Regex::new(expression).map_err(|e| PatternError {
            pattern: expression.to_string(),
            source: e,
        })?;

        let anchored = format!("^(?:{})$", expression);
        let regex = Regex::new(&anchored).map_err(|e| PatternError {
            pattern: expression.to_string(),
            source: e,
        })?;

        tracing::trace!(pattern = %expression, "Compiled segment pattern");

        Ok(Self {
            source: expression.to_string(),
            regex,
        })
    }

    /// Whether `segment` matches as a whole
    pub fn is_match(&self, segment: &str) -> bool {
        self.regex.is_match(segment)
    }

    /// Expression as supplied by the caller
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SegmentPattern").field(&self.source).finish()
    }
}

impl fmt::Display for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
