//! Error handling for the storefront engine
//!
//! The error system follows two rules that shape the whole crate:
//!
//! 1. **Parse-time structural errors are fatal**: an unclosed tag, a
//!    malformed `paginate` argument or a `section` tag without a name should
//!    fail fast while a theme is being compiled, not degrade silently at
//!    request time.
//! 2. **Render-time and fetch-time errors are contained**: a failing tag
//!    body or data kind is logged and replaced with a fallback (unevaluated
//!    source, an HTML comment, or empty data). End users never see a stack
//!    trace from this crate; the worst case is a visibly degraded page.
//!
//! [`EngineError`] is the closed taxonomy for the first category plus the
//! recoverable conditions tags catch locally. Orchestration code in
//! [`crate::loader`] composes these with [`anyhow::Context`] the same way the
//! rest of the crate does.

use thiserror::Error;

/// Enumerated error types for template parsing and rendering.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A block tag's opening directive has no matching closer before the end
    /// of input. Fatal to parsing that template.
    #[error("tag {{% {tag} %}} is not closed, expected {{% {expected} %}}")]
    UnclosedTag { tag: String, expected: String },

    /// Malformed tag arguments, e.g. a `paginate` tag missing its `by`
    /// clause. Fatal to parsing that occurrence.
    #[error("invalid {tag} syntax: '{args}'. Expected: {expected}")]
    InvalidSyntax {
        tag: String,
        args: String,
        expected: &'static str,
    },

    /// A directive requiring an identifier received none.
    #[error("tag {{% {tag} %}} requires a name argument")]
    MissingName { tag: String },

    /// An output or tag delimiter was opened but never terminated.
    #[error("unterminated {construct} starting at byte {offset}")]
    UnterminatedDelimiter { construct: &'static str, offset: usize },

    /// Nested rendering exceeded the depth bound. Raised instead of looping
    /// when a captured body keeps re-entering the evaluator.
    #[error("render depth limit of {limit} exceeded")]
    RenderDepthExceeded { limit: usize },

    /// Nested Liquid evaluation of a captured body failed at render time.
    /// Tags recover from this locally by falling back to unevaluated source.
    #[error("evaluation failed: {message}")]
    Evaluation { message: String },
}

impl EngineError {
    /// Whether the error is recoverable at render time.
    ///
    /// Recoverable errors are contained by the tag that hit them; structural
    /// errors propagate out of the parse phase.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Evaluation { .. } | Self::RenderDepthExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclosed_tag_names_expected_closer() {
        let err = EngineError::UnclosedTag {
            tag: "style".to_string(),
            expected: "endstyle".to_string(),
        };
        assert!(err.to_string().contains("endstyle"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn evaluation_errors_are_recoverable() {
        let err = EngineError::Evaluation {
            message: "boom".to_string(),
        };
        assert!(err.is_recoverable());
    }
}
