//! Balanced content capture for block tags.
//!
//! Given a token stream positioned immediately after a block tag's opening
//! directive, [`capture_until_close`] returns the original source text up to
//! (but not including) the matching closing directive, handling nested
//! same-named tag pairs. The captured string is valid Liquid source and can
//! be re-parsed by the engine at render time.

use std::collections::VecDeque;

use crate::core::EngineError;
use crate::liquid::tokens::Token;

/// Captures the raw source text between a block tag and its matching closer.
///
/// Maintains a depth counter starting at 1: another `open` directive
/// increments it, a `close` directive decrements it, and capture terminates
/// when depth reaches 0. Matched tokens are consumed from the stream so the
/// outer parser never sees them again. The returned text never includes the
/// closing directive itself.
///
/// # Errors
///
/// Returns [`EngineError::UnclosedTag`] naming the expected closing directive
/// when the stream is exhausted first.
pub fn capture_until_close(
    stream: &mut VecDeque<Token>,
    open: &str,
    close: &str,
) -> Result<String, EngineError> {
    let mut depth = 1usize;
    let mut content = String::new();

    while let Some(token) = stream.pop_front() {
        if let Token::Tag { name, .. } = &token {
            if name == open {
                depth += 1;
            } else if name == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(content);
                }
            }
        }
        content.push_str(&token.reconstruct());
    }

    Err(EngineError::UnclosedTag {
        tag: open.to_string(),
        expected: close.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liquid::lexer::Lexer;

    fn stream_after_open(source: &str, open: &str) -> VecDeque<Token> {
        let mut tokens: VecDeque<Token> = Lexer::new(source).tokenize().unwrap().into();
        let first = tokens.pop_front().unwrap();
        assert_eq!(first.tag_name(), Some(open));
        tokens
    }

    #[test]
    fn captures_up_to_closer() {
        let mut stream = stream_after_open("{% style %}.a { color: red; }{% endstyle %}<p>", "style");
        let content = capture_until_close(&mut stream, "style", "endstyle").unwrap();
        assert_eq!(content, ".a { color: red; }");
        // The closer was consumed; the trailing text was not.
        assert_eq!(
            stream.pop_front(),
            Some(Token::Text {
                raw: "<p>".to_string()
            })
        );
    }

    #[test]
    fn nested_same_named_pairs_do_not_terminate_early() {
        let source = "{% style %}a{% style %}b{% endstyle %}c{% endstyle %}tail";
        let mut stream = stream_after_open(source, "style");
        let content = capture_until_close(&mut stream, "style", "endstyle").unwrap();
        assert_eq!(content, "a{% style %}b{% endstyle %}c");
        assert_eq!(
            stream.pop_front(),
            Some(Token::Text {
                raw: "tail".to_string()
            })
        );
    }

    #[test]
    fn reconstructs_outputs_and_tags_for_reparsing() {
        let source = "{% javascript %}var n = '{{ shop.name }}';{% if a %}x{% endif %}{% endjavascript %}";
        let mut stream = stream_after_open(source, "javascript");
        let content = capture_until_close(&mut stream, "javascript", "endjavascript").unwrap();
        assert_eq!(content, "var n = '{{ shop.name }}';{% if a %}x{% endif %}");
        // Captured content re-lexes cleanly.
        assert!(Lexer::new(&content).tokenize().is_ok());
    }

    #[test]
    fn exhausted_stream_is_an_unclosed_tag_error() {
        let mut stream = stream_after_open("{% paginate products by 4 %}body", "paginate");
        let err = capture_until_close(&mut stream, "paginate", "endpaginate").unwrap_err();
        match err {
            EngineError::UnclosedTag { tag, expected } => {
                assert_eq!(tag, "paginate");
                assert_eq!(expected, "endpaginate");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deeply_nested_pairs_balance_exactly_once() {
        let source = "{% style %}1{% style %}2{% style %}3{% endstyle %}4{% endstyle %}5{% endstyle %}";
        let mut stream = stream_after_open(source, "style");
        let content = capture_until_close(&mut stream, "style", "endstyle").unwrap();
        assert_eq!(content, "1{% style %}2{% style %}3{% endstyle %}4{% endstyle %}5");
        assert!(stream.is_empty());
    }
}
