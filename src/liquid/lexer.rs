//! Tokenizer for the Liquid dialect.
//!
//! Splits template source into text, output and tag tokens. Whitespace
//! control markers (`{{-`, `-%}}` and friends) are accepted and stripped from
//! the captured content; the engine does not implement trimming semantics.

use crate::core::EngineError;
use crate::liquid::tokens::Token;

const TAG_START: &str = "{%";
const TAG_END: &str = "%}";
const OUTPUT_START: &str = "{{";
const OUTPUT_END: &str = "}}";

pub struct Lexer<'a> {
    source: &'a str,
    current: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Lexer { source, current: 0 }
    }

    /// Tokenizes the whole source.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnterminatedDelimiter`] when an output or tag
    /// construct is opened but never closed.
    pub fn tokenize(mut self) -> Result<Vec<Token>, EngineError> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            let rest = &self.source[self.current..];
            if rest.starts_with(TAG_START) {
                tokens.push(self.lex_construct(TAG_END, "tag")?);
            } else if rest.starts_with(OUTPUT_START) {
                tokens.push(self.lex_construct(OUTPUT_END, "output")?);
            } else {
                tokens.push(self.lex_text());
            }
        }

        Ok(tokens)
    }

    fn lex_construct(
        &mut self,
        end: &str,
        construct: &'static str,
    ) -> Result<Token, EngineError> {
        let offset = self.current;
        self.current += 2;

        let Some(rel_end) = self.source[self.current..].find(end) else {
            return Err(EngineError::UnterminatedDelimiter { construct, offset });
        };

        let content = &self.source[self.current..self.current + rel_end];
        self.current += rel_end + 2;

        // Strip whitespace-control dashes; trimming itself is not applied.
        let content = content.strip_prefix('-').unwrap_or(content);
        let content = content.strip_suffix('-').unwrap_or(content);
        let content = content.trim();

        if construct == "output" {
            return Ok(Token::Output {
                expr: content.to_string(),
            });
        }

        let (name, args) = match content.split_once(char::is_whitespace) {
            Some((name, args)) => (name.to_string(), args.trim().to_string()),
            None => (content.to_string(), String::new()),
        };
        Ok(Token::Tag { name, args })
    }

    fn lex_text(&mut self) -> Token {
        let start = self.current;
        while !self.is_at_end() {
            let rest = &self.source[self.current..];
            if rest.starts_with(TAG_START) || rest.starts_with(OUTPUT_START) {
                break;
            }
            self.consume();
        }
        Token::Text {
            raw: self.source[start..self.current].to_string(),
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    #[inline]
    fn consume(&mut self) {
        if let Some(ch) = self.source[self.current..].chars().next() {
            self.current += ch.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_text_output_and_tags() {
        let tokens = Lexer::new("<p>{{ shop.name }}</p>{% assign a = 1 %}")
            .tokenize()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text {
                    raw: "<p>".to_string()
                },
                Token::Output {
                    expr: "shop.name".to_string()
                },
                Token::Text {
                    raw: "</p>".to_string()
                },
                Token::Tag {
                    name: "assign".to_string(),
                    args: "a = 1".to_string()
                },
            ]
        );
    }

    #[test]
    fn strips_whitespace_control_dashes() {
        let tokens = Lexer::new("{%- section 'header' -%}{{- cart.item_count -}}")
            .tokenize()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Tag {
                    name: "section".to_string(),
                    args: "'header'".to_string()
                },
                Token::Output {
                    expr: "cart.item_count".to_string()
                },
            ]
        );
    }

    #[test]
    fn bare_tag_has_empty_args() {
        let tokens = Lexer::new("{% endpaginate %}").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![Token::Tag {
                name: "endpaginate".to_string(),
                args: String::new()
            }]
        );
    }

    #[test]
    fn unterminated_output_is_an_error() {
        let err = Lexer::new("hello {{ shop.name").tokenize().unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnterminatedDelimiter {
                construct: "output",
                offset: 6
            }
        ));
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        let err = Lexer::new("{% style ").tokenize().unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnterminatedDelimiter {
                construct: "tag",
                ..
            }
        ));
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let tokens = Lexer::new("precio: 10 € {{ p }}").tokenize().unwrap();
        assert_eq!(
            tokens[0],
            Token::Text {
                raw: "precio: 10 € ".to_string()
            }
        );
    }
}
