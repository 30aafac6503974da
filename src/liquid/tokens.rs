//! Parsed units of Liquid source text.
//!
//! Tokens keep enough information to reconstruct their original textual form:
//! block tags that capture raw sub-content (`style`, `javascript`,
//! `paginate`) splice the text of nested tokens back together and re-parse it
//! later, so the reconstruction must stay syntactically valid Liquid.

/// A single parsed unit of template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Raw text copied verbatim from the source.
    Text { raw: String },
    /// A `{{ expression }}` interpolation directive.
    Output { expr: String },
    /// A `{% name args %}` directive. `args` is empty for bare tags.
    Tag { name: String, args: String },
}

impl Token {
    /// Reconstructs the original textual form of the token.
    ///
    /// Text tokens are returned verbatim; output and tag tokens are rebuilt
    /// with canonical single-space delimiters, which re-parses to the same
    /// token.
    #[must_use]
    pub fn reconstruct(&self) -> String {
        match self {
            Self::Text { raw } => raw.clone(),
            Self::Output { expr } => format!("{{{{ {expr} }}}}"),
            Self::Tag { name, args } => {
                if args.is_empty() {
                    format!("{{% {name} %}}")
                } else {
                    format!("{{% {name} {args} %}}")
                }
            }
        }
    }

    /// The directive name if this is a tag token.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::Tag { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_output_with_delimiters() {
        let token = Token::Output {
            expr: "shop.name".to_string(),
        };
        assert_eq!(token.reconstruct(), "{{ shop.name }}");
    }

    #[test]
    fn reconstructs_bare_and_argumented_tags() {
        let bare = Token::Tag {
            name: "endstyle".to_string(),
            args: String::new(),
        };
        assert_eq!(bare.reconstruct(), "{% endstyle %}");

        let with_args = Token::Tag {
            name: "paginate".to_string(),
            args: "products by 8".to_string(),
        };
        assert_eq!(with_args.reconstruct(), "{% paginate products by 8 %}");
    }

    #[test]
    fn text_is_verbatim() {
        let token = Token::Text {
            raw: "  <div>\n</div>".to_string(),
        };
        assert_eq!(token.reconstruct(), "  <div>\n</div>");
    }
}
