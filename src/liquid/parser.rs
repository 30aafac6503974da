//! Parser: token stream → renderable node tree.
//!
//! Custom tag instances are constructed here, once per occurrence, before any
//! render happens. They are immutable after construction and safe to render
//! repeatedly against different context snapshots.

use std::collections::VecDeque;

use serde_json::Value;

use crate::core::EngineError;
use crate::liquid::context::RenderContext;
use crate::liquid::filters;
use crate::liquid::lexer::Lexer;
use crate::liquid::tags::javascript::JavascriptTag;
use crate::liquid::tags::paginate::PaginateTag;
use crate::liquid::tags::section::SectionTag;
use crate::liquid::tags::style::{StyleTag, StyleVariant};
use crate::liquid::tokens::Token;

/// A parsed template, ready to render any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Text(String),
    Output(OutputExpr),
    Style(StyleTag),
    Javascript(JavascriptTag),
    Section(SectionTag),
    Paginate(PaginateTag),
    /// A directive this engine does not implement (`if`, `for`, `assign`,
    /// third-party tags). Rendered as nothing; the engine is lenient the way
    /// the storefront templates expect.
    Opaque { name: String },
}

/// An output expression: a value source plus an optional filter pipeline.
#[derive(Debug, Clone)]
pub(crate) struct OutputExpr {
    value: ExprValue,
    filter_names: Vec<String>,
}

#[derive(Debug, Clone)]
enum ExprValue {
    Path(String),
    StringLit(String),
    NumberLit(serde_json::Number),
}

impl OutputExpr {
    pub(crate) fn parse(expr: &str) -> Self {
        let mut parts = split_pipeline(expr);
        let head = parts.remove(0);
        let value = parse_value(&head);
        Self {
            value,
            filter_names: parts,
        }
    }

    pub(crate) fn evaluate(&self, ctx: &RenderContext) -> Value {
        let base = match &self.value {
            ExprValue::Path(path) => ctx.get_path(path).cloned().unwrap_or(Value::Null),
            ExprValue::StringLit(s) => Value::String(s.clone()),
            ExprValue::NumberLit(n) => Value::Number(n.clone()),
        };
        self.filter_names
            .iter()
            .fold(base, |value, name| filters::apply(name, value))
    }
}

fn parse_value(head: &str) -> ExprValue {
    let head = head.trim();
    if (head.starts_with('\'') && head.ends_with('\'') && head.len() >= 2)
        || (head.starts_with('"') && head.ends_with('"') && head.len() >= 2)
    {
        return ExprValue::StringLit(head[1..head.len() - 1].to_string());
    }
    if let Ok(number) = head.parse::<serde_json::Number>() {
        return ExprValue::NumberLit(number);
    }
    ExprValue::Path(head.to_string())
}

/// Splits a pipeline on `|`, ignoring pipes inside quoted strings.
fn split_pipeline(expr: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in expr.chars() {
        match (ch, quote) {
            ('\'' | '"', None) => {
                quote = Some(ch);
                current.push(ch);
            }
            (q, Some(open)) if q == open => {
                quote = None;
                current.push(q);
            }
            ('|', None) => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            (other, _) => current.push(other),
        }
    }
    parts.push(current.trim().to_string());
    if parts.is_empty() {
        parts.push(String::new());
    }
    parts
}

/// Parses template source into a node tree.
///
/// # Errors
///
/// Structural errors (unterminated delimiters, unclosed block tags, malformed
/// custom-tag arguments, a `section` tag with no name) propagate; a template
/// with broken custom-tag syntax fails fast at parse time.
pub fn parse(source: &str) -> Result<Template, EngineError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut stream: VecDeque<Token> = tokens.into();
    let mut nodes = Vec::new();

    while let Some(token) = stream.pop_front() {
        let node = match token {
            Token::Text { raw } => Node::Text(raw),
            Token::Output { expr } => Node::Output(OutputExpr::parse(&expr)),
            Token::Tag { name, args } => match name.as_str() {
                "style" => Node::Style(StyleTag::parse(&mut stream, StyleVariant::Style)?),
                "stylesheet" => {
                    Node::Style(StyleTag::parse(&mut stream, StyleVariant::Stylesheet)?)
                }
                "javascript" => Node::Javascript(JavascriptTag::parse(&mut stream)?),
                "section" => Node::Section(SectionTag::parse(&args)?),
                "paginate" => Node::Paginate(PaginateTag::parse(&args, &mut stream)?),
                other => {
                    tracing::debug!("unimplemented tag '{other}', rendering as empty");
                    Node::Opaque {
                        name: other.to_string(),
                    }
                }
            },
        };
        nodes.push(node);
    }

    Ok(Template { nodes })
}
