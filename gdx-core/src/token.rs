//! Tokens produced by the GDX lexer.

use std::borrow::Cow;

use crate::cursor::{Cursor, Range};

/// A recognized construct. Everything the lexer does not recognize is
/// ordinary GDScript and never becomes a token.
#[derive(Debug, Clone)]
pub enum Token<'src> {
    Import(ImportToken<'src>),
    VarDeclaration(VarDeclaration<'src>),
    FuncDeclaration(FuncDeclaration<'src>),
    Tag(TagToken<'src>),
}

impl<'src> Token<'src> {
    pub fn range(&self) -> Range<'src> {
        match self {
            Token::Import(token) => token.range,
            Token::VarDeclaration(token) => token.range,
            Token::FuncDeclaration(token) => token.range,
            Token::Tag(token) => token.range,
        }
    }
}

/// `import Name from "path"`.
#[derive(Debug, Clone)]
pub struct ImportToken<'src> {
    pub class_name: &'src str,
    /// The path with its quotes removed.
    pub path: Cow<'src, str>,
    pub range: Range<'src>,
}

/// Header of a variable declaration; only the name is kept.
#[derive(Debug, Clone)]
pub struct VarDeclaration<'src> {
    pub name: &'src str,
    pub range: Range<'src>,
}

/// Header of a function declaration; only the name and parameter names
/// are kept.
#[derive(Debug, Clone)]
pub struct FuncDeclaration<'src> {
    pub name: &'src str,
    pub params: Vec<&'src str>,
    pub range: Range<'src>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<Name props>`
    Open,
    /// `<Name props/>`
    Single,
    /// `</Name>`
    Close,
}

#[derive(Debug, Clone)]
pub struct TagToken<'src> {
    pub kind: TagKind,
    pub class_name: &'src str,
    pub properties: Vec<TagProperty<'src>>,
    pub range: Range<'src>,
    /// Start of the closing delimiter (`>` or `/>`).
    pub closer: Cursor<'src>,
}

/// `name=value` inside a tag.
#[derive(Debug, Clone)]
pub struct TagProperty<'src> {
    pub name: Cow<'src, str>,
    pub value: Value<'src>,
    pub range: Range<'src>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Number,
    Symbol,
    Call,
    Block,
    /// Expression assembled by the parser, e.g. folded tag text.
    Expr,
}

/// A property value, already in the form it is emitted as GDScript.
#[derive(Debug, Clone)]
pub struct Value<'src> {
    pub kind: ValueKind,
    pub code: Cow<'src, str>,
}

impl<'src> Value<'src> {
    pub fn new(kind: ValueKind, code: impl Into<Cow<'src, str>>) -> Self {
        Value {
            kind,
            code: code.into(),
        }
    }

    /// A double-quoted GDScript string literal holding `text`.
    pub fn string(text: &str) -> Self {
        Value::new(ValueKind::Str, quote(text))
    }

    /// Bare identifier, the only form that can name a declared function.
    pub fn as_identifier(&self) -> Option<&str> {
        (self.kind == ValueKind::Symbol && !self.code.contains('.')).then_some(&*self.code)
    }
}

/// Quotes `text` as a GDScript string, escaping `\` and `"`.
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
