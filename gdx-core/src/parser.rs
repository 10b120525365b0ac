//! Two-pass GDX parser.
//!
//! Pass A scans the whole source once and records declarations, so
//! functions can be referenced before they are declared. Pass B scans
//! again from the start, builds tag trees with an explicit stack and
//! replaces every finished top-level tag and every import in place.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::ast::TagNode;
use crate::codegen::render;
use crate::context::ParseContext;
use crate::cursor::{Cursor, Range};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::rewrite::Rewriter;
use crate::token::{
    FuncDeclaration, ImportToken, TagKind, TagProperty, TagToken, Token, Value, ValueKind,
};

/// Declarations found anywhere in one source.
///
/// The renderer only asks [`Declarations::is_function`]. The other lookups
/// are public API for callers that inspect a source's top-level names.
#[derive(Debug, Default)]
pub struct Declarations<'src> {
    variables: HashMap<&'src str, Range<'src>>,
    functions: HashMap<&'src str, FuncDeclaration<'src>>,
}

impl<'src> Declarations<'src> {
    /// Pass A. Imports count as variable declarations of their class name.
    pub fn collect(lexer: &mut Lexer<'src>) -> Result<Self, ParseError> {
        let mut declarations = Declarations::default();
        for token in lexer.tokens() {
            match token? {
                Token::VarDeclaration(var) => {
                    declarations.variables.insert(var.name, var.range);
                }
                Token::Import(import) => {
                    declarations.variables.insert(import.class_name, import.range);
                }
                Token::FuncDeclaration(func) => {
                    declarations.functions.insert(func.name, func);
                }
                Token::Tag(_) => {}
            }
        }
        Ok(declarations)
    }

    /// `var` declarations and imported class names.
    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// The header of `name`, with its parameter names.
    pub fn function(&self, name: &str) -> Option<&FuncDeclaration<'src>> {
        self.functions.get(name)
    }
}

pub struct Parser<'src, 'c> {
    lexer: Lexer<'src>,
    context: &'c ParseContext,
}

impl<'src, 'c> Parser<'src, 'c> {
    /// `source` is expected to use `\n` line breaks only; see [`parse`].
    pub fn new(source: &'src str, context: &'c ParseContext) -> Self {
        Parser {
            lexer: Lexer::new(source),
            context,
        }
    }

    pub fn parse(&mut self) -> Result<String, ParseError> {
        let declarations = Declarations::collect(&mut self.lexer)?;
        let mut builder = TreeBuilder {
            source: self.lexer.source(),
            context: self.context,
            declarations: &declarations,
            stack: Vec::new(),
            rewriter: Rewriter::new(self.lexer.source()),
        };
        for token in self.lexer.tokens() {
            match token? {
                Token::Import(import) => builder.import(&import)?,
                Token::Tag(tag) => builder.tag(tag)?,
                Token::VarDeclaration(_) | Token::FuncDeclaration(_) => {}
            }
        }
        builder.finish()
    }
}

/// Transforms one GDX source into GDScript.
pub fn parse(source: &str, context: &ParseContext) -> Result<String, ParseError> {
    let source = normalize_newlines(source);
    Parser::new(&source, context).parse()
}

/// [`parse`] with a default context rooted at `res://`.
pub fn transpile(source: &str) -> Result<String, ParseError> {
    parse(source, &ParseContext::default())
}

fn normalize_newlines(source: &str) -> Cow<'_, str> {
    if source.contains('\r') {
        Cow::Owned(source.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(source)
    }
}

/// Pass B state.
struct TreeBuilder<'src, 'a> {
    source: &'src str,
    context: &'a ParseContext,
    declarations: &'a Declarations<'src>,
    /// Open tags, outermost first.
    stack: Vec<TagNode<'src>>,
    rewriter: Rewriter,
}

impl<'src> TreeBuilder<'src, '_> {
    fn import(&mut self, import: &ImportToken<'src>) -> Result<(), ParseError> {
        if !self.stack.is_empty() {
            return Err(ParseError::at(
                "Imports can't appear inside a tag",
                &import.range.start,
            ));
        }
        let path = Value::string(&self.context.resolve(&import.path));
        let code = format!(
            "var {} = ResourceLoader.load({})",
            import.class_name, path.code
        );
        self.rewriter.replace(&import.range, &code);
        Ok(())
    }

    fn tag(&mut self, tag: TagToken<'src>) -> Result<(), ParseError> {
        match tag.kind {
            TagKind::Open => self.stack.push(TagNode::new(tag)),
            TagKind::Single => self.attach(TagNode::new(tag)),
            TagKind::Close => {
                let Some(mut node) = self.stack.pop() else {
                    return Err(ParseError::at(
                        "This tag is closing nothing",
                        &tag.range.start,
                    ));
                };
                if node.class_name != tag.class_name {
                    return Err(ParseError::at(
                        format!(
                            "This tag doesn't match with parent tag \"{}\"",
                            node.class_name
                        ),
                        &tag.range.start,
                    ));
                }
                if node.children.is_empty() {
                    self.fold_text(&mut node, tag.range.start);
                }
                node.finish(&tag);
                self.attach(node);
            }
        }
        Ok(())
    }

    /// Adds a finished node to the open parent, or emits it when top-level.
    fn attach(&mut self, node: TagNode<'src>) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => {
                let code = render(&node, self.declarations);
                self.rewriter.replace(&node.range, &code);
            }
        }
    }

    /// Turns raw body text into a `text` property, appending to an existing
    /// one with `+`.
    fn fold_text(&self, node: &mut TagNode<'src>, body_end: Cursor<'src>) {
        let raw = &self.source[node.body_start.position()..body_end.position()];
        let text: String = raw.chars().filter(|&ch| ch != '\n' && ch != '\t').collect();
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let folded = Value::string(text);
        if let Some(existing) = node.property_mut("text") {
            let joined = format!("{} + {}", existing.value.code, folded.code);
            existing.value = Value::new(ValueKind::Expr, joined);
            return;
        }

        let lead = raw.len() - raw.trim_start().len();
        let mut start = node.body_start;
        start.advance_to(start.position() + lead);
        let mut end = start;
        end.advance_to(start.position() + raw.trim().len());
        node.properties.push(TagProperty {
            name: Cow::Borrowed("text"),
            value: folded,
            range: Range::new(start, end),
        });
    }

    fn finish(self) -> Result<String, ParseError> {
        if let Some(unclosed) = self.stack.first() {
            return Err(ParseError::at(
                "Missing closing tag for this tag",
                &unclosed.range.start,
            ));
        }
        Ok(self.rewriter.finish())
    }
}
