//! Lexer for GDX sources.
//!
//! Token rules are plain functions over the [`Matcher`]. The driver tries
//! them in priority order at each position and silently steps over
//! anything none of them recognizes, so ordinary GDScript flows past
//! without producing tokens.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cursor::{Cursor, Range};
use crate::error::ParseError;
use crate::matcher::{Capture, MatchResult, Matcher};
use crate::token::{
    FuncDeclaration, ImportToken, TagKind, TagProperty, TagToken, Token, Value, ValueKind,
    VarDeclaration, quote,
};

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("lexer pattern is valid")
}

static SYMBOL: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z_][A-Za-z0-9_]*"));
static PROPERTY_NAME: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z_][A-Za-z0-9_:.]*"));
static PATH: Lazy<Regex> =
    Lazy::new(|| pattern(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*"));
static IDENT_CHAR: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z0-9_]"));
static HEX: Lazy<Regex> = Lazy::new(|| pattern(r"^[+-]?0x[0-9a-fA-F]+"));
static BINARY: Lazy<Regex> = Lazy::new(|| pattern(r"^[+-]?0b[01]+"));
static DECIMAL: Lazy<Regex> = Lazy::new(|| pattern(r"^[+-]?[0-9]+"));
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^[+-]?[0-9]+(?:\.[0-9]*(?:[eE][+-]?[0-9]+)?[fF]?|[eE][+-]?[0-9]+[fF]?|[fF])")
});
static TRIPLE_STRING: Lazy<Regex> = Lazy::new(|| pattern(r#"(?s)^""".*?""""#));
static STRING: Lazy<Regex> =
    Lazy::new(|| pattern(r#"^(?:"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')"#));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| pattern(r" {2,}"));

/// Owns the match engine for one source buffer.
pub struct Lexer<'src> {
    matcher: Matcher<'src>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            matcher: Matcher::new(source),
        }
    }

    pub fn source(&self) -> &'src str {
        self.matcher.source()
    }

    /// Starts a fresh scan from the beginning of the source.
    ///
    /// The returned iterator borrows the lexer mutably: a scan has to be
    /// drained or dropped before the next one can start.
    pub fn tokens(&mut self) -> Tokens<'_, 'src> {
        self.matcher.reset();
        Tokens {
            matcher: &mut self.matcher,
            open_tags: 0,
            done: false,
        }
    }
}

/// Lazy token stream. Stops after the first error.
pub struct Tokens<'l, 'src> {
    matcher: &'l mut Matcher<'src>,
    /// Open tags minus close tags seen so far.
    open_tags: usize,
    done: bool,
}

impl<'src> Tokens<'_, 'src> {
    fn step(&mut self) -> MatchResult<Token<'src>> {
        let m = &mut *self.matcher;
        loop {
            let mut cursor = m.cursor();
            cursor.skip_ignorable();
            m.rewind(cursor);
            if cursor.is_eof() {
                return Ok(None);
            }

            let token = m.alt(&[&import, &var_declaration, &func_declaration, &tag])?;
            if m.depth() != 0 {
                return Err(ParseError::at(
                    "Not all match frames were closed",
                    &m.cursor(),
                ));
            }
            if let Some(Token::Tag(tag)) = &token {
                match tag.kind {
                    TagKind::Open => self.open_tags += 1,
                    TagKind::Close => self.open_tags = self.open_tags.saturating_sub(1),
                    TagKind::Single => {}
                }
            }
            if token.is_some() {
                return Ok(token);
            }
            m.rewind(skip_unrecognized(cursor, self.open_tags == 0));
        }
    }
}

impl<'src> Iterator for Tokens<'_, 'src> {
    type Item = Result<Token<'src>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = self.step();
        self.done = !matches!(step, Ok(Some(_)));
        step.transpose()
    }
}

/// Steps over one char, a whole identifier word (so keywords never match
/// inside one) or a whole string (so its text is never lexed).
///
/// Single-quoted strings are only stepped over when `in_code` is set.
/// Inside a tag body a `'` is an apostrophe, as in `<Label>Don't</Label>`.
fn skip_unrecognized(mut cursor: Cursor<'_>, in_code: bool) -> Cursor<'_> {
    let rest = cursor.rest();
    let quoted = rest.starts_with('"') || (in_code && rest.starts_with('\''));
    if quoted && let Some(string) = TRIPLE_STRING.find(rest).or_else(|| STRING.find(rest)) {
        cursor.advance_to(cursor.position() + string.end());
        return cursor;
    }
    let is_word = |ch: char| ch.is_alphanumeric() || ch == '_';
    if cursor.current().is_some_and(is_word) {
        while cursor.current().is_some_and(is_word) {
            cursor.advance();
        }
    } else {
        cursor.advance();
    }
    cursor
}

// ---------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------

fn scoped<'src, T>(
    m: &mut Matcher<'src>,
    rule: impl FnOnce(&mut Matcher<'src>) -> MatchResult<T>,
) -> MatchResult<T> {
    Ok(m.scope(rule)?.map(|(value, _)| value))
}

fn required<'src, T>(
    m: &mut Matcher<'src>,
    message: &str,
    rule: impl FnOnce(&mut Matcher<'src>) -> MatchResult<T>,
) -> MatchResult<T> {
    Ok(m.require(message).scope(rule)?.map(|(value, _)| value))
}

/// `word` not directly followed by an identifier char.
fn keyword<'src>(m: &mut Matcher<'src>, word: &str) -> MatchResult<Capture<'src>> {
    let Some(capture) = m.literal(word)? else {
        return Ok(None);
    };
    Ok(m.negate().regex(&IDENT_CHAR)?.map(|_| capture))
}

fn symbol<'src>(m: &mut Matcher<'src>) -> MatchResult<Capture<'src>> {
    m.regex(&SYMBOL)
}

// ---------------------------------------------------------------------
// Top-level rules
// ---------------------------------------------------------------------

fn import<'src>(m: &mut Matcher<'src>) -> MatchResult<Token<'src>> {
    let Some(start) = keyword(m, "import")? else {
        return Ok(None);
    };
    let Some(name) = required(m, "Expected name of the imported component", symbol)? else {
        return Ok(None);
    };
    if required(m, "Expected token \"from\"", |m| keyword(m, "from"))?.is_none() {
        return Ok(None);
    }
    let Some(path) = required(m, "Expected path string", string_literal)? else {
        return Ok(None);
    };
    Ok(Some(Token::Import(ImportToken {
        class_name: name.range.as_str(),
        path: path.value,
        range: Range::new(start.range.start, path.range.end),
    })))
}

fn var_declaration<'src>(m: &mut Matcher<'src>) -> MatchResult<Token<'src>> {
    let Some(start) = keyword(m, "var")? else {
        return Ok(None);
    };
    let declaration = variable(m, Some(start.range.start), literal_initializer)?;
    Ok(declaration.map(Token::VarDeclaration))
}

fn func_declaration<'src>(m: &mut Matcher<'src>) -> MatchResult<Token<'src>> {
    let Some(start) = keyword(m, "func")? else {
        return Ok(None);
    };
    // Anonymous `func(...)` lambdas are not declarations.
    let Some(name) = scoped(m, symbol)? else {
        return Ok(None);
    };
    if required(m, "Expected \"(\" after function name", |m| m.literal("("))?.is_none() {
        return Ok(None);
    }

    let mut params = Vec::new();
    if let Some(first) = scoped(m, parameter)? {
        params.push(first.name);
        let rest = m.many(|m| {
            if m.literal(",")?.is_none() {
                return Ok(None);
            }
            scoped(m, parameter)
        })?;
        params.extend(rest.into_iter().map(|param| param.name));
        scoped(m, |m| m.literal(","))?;
    }

    if required(m, "Expected \")\" to close the parameter list", |m| m.literal(")"))?.is_none() {
        return Ok(None);
    }
    scoped(m, return_type)?;

    Ok(Some(Token::FuncDeclaration(FuncDeclaration {
        name: name.range.as_str(),
        params,
        range: Range::new(start.range.start, m.cursor()),
    })))
}

fn tag<'src>(m: &mut Matcher<'src>) -> MatchResult<Token<'src>> {
    let Some(opener) = m.alt(&[&|m| m.literal("</"), &|m| m.literal("<")])? else {
        return Ok(None);
    };
    // The class name has to follow `<` directly, which keeps `a < b` out.
    let Some(class) = m.regex(&PATH)? else {
        return Ok(None);
    };
    let properties = m.many(property)?;
    // Without properties only a following `/` or `>` commits to a tag, so
    // comparisons such as `a<b` stay plain code.
    if properties.is_empty() {
        let mut next = m.cursor();
        next.skip_ignorable();
        if !matches!(next.current(), Some('/' | '>')) {
            return Ok(None);
        }
    }
    let Some(closer) = m
        .require("Expected tag close \"/>\" or \">\"")
        .alt(&[&|m| m.literal("/>"), &|m| m.literal(">")])?
    else {
        return Ok(None);
    };

    let kind = match (&*opener.text, &*closer.text) {
        ("<", ">") => TagKind::Open,
        ("<", _) => TagKind::Single,
        (_, ">") => TagKind::Close,
        _ => {
            return Err(ParseError::at(
                "Can't end closing tag with \"/>\"",
                &closer.range.start,
            ));
        }
    };
    if kind == TagKind::Close
        && let Some(property) = properties.first()
    {
        return Err(ParseError::at(
            "Closing tag can't have properties",
            &property.range.start,
        ));
    }

    Ok(Some(Token::Tag(TagToken {
        kind,
        class_name: class.range.as_str(),
        properties,
        range: Range::new(opener.range.start, closer.range.end),
        closer: closer.range.start,
    })))
}

// ---------------------------------------------------------------------
// Declaration pieces
// ---------------------------------------------------------------------

fn variable<'src>(
    m: &mut Matcher<'src>,
    start: Option<Cursor<'src>>,
    initializer: impl FnOnce(&mut Matcher<'src>) -> MatchResult<()>,
) -> MatchResult<VarDeclaration<'src>> {
    let Some(name) = scoped(m, symbol)? else {
        return Ok(None);
    };
    scoped(m, type_hint)?;
    scoped(m, initializer)?;
    Ok(Some(VarDeclaration {
        name: name.range.as_str(),
        range: Range::new(start.unwrap_or(name.range.start), m.cursor()),
    }))
}

fn parameter<'src>(m: &mut Matcher<'src>) -> MatchResult<VarDeclaration<'src>> {
    variable(m, None, default_initializer)
}

/// `: Type`, or a bare `:` as in `x := 1`.
fn type_hint<'src>(m: &mut Matcher<'src>) -> MatchResult<()> {
    if m.literal(":")?.is_none() {
        return Ok(None);
    }
    scoped(m, type_name)?;
    Ok(Some(()))
}

fn type_name<'src>(m: &mut Matcher<'src>) -> MatchResult<()> {
    if m.regex(&PATH)?.is_none() {
        return Ok(None);
    }
    m.delimited('[', ']')?;
    Ok(Some(()))
}

fn return_type<'src>(m: &mut Matcher<'src>) -> MatchResult<()> {
    if m.literal("->")?.is_none() {
        return Ok(None);
    }
    scoped(m, type_name)
}

fn literal_initializer<'src>(m: &mut Matcher<'src>) -> MatchResult<()> {
    if m.literal("=")?.is_none() {
        return Ok(None);
    }
    Ok(scoped(m, literal_value)?.map(|_| ()))
}

fn default_initializer<'src>(m: &mut Matcher<'src>) -> MatchResult<()> {
    if m.literal("=")?.is_none() {
        return Ok(None);
    }
    Ok(scoped(m, default_expression)?.map(|_| ()))
}

/// Everything up to the next `,` or `)` at bracket depth zero.
fn default_expression<'src>(m: &mut Matcher<'src>) -> MatchResult<Capture<'src>> {
    let rest = m.cursor().rest();
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    let mut end = rest.len();
    for (index, ch) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' if depth > 0 => depth -= 1,
            ',' | ')' | ']' | '}' if depth == 0 => {
                end = index;
                break;
            }
            _ => {}
        }
    }
    let expression = rest[..end].trim_end();
    if expression.is_empty() {
        return Ok(None);
    }
    m.literal(expression)
}

// ---------------------------------------------------------------------
// Tag properties and values
// ---------------------------------------------------------------------

fn property<'src>(m: &mut Matcher<'src>) -> MatchResult<TagProperty<'src>> {
    let Some(head) = m.seq(&[&property_name, &equals])? else {
        return Ok(None);
    };
    let value = value(m)?;
    m.require_last("Expected value")?;
    let Some(value) = value else {
        return Ok(None);
    };
    let name = &head[0];
    Ok(Some(TagProperty {
        name: Cow::Borrowed(name.range.as_str()),
        value,
        range: Range::new(name.range.start, m.cursor()),
    }))
}

fn property_name<'src>(m: &mut Matcher<'src>) -> MatchResult<Capture<'src>> {
    m.regex(&PROPERTY_NAME)
}

fn equals<'src>(m: &mut Matcher<'src>) -> MatchResult<Capture<'src>> {
    scoped(m, |m| m.literal("="))
}

/// Any value: literal, call, accessor or code block, in that order.
fn value<'src>(m: &mut Matcher<'src>) -> MatchResult<Value<'src>> {
    m.alt(&[&literal_value, &call, &accessor, &block])
}

fn literal_value<'src>(m: &mut Matcher<'src>) -> MatchResult<Value<'src>> {
    if let Some(string) = scoped(m, string_literal)? {
        return Ok(Some(Value::new(ValueKind::Str, string.code)));
    }
    let number = m.alt(&[&float, &integer])?;
    Ok(number.map(|capture| Value::new(ValueKind::Number, capture.text)))
}

fn integer<'src>(m: &mut Matcher<'src>) -> MatchResult<Capture<'src>> {
    m.alt(&[&|m| m.regex(&HEX), &|m| m.regex(&BINARY), &|m| m.regex(&DECIMAL)])
}

fn float<'src>(m: &mut Matcher<'src>) -> MatchResult<Capture<'src>> {
    m.regex(&FLOAT)
}

struct StringLiteral<'src> {
    /// Contents without quotes.
    value: Cow<'src, str>,
    /// The literal as it is emitted.
    code: Cow<'src, str>,
    range: Range<'src>,
}

fn string_literal<'src>(m: &mut Matcher<'src>) -> MatchResult<StringLiteral<'src>> {
    if let Some(raw) = m.regex(&TRIPLE_STRING)? {
        let text = raw.range.as_str();
        let value = normalize_triple(&text[3..text.len() - 3]);
        let code = quote(&value);
        m.rewrite_last(|_| code.clone());
        return Ok(Some(StringLiteral {
            value: Cow::Owned(value),
            code: Cow::Owned(code),
            range: raw.range,
        }));
    }
    let Some(raw) = m.regex(&STRING)? else {
        return Ok(None);
    };
    let text = raw.range.as_str();
    Ok(Some(StringLiteral {
        value: Cow::Borrowed(&text[1..text.len() - 1]),
        code: Cow::Borrowed(text),
        range: raw.range,
    }))
}

/// Tabs dropped, line breaks turned into spaces, space runs collapsed.
fn normalize_triple(text: &str) -> String {
    let flat: String = text
        .chars()
        .filter(|&ch| ch != '\t')
        .map(|ch| if ch == '\n' { ' ' } else { ch })
        .collect();
    SPACE_RUN.replace_all(&flat, " ").into_owned()
}

fn block<'src>(m: &mut Matcher<'src>) -> MatchResult<Value<'src>> {
    if m.delimited('{', '}')?.is_none() {
        return Ok(None);
    }
    let code = m.rewrite_last(|inner| inner.trim().to_string());
    Ok(code.map(|capture| Value::new(ValueKind::Block, capture.text)))
}

fn accessor<'src>(m: &mut Matcher<'src>) -> MatchResult<Value<'src>> {
    let path = m.regex(&PATH)?;
    Ok(path.map(|capture| Value::new(ValueKind::Symbol, capture.text)))
}

/// `path(args)` followed by any `.member` / `.member(args)` chain.
fn call<'src>(m: &mut Matcher<'src>) -> MatchResult<Value<'src>> {
    let joined = m.scope(|m| {
        if m.regex(&PATH)?.is_none() || arguments(m)?.is_none() {
            return Ok(None);
        }
        m.many(member)?;
        Ok(Some(()))
    })?;
    Ok(joined.map(|(_, capture)| Value::new(ValueKind::Call, capture.text)))
}

fn member<'src>(m: &mut Matcher<'src>) -> MatchResult<()> {
    if m.literal(".")?.is_none() || m.regex(&PATH)?.is_none() {
        return Ok(None);
    }
    arguments(m)?;
    Ok(Some(()))
}

fn arguments<'src>(m: &mut Matcher<'src>) -> MatchResult<()> {
    if m.literal("(")?.is_none() {
        return Ok(None);
    }
    if scoped(m, value)?.is_some() {
        m.many(|m| {
            if m.literal(",")?.is_none() {
                return Ok(None);
            }
            required(m, "Expected value", value)
        })?;
    }
    Ok(required(m, "Expected \")\"", |m| m.literal(")"))?.map(|_| ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token<'_>> {
        Lexer::new(source)
            .tokens()
            .collect::<Result<Vec<_>, _>>()
            .expect("lex should succeed")
    }

    fn lex_err(source: &str) -> ParseError {
        Lexer::new(source)
            .tokens()
            .find_map(Result::err)
            .expect("lex should fail")
    }

    fn tags<'a>(tokens: &'a [Token<'a>]) -> Vec<&'a TagToken<'a>> {
        tokens
            .iter()
            .filter_map(|token| match token {
                Token::Tag(tag) => Some(tag),
                _ => None,
            })
            .collect()
    }

    fn single_property_value(source: &str) -> String {
        let tokens = lex(source);
        let tags = tags(&tokens);
        tags[0].properties[0].value.code.to_string()
    }

    #[test]
    fn plain_gdscript_produces_no_tokens() {
        let tokens = lex("extends Node\n\nif a < b and c<=d:\n    print(a << 2)\n");
        assert!(tokens.is_empty());
    }

    #[test]
    fn lexes_import() {
        let tokens = lex("import ClickButton from \"./click_button.gdx\"\n");
        let Token::Import(import) = &tokens[0] else {
            panic!("expected import, got {:?}", tokens[0]);
        };
        assert_eq!(import.class_name, "ClickButton");
        assert_eq!(import.path, "./click_button.gdx");
        assert_eq!(
            import.range.as_str(),
            "import ClickButton from \"./click_button.gdx\""
        );
    }

    #[test]
    fn keywords_do_not_match_inside_identifiers() {
        assert!(lex("importance = 3\nreimport(x)\nvariant = 2\n").is_empty());
    }

    #[test]
    fn import_without_path_is_an_error() {
        let err = lex_err("import Foo from 42");
        assert_eq!(err.message, "Expected path string");
        assert_eq!((err.line, err.column), (1, 16));
    }

    #[test]
    fn lexes_variable_declarations() {
        let tokens = lex("var a\nvar b: int = 3\nvar c := \"x\"\nvar d = <A/>\n");
        let names: Vec<_> = tokens
            .iter()
            .filter_map(|token| match token {
                Token::VarDeclaration(var) => Some(var.name),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
        assert_eq!(tokens[1].range().as_str(), "var b: int = 3");
        assert_eq!(tags(&tokens).len(), 1);
    }

    #[test]
    fn lexes_function_declarations() {
        let tokens =
            lex("func f(a, b: int = 3, c := Vector2(1, 2), d: Array[int] = [],) -> void:\n\tpass\n");
        let Token::FuncDeclaration(func) = &tokens[0] else {
            panic!("expected function, got {:?}", tokens[0]);
        };
        assert_eq!(func.name, "f");
        assert_eq!(func.params, ["a", "b", "c", "d"]);
        assert!(func.range.as_str().ends_with("-> void"));
    }

    #[test]
    fn anonymous_functions_are_skipped() {
        assert_eq!(lex("var cb = func(x): return x\n").len(), 1);
    }

    #[test]
    fn malformed_function_header_is_an_error() {
        let err = lex_err("func broken\n\tpass\n");
        assert!(err.message.contains("\"(\""));
        let err = lex_err("func broken(a b):\n");
        assert!(err.message.contains("\")\""));
    }

    #[test]
    fn lexes_tag_kinds() {
        let tokens = lex("<A x=1><B/></A>");
        let tags = tags(&tokens);
        let kinds: Vec<_> = tags.iter().map(|tag| tag.kind).collect();
        assert_eq!(kinds, [TagKind::Open, TagKind::Single, TagKind::Close]);
        assert_eq!(tags[0].class_name, "A");
        assert_eq!(tags[0].range.as_str(), "<A x=1>");
        assert_eq!(tags[2].range.as_str(), "</A>");
    }

    #[test]
    fn lexes_properties_greedily() {
        let tokens = lex("<Button\n    key=i\n    ui:size = 0x1F\n    scale=1.5e3\n/>");
        let tags = tags(&tokens);
        let props: Vec<_> = tags[0]
            .properties
            .iter()
            .map(|p| (&*p.name, &*p.value.code, p.range.start.line()))
            .collect();
        assert_eq!(
            props,
            [("key", "i", 1), ("ui:size", "0x1F", 2), ("scale", "1.5e3", 3)]
        );
        assert_eq!(tags[0].closer.line(), 4);
    }

    #[test]
    fn lexes_numeric_and_quoted_literals() {
        let tokens = lex("<A a=0b101 b=-3 c=+2.5f d='x' e=1e3 f=2f g=-0x1F h=1./>");
        let tags = tags(&tokens);
        let codes: Vec<_> = tags[0]
            .properties
            .iter()
            .map(|p| (&*p.name, &*p.value.code))
            .collect();
        assert_eq!(
            codes,
            [
                ("a", "0b101"),
                ("b", "-3"),
                ("c", "+2.5f"),
                ("d", "'x'"),
                ("e", "1e3"),
                ("f", "2f"),
                ("g", "-0x1F"),
                ("h", "1."),
            ]
        );
        assert_eq!(tags[0].properties[3].value.kind, ValueKind::Str);
        assert_eq!(tags[0].properties[6].value.kind, ValueKind::Number);

        let err = lex_err("<A a=0b102/>");
        assert!(err.message.starts_with("Expected tag close"));
        assert_eq!((err.line, err.column), (1, 10));
    }

    #[test]
    fn normalizes_triple_quoted_strings() {
        let mut m = Matcher::new("\"\"\"line1\n\tline2   end\"\"\"");
        let string = string_literal(&mut m).unwrap().expect("string");
        assert_eq!(string.value, "line1 line2 end");
        assert_eq!(string.code, "\"line1 line2 end\"");
    }

    #[test]
    fn triple_string_stops_at_first_terminator() {
        let value = single_property_value("<L a=\"\"\"one\"\"\" b=\"\"\"two\"\"\"/>");
        assert_eq!(value, "\"one\"");
    }

    #[test]
    fn code_block_keeps_nested_braces() {
        let value = single_property_value("<L rect_size={ a + {nested} }/>");
        assert_eq!(value, "a + {nested}");
    }

    #[test]
    fn lexes_calls_and_accessors() {
        assert_eq!(
            single_property_value("<L v=get_button_size()/>"),
            "get_button_size()"
        );
        assert_eq!(
            single_property_value("<L v=Vector2(1, size.x).normalized()/>"),
            "Vector2(1,size.x).normalized()"
        );
        assert_eq!(single_property_value("<L v=self.theme.font/>"), "self.theme.font");
        assert_eq!(single_property_value("<L v=f(g({x}))/>"), "f(g(x))");
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = lex_err("<A x=/>");
        assert_eq!(err.message, "Expected value");
    }

    #[test]
    fn unclosed_argument_list_is_an_error() {
        let err = lex_err("<A x=f(1 2)/>");
        assert_eq!(err.message, "Expected \")\"");
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        let err = lex_err("<A x=1\nfunc");
        assert!(err.message.starts_with("Expected tag close"));
    }

    #[test]
    fn closing_tag_rules() {
        let err = lex_err("<A></A/>");
        assert!(err.message.contains("Can't end closing tag"));
        let err = lex_err("<A></A x=1>");
        assert!(err.message.contains("properties"));
        assert_eq!((err.line, err.column), (1, 8));
    }

    #[test]
    fn string_contents_are_not_lexed() {
        let tokens =
            lex("label.text = \"<b>bold</b>\"\nhint = \"\"\"<i>\"\"\"\n<Label>Don't</Label>");
        let names: Vec<_> = tags(&tokens).iter().map(|tag| tag.class_name).collect();
        assert_eq!(names, ["Label", "Label"]);
    }

    #[test]
    fn single_quoted_strings_in_code_are_not_lexed() {
        assert!(lex("print('a<b')\nlabel.text = '<b>bold</b>'\n").is_empty());

        let tokens = lex("var s = 'x'\n<Label>Don't <B/> stop</Label>");
        let names: Vec<_> = tags(&tokens).iter().map(|tag| tag.class_name).collect();
        assert_eq!(names, ["Label", "B", "Label"]);
    }

    #[test]
    fn comparisons_without_spaces_are_not_tags() {
        assert!(lex("if a<b:\n\tpass\nwhile i<count and j<k.size():\n\tpass\n").is_empty());
        let tokens = lex("if a<b:\n\tvar x = <A/>\n");
        assert_eq!(tags(&tokens).len(), 1);
    }

    #[test]
    fn default_values_step_over_escaped_quotes() {
        let tokens = lex("func f(a = \"x\\\",y\", b = '\\'', c):\n\tpass\n");
        let Token::FuncDeclaration(func) = &tokens[0] else {
            panic!("expected function, got {:?}", tokens[0]);
        };
        assert_eq!(func.params, ["a", "b", "c"]);
    }

    #[test]
    fn comments_are_skipped_whole() {
        assert!(lex("# <A/> import X from \"y\"\n").is_empty());
    }

    #[test]
    fn rescanning_starts_from_scratch() {
        let mut lexer = Lexer::new("var a\n<A/>");
        let first = lexer.tokens().count();
        let second = lexer.tokens().count();
        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }
}
