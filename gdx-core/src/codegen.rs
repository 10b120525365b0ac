//! GDScript rendering of tag trees.
//!
//! A node becomes `create_node(Class, {"prop": value, ...}, [children])`.
//! Line breaks between properties and children follow the source: each
//! item is preceded by as many newlines as source lines were skipped,
//! followed by the indentation text of the line it came from.

use std::fmt::Write;

use crate::ast::TagNode;
use crate::cursor::Cursor;
use crate::parser::Declarations;
use crate::token::{TagProperty, Value};

/// Renders `node` and everything below it.
pub fn render(node: &TagNode<'_>, declarations: &Declarations<'_>) -> String {
    let mut renderer = Renderer {
        declarations,
        out: String::new(),
    };
    renderer.node(node);
    renderer.out
}

struct Renderer<'d, 'src> {
    declarations: &'d Declarations<'src>,
    out: String,
}

impl Renderer<'_, '_> {
    fn node(&mut self, node: &TagNode<'_>) {
        let mut line = node.range.start.line();
        let class = match node.class_name {
            "self" => "get_script()",
            name => name,
        };
        let _ = write!(self.out, "create_node({class}, {{");

        let mut appended: Option<&TagProperty<'_>> = None;
        let mut first = true;
        for property in &node.properties {
            if property.name == "children" {
                appended = Some(property);
                continue;
            }
            self.separate(first, &mut line, property.range.start);
            let _ = write!(self.out, "\"{}\": ", property.name);
            self.value(&property.value);
            line = property.range.end.line();
            first = false;
        }

        self.out.push_str("}, [");
        first = true;
        for child in &node.children {
            self.separate(first, &mut line, child.range.start);
            self.node(child);
            line = child.range.end.line();
            first = false;
        }
        self.separate(true, &mut line, node.closer);
        self.out.push(']');

        if let Some(children) = appended {
            self.out.push_str(" + ");
            self.value(&children.value);
        }
        self.out.push(')');
    }

    /// Writes the separator before an item and reproduces the source line
    /// breaks up to `at`.
    fn separate(&mut self, first: bool, line: &mut usize, at: Cursor<'_>) {
        let breaks = at.line().saturating_sub(*line);
        if !first {
            self.out.push_str(if breaks > 0 { "," } else { ", " });
        }
        if breaks > 0 {
            self.out.extend(std::iter::repeat_n('\n', breaks));
            self.out.push_str(at.indentation());
            *line = at.line();
        }
    }

    fn value(&mut self, value: &Value<'_>) {
        match value.as_identifier() {
            Some(name) if self.declarations.is_function(name) => {
                let _ = write!(self.out, "funcref(self, \"{name}\")");
            }
            _ => self.out.push_str(&value.code),
        }
    }
}
