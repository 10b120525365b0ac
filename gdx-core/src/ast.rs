use crate::cursor::{Cursor, Range};
use crate::token::{TagProperty, TagToken};

/// A tag with its children, built from matching Open/Close tokens or from
/// a single self-closing tag.
#[derive(Debug, Clone)]
pub struct TagNode<'src> {
    pub class_name: &'src str,
    pub properties: Vec<TagProperty<'src>>,
    pub children: Vec<TagNode<'src>>,
    /// Opening tag through matching closing tag once finalized.
    pub range: Range<'src>,
    /// Start of the final `>` / `/>`; the last line of the rendered node.
    pub closer: Cursor<'src>,
    /// End of the opening tag, where raw body text begins.
    pub body_start: Cursor<'src>,
}

impl<'src> TagNode<'src> {
    pub fn new(tag: TagToken<'src>) -> Self {
        TagNode {
            class_name: tag.class_name,
            properties: tag.properties,
            children: Vec::new(),
            range: tag.range,
            closer: tag.closer,
            body_start: tag.range.end,
        }
    }

    /// Extends the node over its closing tag.
    pub fn finish(&mut self, close: &TagToken<'src>) {
        self.range = self.range.to(&close.range);
        self.closer = close.closer;
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut TagProperty<'src>> {
        self.properties.iter_mut().find(|p| p.name == name)
    }
}
