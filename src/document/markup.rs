use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};

use super::style::{parse_declarations, serialize_declarations};
use super::{Element, Node, ROOT_TAG};
use crate::error::MarkupError;

/// Parses markup into a document root. Unclosed elements are closed at the
/// end of input; stray closing tags are an error.
pub fn parse(source: &str) -> Result<Element, MarkupError> {
    let mut root = Element::new(ROOT_TAG);
    root.children = parse_fragment(source)?;
    strip_layout_whitespace(&mut root, true);
    Ok(root)
}

pub fn parse_fragment(source: &str) -> Result<Vec<Node>, MarkupError> {
    let mut parser = Parser::new(source);
    parser.run()?;
    Ok(parser.finish())
}

/// Serializes the children of `root`, the equivalent of `innerHTML`.
pub fn serialize(root: &Element) -> String {
    let mut out = String::new();
    for child in &root.children {
        write_node(child, &mut out);
    }
    out
}

pub fn serialize_node(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&encode_text(text)),
        Node::Element(element) => write_element(element, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);

    let style = serialize_declarations(&element.style);
    let mut attributes: Vec<(&str, &str)> = element
        .attributes
        .iter()
        .filter(|(name, _)| name.as_str() != "style")
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    if !style.is_empty() {
        attributes.push(("style", style.as_str()));
        attributes.sort_by(|a, b| a.0.cmp(b.0));
    }
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    if element.is_void() {
        return;
    }
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    stack: Vec<Element>,
}

enum Tag {
    Open {
        element: Element,
        self_closing: bool,
    },
    Close {
        name: String,
        offset: usize,
    },
    Skip,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            stack: vec![Element::new(ROOT_TAG)],
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn run(&mut self) -> Result<(), MarkupError> {
        while self.pos < self.source.len() {
            let rest = self.rest();
            if let Some(stripped) = rest.strip_prefix('<') {
                if stripped.starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!')
                {
                    let tag = self.read_tag()?;
                    self.apply(tag)?;
                    continue;
                }
            }
            self.read_text();
        }
        Ok(())
    }

    fn read_text(&mut self) {
        let rest = self.rest();
        // A '<' that does not open a tag is literal text.
        let skip = usize::from(rest.starts_with('<'));
        let len = rest[skip..].find('<').map_or(rest.len(), |idx| idx + skip);
        let raw = &rest[..len];
        self.pos += len;
        let text = decode_html_entities(raw).into_owned();
        self.push_node(Node::Text(text));
    }

    fn read_tag(&mut self) -> Result<Tag, MarkupError> {
        let start = self.pos;
        let rest = self.rest();

        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .ok_or(MarkupError::UnterminatedComment { offset: start })?;
            self.pos += 4 + end + 3;
            return Ok(Tag::Skip);
        }
        if rest.starts_with("<!") {
            let end = rest
                .find('>')
                .ok_or(MarkupError::UnterminatedTag { offset: start })?;
            self.pos += end + 1;
            return Ok(Tag::Skip);
        }
        if let Some(after) = rest.strip_prefix("</") {
            let end = after
                .find('>')
                .ok_or(MarkupError::UnterminatedTag { offset: start })?;
            let name = after[..end].trim().to_ascii_lowercase();
            if name.is_empty() {
                return Err(MarkupError::MissingTagName { offset: start });
            }
            self.pos += 2 + end + 1;
            return Ok(Tag::Close {
                name,
                offset: start,
            });
        }

        self.pos += 1;
        let name = self.read_name();
        if name.is_empty() {
            return Err(MarkupError::MissingTagName { offset: start });
        }
        let mut element = Element::new(&name);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(MarkupError::UnterminatedTag { offset: start });
            }
            if let Some(after) = rest.strip_prefix("/>") {
                self.pos = self.source.len() - after.len();
                return Ok(Tag::Open {
                    element,
                    self_closing: true,
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(Tag::Open {
                    element,
                    self_closing: false,
                });
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let attr_name = self.read_name().to_ascii_lowercase();
            if attr_name.is_empty() {
                // Unparseable byte inside a tag; drop it.
                let skip = rest.chars().next().map_or(1, char::len_utf8);
                self.pos += skip;
                continue;
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attribute_value()?
            } else {
                String::new()
            };
            if attr_name == "style" {
                element.style = parse_declarations(&value);
            } else {
                element.attributes.insert(attr_name, value);
            }
        }
    }

    fn read_name(&mut self) -> String {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '"' | '\''))
            .unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_string()
    }

    fn read_attribute_value(&mut self) -> Result<String, MarkupError> {
        let start = self.pos;
        let rest = self.rest();
        let raw = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(quote)
                    .ok_or(MarkupError::UnterminatedAttribute { offset: start })?;
                self.pos += 1 + end + 1;
                &rest[1..1 + end]
            }
            _ => {
                let len = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += len;
                &rest[..len]
            }
        };
        Ok(decode_html_entities(raw).into_owned())
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn apply(&mut self, tag: Tag) -> Result<(), MarkupError> {
        match tag {
            Tag::Skip => Ok(()),
            Tag::Open {
                element,
                self_closing,
            } => {
                self.close_implied_by(&element);
                if self_closing || element.is_void() {
                    self.push_node(Node::Element(element));
                } else {
                    self.stack.push(element);
                }
                Ok(())
            }
            Tag::Close { name, offset } => {
                let Some(depth) = self.stack.iter().skip(1).rposition(|open| open.tag == name)
                else {
                    if matches!(name.as_str(), "br" | "p") {
                        return Ok(());
                    }
                    return Err(MarkupError::UnexpectedClosingTag { tag: name, offset });
                };
                // `rposition` on the skipped iterator is relative to index 1.
                while self.stack.len() > depth + 1 {
                    self.close_top();
                }
                Ok(())
            }
        }
    }

    /// HTML's implicit end tags for the elements an editor produces.
    fn close_implied_by(&mut self, opening: &Element) {
        loop {
            let Some(top) = self.stack.last() else {
                return;
            };
            if self.stack.len() == 1 {
                return;
            }
            let implied = match top.tag.as_str() {
                "p" => opening.is_block(),
                "li" => opening.tag == "li",
                "dt" | "dd" => matches!(opening.tag.as_str(), "dt" | "dd"),
                _ => false,
            };
            if !implied {
                return;
            }
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(mut element) = self.stack.pop() {
            strip_layout_whitespace(&mut element, false);
            self.push_node(Node::Element(element));
        }
    }

    fn push_node(&mut self, node: Node) {
        if let Some(parent) = self.stack.last_mut() {
            if let (Node::Text(text), Some(Node::Text(previous))) = (&node, parent.children.last_mut())
            {
                previous.push_str(text);
                return;
            }
            parent.children.push(node);
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while self.stack.len() > 1 {
            self.close_top();
        }
        self.stack.pop().map(|root| root.children).unwrap_or_default()
    }
}

fn is_layout_whitespace(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_whitespace())
}

/// Drops whitespace-only text that only exists for source formatting:
/// inside list and table containers, next to block elements, and at the
/// edges of the document root.
fn strip_layout_whitespace(element: &mut Element, is_root: bool) {
    let container = matches!(
        element.tag.as_str(),
        "ul" | "ol" | "dl" | "table" | "thead" | "tbody" | "tfoot" | "tr"
    );
    let len = element.children.len();
    let keep: Vec<bool> = (0..len)
        .map(|idx| {
            let Some(text) = element.children[idx].as_text() else {
                return true;
            };
            if !is_layout_whitespace(text) {
                return true;
            }
            if container {
                return false;
            }
            let previous = idx.checked_sub(1).map(|i| &element.children[i]);
            let next = element.children.get(idx + 1);
            let beside_block = previous.is_some_and(Node::is_block) || next.is_some_and(Node::is_block);
            let at_root_edge = is_root && (previous.is_none() || next.is_none());
            !(beside_block || at_root_edge)
        })
        .collect();
    let mut flags = keep.into_iter();
    element.children.retain(|_| flags.next().unwrap_or(true));
}

#[cfg(test)]
#[path = "markup_tests.rs"]
mod markup_tests;
