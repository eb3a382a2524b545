//! A lenient HTML fragment parser and the serializer shared by server rendering and the in-memory DOM.
//!
//! Unlike browsers, the parser honours `/>` on any element, which is how templates are usually written.
//! Skeletons are serialized back through [`to_html`] before a browser parses them,
//! so both sides always agree on the tree shape.

use std::borrow::Cow;
use tracing::{instrument, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Element(Element),
	Text(String),
	Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
	pub tag: String,
	/// In source order. Attributes without value have an empty one.
	pub attributes: Vec<(String, String)>,
	pub children: Vec<Node>,
}

impl Element {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.as_str())
	}
}

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

#[must_use]
pub fn is_void(tag: &str) -> bool {
	VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

fn is_raw_text(tag: &str) -> bool {
	RAW_TEXT_ELEMENTS.iter().any(|raw| raw.eq_ignore_ascii_case(tag))
}

/// Parses an HTML fragment.
///
/// This never fails: unmatched closing tags are dropped and unclosed elements are closed at the end of input,
/// both with a warning.
#[must_use]
#[instrument(skip(input), fields(len = input.len()))]
pub fn parse(input: &str) -> Vec<Node> {
	Parser { input, pos: 0 }.parse()
}

struct Parser<'a> {
	input: &'a str,
	pos: usize,
}

impl<'a> Parser<'a> {
	fn rest(&self) -> &'a str {
		&self.input[self.pos..]
	}

	fn parse(mut self) -> Vec<Node> {
		fn push(root: &mut Vec<Node>, open: &mut [Element], node: Node) {
			match open.last_mut() {
				Some(parent) => parent.children.push(node),
				None => root.push(node),
			}
		}

		let mut root = Vec::new();
		let mut open: Vec<Element> = Vec::new();

		while self.pos < self.input.len() {
			let rest = self.rest();
			if let Some(comment) = rest.strip_prefix("<!--") {
				let (data, consumed) = match comment.find("-->") {
					Some(end) => (&comment[..end], 4 + end + 3),
					None => {
						warn!("Unterminated comment.");
						(comment, rest.len())
					}
				};
				push(&mut root, &mut open, Node::Comment(data.to_owned()));
				self.pos += consumed;
			} else if rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
				self.pos += 2;
				let tag = self.take_name();
				self.skip_past('>');
				match open.iter().rposition(|element| element.tag.eq_ignore_ascii_case(tag)) {
					Some(depth) => {
						while open.len() > depth {
							let Some(element) = open.pop() else { break };
							push(&mut root, &mut open, Node::Element(element));
						}
					}
					None => warn!("Dropping unmatched closing tag </{}>.", tag),
				}
			} else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
				self.pos += 1;
				let (element, self_closing) = self.start_tag();
				if self_closing || is_void(&element.tag) {
					push(&mut root, &mut open, Node::Element(element));
				} else if is_raw_text(&element.tag) {
					let element = self.raw_text(element);
					push(&mut root, &mut open, Node::Element(element));
				} else {
					open.push(element);
				}
			} else {
				let first = rest.chars().next().map_or(1, char::len_utf8);
				let mut end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
				// A lone '<' that doesn't start markup is text.
				while end < rest.len() && !starts_markup(&rest[end..]) {
					end = rest[end + 1..].find('<').map_or(rest.len(), |i| end + 1 + i);
				}
				push(&mut root, &mut open, Node::Text(decode_entities(&rest[..end]).into_owned()));
				self.pos += end;
			}
		}

		if !open.is_empty() {
			warn!("Closing {} unclosed element(s) at end of input.", open.len());
		}
		while let Some(element) = open.pop() {
			push(&mut root, &mut open, Node::Element(element));
		}
		root
	}

	fn take_name(&mut self) -> &'a str {
		let rest = self.rest();
		let end = rest
			.find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/' || c == '=')
			.unwrap_or(rest.len());
		self.pos += end;
		&rest[..end]
	}

	fn skip_whitespace(&mut self) {
		let rest = self.rest();
		self.pos += rest.len() - rest.trim_start().len();
	}

	fn skip_past(&mut self, c: char) {
		let rest = self.rest();
		self.pos += rest.find(c).map_or(rest.len(), |i| i + c.len_utf8());
	}

	/// Parses a start tag after its `<`. Returns whether it was self-closing.
	fn start_tag(&mut self) -> (Element, bool) {
		let mut element = Element::new(self.take_name());
		loop {
			self.skip_whitespace();
			let rest = self.rest();
			if rest.is_empty() {
				warn!("Unterminated start tag <{}>.", element.tag);
				return (element, false);
			} else if rest.starts_with("/>") {
				self.pos += 2;
				return (element, true);
			} else if rest.starts_with('>') {
				self.pos += 1;
				return (element, false);
			} else if rest.starts_with('/') {
				self.pos += 1;
				continue;
			}

			let name = self.take_name();
			if name.is_empty() {
				// Stray '=' without a name.
				self.pos += 1;
				continue;
			}
			self.skip_whitespace();
			let value = if self.rest().starts_with('=') {
				self.pos += 1;
				self.skip_whitespace();
				self.attribute_value()
			} else {
				String::new()
			};
			element.attributes.push((name.to_owned(), value));
		}
	}

	fn attribute_value(&mut self) -> String {
		let rest = self.rest();
		match rest.chars().next() {
			Some(quote @ ('"' | '\'')) => match rest[1..].find(quote) {
				Some(end) => {
					self.pos += end + 2;
					decode_entities(&rest[1..=end]).into_owned()
				}
				None => {
					warn!("Unterminated attribute value.");
					self.pos += rest.len();
					decode_entities(&rest[1..]).into_owned()
				}
			},
			_ => {
				let end = rest.find(|c: char| c.is_ascii_whitespace() || c == '>').unwrap_or(rest.len());
				self.pos += end;
				decode_entities(&rest[..end]).into_owned()
			}
		}
	}

	fn raw_text(&mut self, mut element: Element) -> Element {
		let rest = self.rest();
		let closing = format!("</{}", element.tag.to_ascii_lowercase());
		let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
		if end > 0 {
			element.children.push(Node::Text(rest[..end].to_owned()));
		}
		self.pos += end;
		self.skip_past('>');
		trace!("Read {} byte(s) of raw text in <{}>.", end, element.tag);
		element
	}
}

fn starts_markup(rest: &str) -> bool {
	let after = &rest[1..];
	after.starts_with("!--")
		|| after.starts_with(|c: char| c.is_ascii_alphabetic())
		|| (after.starts_with('/') && after[1..].starts_with(|c: char| c.is_ascii_alphabetic()))
}

fn decode_entities(text: &str) -> Cow<'_, str> {
	if !text.contains('&') {
		return Cow::Borrowed(text);
	}

	let mut decoded = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(amp) = rest.find('&') {
		decoded.push_str(&rest[..amp]);
		rest = &rest[amp..];
		let entity = rest[1..].find(';').map(|end| &rest[1..=end]).filter(|entity| entity.len() <= 10);
		match entity.and_then(decode_entity) {
			Some(c) => {
				decoded.push(c);
				rest = &rest[entity.map_or(0, str::len) + 2..];
			}
			None => {
				decoded.push('&');
				rest = &rest[1..];
			}
		}
	}
	decoded.push_str(rest);
	Cow::Owned(decoded)
}

fn decode_entity(entity: &str) -> Option<char> {
	match entity {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		"nbsp" => Some('\u{a0}'),
		_ => {
			let number = entity.strip_prefix('#')?;
			let code = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
				Some(hex) => u32::from_str_radix(hex, 16).ok()?,
				None => number.parse().ok()?,
			};
			char::from_u32(code)
		}
	}
}

#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
	escape(text, false)
}

#[must_use]
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
	escape(value, true)
}

fn escape(text: &str, attribute: bool) -> Cow<'_, str> {
	let needs_escaping = |c: char| matches!(c, '&' | '<' | '>') || (attribute && c == '"');
	if !text.contains(needs_escaping) {
		return Cow::Borrowed(text);
	}

	let mut escaped = String::with_capacity(text.len() + 8);
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	Cow::Owned(escaped)
}

pub fn write_start_tag<'a>(out: &mut String, tag: &str, attributes: impl IntoIterator<Item = (&'a str, &'a str)>) {
	out.push('<');
	out.push_str(tag);
	for (name, value) in attributes {
		write_attribute(out, name, value);
	}
	out.push('>');
}

pub fn write_attribute(out: &mut String, name: &str, value: &str) {
	out.push(' ');
	out.push_str(name);
	if !value.is_empty() {
		out.push_str("=\"");
		out.push_str(&escape_attribute(value));
		out.push('"');
	}
}

/// Writes nothing for void elements.
pub fn write_end_tag(out: &mut String, tag: &str) {
	if !is_void(tag) {
		out.push_str("</");
		out.push_str(tag);
		out.push('>');
	}
}

pub fn write_text(out: &mut String, text: &str, parent_tag: Option<&str>) {
	if parent_tag.map_or(false, is_raw_text) {
		out.push_str(text);
	} else {
		out.push_str(&escape_text(text));
	}
}

pub fn write_comment(out: &mut String, comment: &str) {
	out.push_str("<!--");
	out.push_str(comment);
	out.push_str("-->");
}

#[must_use]
pub fn to_html(nodes: &[Node]) -> String {
	let mut out = String::new();
	write_nodes(&mut out, nodes, None);
	out
}

fn write_nodes(out: &mut String, nodes: &[Node], parent_tag: Option<&str>) {
	for node in nodes {
		match node {
			Node::Element(element) => {
				write_start_tag(out, &element.tag, element.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())));
				write_nodes(out, &element.children, Some(&element.tag));
				write_end_tag(out, &element.tag);
			}
			Node::Text(text) => write_text(out, text, parent_tag),
			Node::Comment(comment) => write_comment(out, comment),
		}
	}
}
