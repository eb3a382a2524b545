//! An in-memory DOM.
//!
//! Used for tests, for server-side hydration checks and anywhere a browser isn't available.
//! It serializes through the same writer as [`Template::render`](`crate::Template::render`),
//! so a mounted component and its server rendering compare equal as strings.

use super::{Disposer, Dom, Listener};
use crate::{compile::Skeleton, markup, value::Value};
use core::fmt::{self, Debug, Formatter};
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{error, trace, trace_span, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryDom;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	pub name: String,
	pub detail: Value,
}

impl Event {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			detail: Value::Null,
		}
	}

	#[must_use]
	pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
		self.detail = detail.into();
		self
	}
}

/// A shared handle to a node. Equality is identity.
#[derive(Clone)]
pub struct Node(Rc<RefCell<Data>>);

struct Data {
	kind: Kind,
	parent: Weak<RefCell<Data>>,
	children: Vec<Node>,
	listeners: Vec<(u64, String, Listener<Event>)>,
	next_listener: u64,
}

enum Kind {
	Fragment,
	Element { tag: String, attributes: Vec<(String, String)> },
	Text(String),
	Comment(String),
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0.borrow().kind {
			Kind::Fragment => f.write_str("#fragment"),
			Kind::Element { tag, .. } => write!(f, "<{}>", tag),
			Kind::Text(text) => write!(f, "#text({:?})", text),
			Kind::Comment(comment) => write!(f, "#comment({:?})", comment),
		}
	}
}

impl Node {
	fn new(kind: Kind) -> Self {
		Self(Rc::new(RefCell::new(Data {
			kind,
			parent: Weak::new(),
			children: Vec::new(),
			listeners: Vec::new(),
			next_listener: 0,
		})))
	}

	#[must_use]
	pub fn fragment() -> Self {
		Self::new(Kind::Fragment)
	}

	#[must_use]
	pub fn element(tag: impl Into<String>) -> Self {
		Self::new(Kind::Element {
			tag: tag.into(),
			attributes: Vec::new(),
		})
	}

	#[must_use]
	pub fn text(data: impl Into<String>) -> Self {
		Self::new(Kind::Text(data.into()))
	}

	#[must_use]
	pub fn comment(data: impl Into<String>) -> Self {
		Self::new(Kind::Comment(data.into()))
	}

	#[must_use]
	pub fn from_markup(node: &markup::Node) -> Self {
		match node {
			markup::Node::Element(element) => {
				let node = Self::new(Kind::Element {
					tag: element.tag.clone(),
					attributes: element.attributes.clone(),
				});
				for child in &element.children {
					node.append_child(&Self::from_markup(child));
				}
				node
			}
			markup::Node::Text(text) => Self::text(text.as_str()),
			markup::Node::Comment(comment) => Self::comment(comment.as_str()),
		}
	}

	#[must_use]
	pub fn is_fragment(&self) -> bool {
		matches!(self.0.borrow().kind, Kind::Fragment)
	}

	#[must_use]
	pub fn tag(&self) -> Option<String> {
		match &self.0.borrow().kind {
			Kind::Element { tag, .. } => Some(tag.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.borrow().kind {
			Kind::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn attributes(&self) -> Vec<(String, String)> {
		match &self.0.borrow().kind {
			Kind::Element { attributes, .. } => attributes.clone(),
			_ => Vec::new(),
		}
	}

	pub fn set_attribute(&self, name: &str, value: &str) {
		match &mut self.0.borrow_mut().kind {
			Kind::Element { attributes, .. } => match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => value.clone_into(existing),
				None => attributes.push((name.to_owned(), value.to_owned())),
			},
			_ => error!("Can't set attribute {:?} on a non-element node.", name),
		}
	}

	pub fn remove_attribute(&self, name: &str) {
		if let Kind::Element { attributes, .. } = &mut self.0.borrow_mut().kind {
			attributes.retain(|(n, _)| n != name);
		}
	}

	/// Replaces attribute `from` with `to`=`value` at the same position.
	pub fn rename_attribute(&self, from: &str, to: &str, value: &str) {
		let renamed = match &mut self.0.borrow_mut().kind {
			Kind::Element { attributes, .. } => match attributes.iter().position(|(n, _)| n == from) {
				Some(i) => {
					attributes[i] = (to.to_owned(), value.to_owned());
					let mut index = 0;
					attributes.retain(|(n, _)| {
						let keep = index == i || n != to;
						index += 1;
						keep
					});
					true
				}
				None => false,
			},
			_ => false,
		};
		if !renamed {
			warn!("Attribute {:?} to rename not found; setting {:?} instead.", from, to);
			self.set_attribute(to, value);
		}
	}

	/// The data of a text or comment node.
	#[must_use]
	pub fn data(&self) -> Option<String> {
		match &self.0.borrow().kind {
			Kind::Text(data) | Kind::Comment(data) => Some(data.clone()),
			_ => None,
		}
	}

	pub fn set_data(&self, data: &str) {
		match &mut self.0.borrow_mut().kind {
			Kind::Text(existing) | Kind::Comment(existing) => data.clone_into(existing),
			_ => error!("Can't set data of a fragment or element."),
		}
	}

	/// Concatenated text of all descendant text nodes.
	#[must_use]
	pub fn text_content(&self) -> String {
		let data = self.0.borrow();
		match &data.kind {
			Kind::Text(text) => text.clone(),
			Kind::Comment(_) => String::new(),
			Kind::Fragment | Kind::Element { .. } => data.children.iter().map(Node::text_content).collect(),
		}
	}

	#[must_use]
	pub fn children(&self) -> Vec<Node> {
		self.0.borrow().children.clone()
	}

	#[must_use]
	pub fn parent(&self) -> Option<Node> {
		self.0.borrow().parent.upgrade().map(Node)
	}

	#[must_use]
	pub fn contains(&self, other: &Node) -> bool {
		let mut current = Some(other.clone());
		while let Some(node) = current {
			if &node == self {
				return true;
			}
			current = node.parent();
		}
		false
	}

	pub fn append_child(&self, child: &Node) {
		self.insert_before(child, None);
	}

	/// Inserting a fragment moves its children instead.
	pub fn insert_before(&self, child: &Node, anchor: Option<&Node>) {
		if child.contains(self) {
			return error!("Refusing to insert {:?} into its own subtree.", child);
		}

		if child.is_fragment() {
			let moved = std::mem::take(&mut child.0.borrow_mut().children);
			for node in &moved {
				node.0.borrow_mut().parent = Weak::new();
			}
			for node in &moved {
				self.insert_before(node, anchor);
			}
			return;
		}

		child.remove();
		let position = anchor.map(|anchor| self.0.borrow().children.iter().position(|c| c == anchor));
		if let Some(None) = position {
			warn!("Insertion anchor {:?} is not a child of {:?}. Appending instead.", anchor, self);
		}
		let mut data = self.0.borrow_mut();
		let index = position.flatten().unwrap_or(data.children.len());
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		data.children.insert(index, child.clone());
	}

	pub fn remove(&self) {
		let parent = self.0.borrow().parent.upgrade();
		if let Some(parent) = parent {
			parent.borrow_mut().children.retain(|c| c != self);
			self.0.borrow_mut().parent = Weak::new();
		}
	}

	/// Depth-first search of descendants, excluding `self`.
	#[must_use]
	pub fn find(&self, predicate: &dyn Fn(&Node) -> bool) -> Option<Node> {
		for child in self.children() {
			if predicate(&child) {
				return Some(child);
			}
			if let Some(found) = child.find(predicate) {
				return Some(found);
			}
		}
		None
	}

	#[must_use]
	pub fn find_element(&self, tag: &str) -> Option<Node> {
		self.find(&|node| node.tag().map_or(false, |t| t.eq_ignore_ascii_case(tag)))
	}

	#[must_use]
	pub fn find_attribute(&self, name: &str) -> Option<Node> {
		self.find(&|node| node.attribute(name).is_some())
	}

	fn add_listener(&self, event: &str, listener: Listener<Event>) -> u64 {
		let mut data = self.0.borrow_mut();
		let id = data.next_listener;
		data.next_listener += 1;
		data.listeners.push((id, event.to_owned(), listener));
		id
	}

	fn remove_listener(&self, id: u64) -> bool {
		let mut data = self.0.borrow_mut();
		let before = data.listeners.len();
		data.listeners.retain(|(i, _, _)| *i != id);
		data.listeners.len() != before
	}

	/// Number of listeners attached to this node itself.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.0.borrow().listeners.len()
	}

	/// Number of listeners attached to this node and all its descendants.
	#[must_use]
	pub fn subtree_listener_count(&self) -> usize {
		self.listener_count() + self.children().iter().map(Node::subtree_listener_count).sum::<usize>()
	}

	/// Dispatches `event` to this node, then bubbles it through all ancestors.
	///
	/// Returns the number of listeners that ran.
	pub fn dispatch(&self, event: &Event) -> usize {
		let span = trace_span!("dispatch", event = %event.name, target = ?self);
		let _enter = span.enter();

		let mut ran = 0;
		let mut current = Some(self.clone());
		while let Some(node) = current {
			let listeners: Vec<_> = node
				.0
				.borrow()
				.listeners
				.iter()
				.filter(|(_, name, _)| name == &event.name)
				.map(|(_, _, listener)| Rc::clone(listener))
				.collect();
			for listener in listeners {
				listener(event);
				ran += 1;
			}
			current = node.parent();
		}
		trace!("{} listener(s) ran.", ran);
		ran
	}

	/// Serializes this node, including itself unless it's a fragment.
	#[must_use]
	pub fn to_html(&self) -> String {
		let mut out = String::new();
		let parent_tag = self.parent().and_then(|parent| parent.tag());
		self.write_html(&mut out, parent_tag.as_deref());
		out
	}

	/// Serializes only the children of this node.
	#[must_use]
	pub fn inner_html(&self) -> String {
		let mut out = String::new();
		let tag = self.tag();
		for child in self.children() {
			child.write_html(&mut out, tag.as_deref());
		}
		out
	}

	fn write_html(&self, out: &mut String, parent_tag: Option<&str>) {
		let data = self.0.borrow();
		match &data.kind {
			Kind::Fragment => {
				for child in &data.children {
					child.write_html(out, parent_tag);
				}
			}
			Kind::Element { tag, attributes } => {
				markup::write_start_tag(out, tag, attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())));
				for child in &data.children {
					child.write_html(out, Some(tag));
				}
				markup::write_end_tag(out, tag);
			}
			Kind::Text(text) => markup::write_text(out, text, parent_tag),
			Kind::Comment(comment) => markup::write_comment(out, comment),
		}
	}
}

impl Dom for MemoryDom {
	type Node = Node;
	type Event = Event;

	fn instantiate(&self, skeleton: &Skeleton) -> Node {
		let fragment = Node::fragment();
		for node in skeleton.nodes() {
			fragment.append_child(&Node::from_markup(node));
		}
		fragment
	}

	fn create_text(&self, data: &str) -> Node {
		Node::text(data)
	}

	fn set_text(&self, text: &Node, data: &str) {
		text.set_data(data);
	}

	fn child_nodes(&self, node: &Node) -> Vec<Node> {
		node.children()
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		node.parent()
	}

	fn insert_before(&self, parent: &Node, node: &Node, anchor: Option<&Node>) {
		parent.insert_before(node, anchor);
	}

	fn remove(&self, node: &Node) {
		node.remove();
	}

	fn find_element(&self, root: &Node, tag: &str) -> Option<Node> {
		root.find_element(tag)
	}

	fn find_attribute(&self, root: &Node, name: &str) -> Option<Node> {
		root.find_attribute(name)
	}

	fn rename_attribute(&self, element: &Node, from: &str, to: &str, value: &str) {
		element.rename_attribute(from, to, value);
	}

	fn set_attribute(&self, element: &Node, name: &str, value: &str) {
		element.set_attribute(name, value);
	}

	fn remove_attribute(&self, element: &Node, name: &str) {
		element.remove_attribute(name);
	}

	fn listen(&self, element: &Node, event: &str, listener: Listener<Event>) -> Disposer {
		let id = element.add_listener(event, listener);
		let element = Rc::downgrade(&element.0);
		let event = event.to_owned();
		Box::new(move || match element.upgrade() {
			Some(element) => {
				if !Node(element).remove_listener(id) {
					warn!("Listener for {:?} was already removed.", event);
				}
			}
			None => trace!("Listener target for {:?} was already dropped.", event),
		})
	}
}
