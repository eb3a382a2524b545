//! The browser DOM, through [`web_sys`].
//!
//! Each skeleton is parsed into an [***HTMLTemplateElement***](https://developer.mozilla.org/en-US/docs/Web/API/HTMLTemplateElement) once per thread,
//! and instances are deep clones of its content.
//!
//! Browsers don't keep an attribute's position when it's replaced, so unlike [`MemoryDom`](`super::memory::MemoryDom`),
//! bound attributes serialize after the template's literal ones.

use super::{Disposer, Dom, Listener};
use crate::compile::Skeleton;
use hashbrown::HashMap;
use std::cell::RefCell;
use tracing::{error, instrument, trace, trace_span};
use wasm_bindgen::{closure::Closure, JsCast, UnwrapThrowExt};

thread_local! {
	static TEMPLATES: RefCell<HashMap<u64, web_sys::HtmlTemplateElement>> = RefCell::new(HashMap::new());
}

#[derive(Debug, Clone)]
pub struct WebDom {
	document: web_sys::Document,
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	/// # Panics
	///
	/// Throws into JavaScript if there is no global `window` with a `document`.
	#[must_use]
	pub fn from_window() -> Self {
		let document = web_sys::window()
			.expect_throw("micro-component: No global `window`.")
			.document()
			.expect_throw("micro-component: `window` has no `document`.");
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	fn template_element(&self, skeleton: &Skeleton) -> Option<web_sys::HtmlTemplateElement> {
		TEMPLATES.with(|templates| {
			let mut templates = templates.borrow_mut();
			if let Some(template) = templates.get(&skeleton.id()) {
				return Some(template.clone());
			}

			let _span = trace_span!("Parsing skeleton", id = skeleton.id()).entered();
			let template = match self.document.create_element("template").map(JsCast::dyn_into::<web_sys::HtmlTemplateElement>) {
				Ok(Ok(template)) => template,
				Ok(Err(element)) => {
					error!("Expected `web_sys::HtmlTemplateElement` but found {:?}.", element);
					return None;
				}
				Err(error) => {
					error!("Failed to create <template>: {:?}", error);
					return None;
				}
			};
			template.set_inner_html(skeleton.markup());
			templates.insert(skeleton.id(), template.clone());
			trace!("Cached {} skeleton(s).", templates.len());
			Some(template)
		})
	}
}

fn query_selector(root: &web_sys::Node, selector: &str) -> Option<web_sys::Node> {
	let found = if let Some(fragment) = root.dyn_ref::<web_sys::DocumentFragment>() {
		fragment.query_selector(selector)
	} else if let Some(element) = root.dyn_ref::<web_sys::Element>() {
		element.query_selector(selector)
	} else {
		error!("Can't query {:?}: expected `web_sys::DocumentFragment` or `web_sys::Element`.", root);
		return None;
	};
	match found {
		Ok(element) => element.map(Into::into),
		Err(error) => {
			error!("Invalid selector {:?}: {:?}", selector, error);
			None
		}
	}
}

fn as_element(node: &web_sys::Node) -> Option<&web_sys::Element> {
	let element = node.dyn_ref::<web_sys::Element>();
	if element.is_none() {
		error!("Expected `web_sys::Element` but found {:?}.", node);
	}
	element
}

impl Dom for WebDom {
	type Node = web_sys::Node;
	type Event = web_sys::Event;

	#[instrument(skip(skeleton), fields(id = skeleton.id()))]
	fn instantiate(&self, skeleton: &Skeleton) -> web_sys::Node {
		let clone = self
			.template_element(skeleton)
			.map(|template| template.content().clone_node_with_deep(true));
		match clone {
			Some(Ok(fragment)) => fragment,
			Some(Err(error)) => {
				error!("Failed to clone skeleton: {:?}", error);
				self.document.create_document_fragment().into()
			}
			None => self.document.create_document_fragment().into(),
		}
	}

	fn create_text(&self, data: &str) -> web_sys::Node {
		self.document.create_text_node(data).into()
	}

	fn set_text(&self, text: &web_sys::Node, data: &str) {
		match text.dyn_ref::<web_sys::CharacterData>() {
			Some(text) => text.set_data(data),
			None => error!("Expected `web_sys::CharacterData` but found {:?}. Not updating.", text),
		}
	}

	fn child_nodes(&self, node: &web_sys::Node) -> Vec<web_sys::Node> {
		let list = node.child_nodes();
		(0..list.length()).filter_map(|i| list.get(i)).collect()
	}

	fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn insert_before(&self, parent: &web_sys::Node, node: &web_sys::Node, anchor: Option<&web_sys::Node>) {
		if let Err(error) = parent.insert_before(node, anchor) {
			error!("Failed to insert node: {:?}", error);
		}
	}

	fn remove(&self, node: &web_sys::Node) {
		if let Some(parent) = node.parent_node() {
			if let Err(error) = parent.remove_child(node) {
				error!("Failed to remove node: {:?}", error);
			}
		}
	}

	fn find_element(&self, root: &web_sys::Node, tag: &str) -> Option<web_sys::Node> {
		query_selector(root, tag)
	}

	fn find_attribute(&self, root: &web_sys::Node, name: &str) -> Option<web_sys::Node> {
		query_selector(root, &format!("[{}]", name))
	}

	fn set_attribute(&self, element: &web_sys::Node, name: &str, value: &str) {
		if let Some(element) = as_element(element) {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Failed to set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_attribute(&self, element: &web_sys::Node, name: &str) {
		if let Some(element) = as_element(element) {
			if let Err(error) = element.remove_attribute(name) {
				error!("Failed to remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn listen(&self, element: &web_sys::Node, event: &str, listener: Listener<web_sys::Event>) -> Disposer {
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let _span = trace_span!("listener", event = ?event.type_()).entered();
			listener(&event);
		}) as Box<dyn Fn(web_sys::Event)>);

		if let Err(error) = element.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
			error!("Failed to add event listener for {:?}: {:?}", event, error);
		}

		let element = element.clone();
		let event = event.to_owned();
		Box::new(move || {
			if let Err(error) = element.remove_event_listener_with_callback(&event, closure.as_ref().unchecked_ref()) {
				error!("Failed to remove event listener for {:?}: {:?}", event, error);
			}
			drop(closure);
		})
	}
}
