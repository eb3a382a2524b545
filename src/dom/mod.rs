//! The live render target.
//!
//! A [`Dom`] is a cheap handle to a document. Its methods don't report failures:
//! backends log them with [`tracing::error!`] and skip the operation, leaving the caller to continue with what exists.

use crate::compile::Skeleton;
use core::fmt::Debug;
use std::rc::Rc;

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub type Listener<E> = Rc<dyn Fn(&E)>;

/// Removes an event listener when called.
pub type Disposer = Box<dyn FnOnce()>;

pub trait Dom: Clone + 'static {
	type Node: Clone + PartialEq + Debug + 'static;
	type Event: 'static;

	/// Deep-clones `skeleton` into a new detached fragment node.
	///
	/// Inserting the fragment moves its children, like a `DocumentFragment`.
	fn instantiate(&self, skeleton: &Skeleton) -> Self::Node;

	fn create_text(&self, data: &str) -> Self::Node;

	fn set_text(&self, text: &Self::Node, data: &str);

	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Appends if `anchor` is [`None`].
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>);

	/// Detaches `node` from its parent, if it has one.
	fn remove(&self, node: &Self::Node);

	fn replace_with(&self, old: &Self::Node, new: &Self::Node) {
		match self.parent(old) {
			Some(parent) => {
				self.insert_before(&parent, new, Some(old));
				self.remove(old);
			}
			None => tracing::error!("Can't replace a node without parent."),
		}
	}

	/// Finds the first descendant element of `root` with tag name `tag`.
	fn find_element(&self, root: &Self::Node, tag: &str) -> Option<Self::Node>;

	/// Finds the first descendant element of `root` that carries the attribute `name`.
	fn find_attribute(&self, root: &Self::Node, name: &str) -> Option<Self::Node>;

	/// Replaces the attribute `from` on `element` with `to`=`value`, keeping its position where the backend can.
	fn rename_attribute(&self, element: &Self::Node, from: &str, to: &str, value: &str) {
		self.remove_attribute(element, from);
		self.set_attribute(element, to, value);
	}

	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str);

	fn remove_attribute(&self, element: &Self::Node, name: &str);

	/// Attaches `listener` for `event` on `element`. The returned [`Disposer`] detaches it again.
	fn listen(&self, element: &Self::Node, event: &str, listener: Listener<Self::Event>) -> Disposer;
}
