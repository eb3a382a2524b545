//! The lifecycle a host drives components and slot content through.

use crate::{dom::Dom, error::LifecycleError, value::Props};
use tracing::trace;

/// Something that can be created, mounted, updated and destroyed.
///
/// [`Component`](`crate::Component`) implements this, and slot content is any `Box<dyn Block<D>>`.
pub trait Block<D: Dom> {
	/// Builds the detached nodes.
	///
	/// # Errors
	///
	/// Implementation-defined. [`Component`](`crate::Component`)s refuse while mounted.
	fn create(&mut self) -> Result<(), LifecycleError>;

	/// Inserts the nodes into `target` before `anchor`, or at its end.
	///
	/// # Errors
	///
	/// Implementation-defined, usually when already mounted.
	fn mount(&mut self, target: &D::Node, anchor: Option<&D::Node>) -> Result<(), LifecycleError>;

	/// Applies the props in `changed`. Unknown names are ignored.
	///
	/// # Errors
	///
	/// Implementation-defined, usually after destruction.
	fn update(&mut self, changed: &Props) -> Result<(), LifecycleError>;

	fn intro(&mut self, _local: bool) {}

	fn outro(&mut self, _local: bool) {}

	/// Releases everything. If `detaching`, the top-level nodes are also removed from the document.
	///
	/// # Errors
	///
	/// Implementation-defined, usually when already destroyed.
	fn destroy(&mut self, detaching: bool) -> Result<(), LifecycleError>;
}

/// A single text node, optionally showing one prop.
///
/// Handy as slot content fed from a component's slot context.
pub struct TextBlock<D: Dom> {
	dom: D,
	prop: Option<String>,
	data: String,
	node: Option<D::Node>,
}

impl<D: Dom> TextBlock<D> {
	#[must_use]
	pub fn fixed(dom: D, data: impl Into<String>) -> Self {
		Self {
			dom,
			prop: None,
			data: data.into(),
			node: None,
		}
	}

	/// Shows the prop `prop`, which starts out as `initial`.
	#[must_use]
	pub fn bound(dom: D, prop: impl Into<String>, initial: impl Into<String>) -> Self {
		Self {
			dom,
			prop: Some(prop.into()),
			data: initial.into(),
			node: None,
		}
	}

	#[must_use]
	pub fn data(&self) -> &str {
		&self.data
	}
}

impl<D: Dom> Block<D> for TextBlock<D> {
	fn create(&mut self) -> Result<(), LifecycleError> {
		if self.node.is_none() {
			self.node = Some(self.dom.create_text(&self.data));
		}
		Ok(())
	}

	fn mount(&mut self, target: &D::Node, anchor: Option<&D::Node>) -> Result<(), LifecycleError> {
		self.create()?;
		if let Some(node) = &self.node {
			self.dom.insert_before(target, node, anchor);
		}
		Ok(())
	}

	fn update(&mut self, changed: &Props) -> Result<(), LifecycleError> {
		let Some(value) = self.prop.as_ref().and_then(|prop| changed.get(prop)) else {
			return Ok(());
		};
		self.data = value.to_text().into_owned();
		if let Some(node) = &self.node {
			self.dom.set_text(node, &self.data);
		}
		Ok(())
	}

	fn destroy(&mut self, detaching: bool) -> Result<(), LifecycleError> {
		match self.node.take() {
			Some(node) if detaching => self.dom.remove(&node),
			Some(_) => (),
			None => trace!("Destroying a text block that was never created."),
		}
		Ok(())
	}
}
