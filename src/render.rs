//! Rendering templates to markup without a DOM.

use crate::{
	classify::{Binding, Placeholder},
	compile::{Marker, Template},
	dom::Dom,
	markup::{self, Element, Node},
	value::Props,
};
use hashbrown::HashMap;
use tracing::{instrument, trace, warn};

/// Server-side slot content by slot name.
pub type SlotRenderers = HashMap<String, Box<dyn Fn() -> String>>;

impl<D: Dom> Template<D> {
	/// Renders this template with `props` and `slots`.
	///
	/// The result equals the mounted DOM of a [`Component`](`crate::Component`) with the same props,
	/// serialized with the same rules.
	/// Event and action markers leave no trace.
	#[must_use]
	#[instrument(skip_all, fields(skeleton = self.skeleton.id()))]
	pub fn render(&self, props: &Props, slots: &SlotRenderers) -> String {
		let mut out = String::with_capacity(self.skeleton.markup().len());
		self.write_nodes(&mut out, self.skeleton.nodes(), None, props, slots);
		out
	}

	fn write_nodes(&self, out: &mut String, nodes: &[Node], parent_tag: Option<&str>, props: &Props, slots: &SlotRenderers) {
		for node in nodes {
			match node {
				Node::Element(element) => match Marker::parse_element(&element.tag) {
					Some(marker) => self.write_marker(out, marker, parent_tag, props, slots),
					None => self.write_element(out, element, props, slots),
				},
				Node::Text(text) => markup::write_text(out, text, parent_tag),
				Node::Comment(comment) => markup::write_comment(out, comment),
			}
		}
	}

	fn write_element(&self, out: &mut String, element: &Element, props: &Props, slots: &SlotRenderers) {
		let bound: Vec<(usize, &str)> = element
			.attributes
			.iter()
			.enumerate()
			.filter_map(|(position, (name, _))| match Marker::parse_attribute(name) {
				Some(Marker::Attribute(index)) => match self.placeholders.get(index) {
					Some(Placeholder::Attribute { attribute, .. }) => Some((position, attribute.as_str())),
					_ => None,
				},
				_ => None,
			})
			.collect();

		out.push('<');
		out.push_str(&element.tag);
		for (position, (name, value)) in element.attributes.iter().enumerate() {
			match Marker::parse_attribute(name) {
				Some(Marker::Attribute(index)) => match self.placeholders.get(index) {
					// Binding replaces every other attribute of the same name, so the last one wins.
					Some(Placeholder::Attribute { prop, attribute })
						if !bound.iter().any(|&(other, name)| other > position && name == attribute) =>
					{
						markup::write_attribute(out, attribute, &text_of(props, prop));
					}
					Some(Placeholder::Attribute { attribute, .. }) => {
						trace!("Attribute {:?} is bound again later. Skipping.", attribute);
					}
					other => warn!("Attribute marker {} points at {:?}. Skipping.", index, other),
				},
				Some(_) => (),
				None if bound.iter().any(|&(_, bound)| bound == name) => {
					trace!("Literal attribute {:?} is overridden by a binding. Skipping.", name);
				}
				None => markup::write_attribute(out, name, value),
			}
		}
		out.push('>');
		self.write_nodes(out, &element.children, Some(&element.tag), props, slots);
		markup::write_end_tag(out, &element.tag);
	}

	fn write_marker(&self, out: &mut String, marker: Marker, parent_tag: Option<&str>, props: &Props, slots: &SlotRenderers) {
		match (marker, self.placeholders.get(marker.index())) {
			(Marker::Text(_), Some(Placeholder::Text { prop })) => markup::write_text(out, &text_of(props, prop), parent_tag),
			(Marker::Slot(_), Some(Placeholder::Slot { name })) => match slots.get(name) {
				Some(renderer) => out.push_str(&renderer()),
				None => trace!("No renderer for slot {:?}. Leaving it empty.", name),
			},
			(Marker::Child(_), Some(Placeholder::Child { template, bindings })) => {
				out.push_str(&template.render(&child_props(bindings, props), &SlotRenderers::new()));
			}
			(marker, placeholder) => warn!("Marker {:?} points at {:?}. Skipping.", marker, placeholder),
		}
	}
}

fn text_of(props: &Props, name: &str) -> String {
	props.get(name).map(|value| value.to_text().into_owned()).unwrap_or_default()
}

/// Maps an enclosing component's props onto a child's, per `bindings`.
pub(crate) fn child_props(bindings: &[Binding], props: &Props) -> Props {
	bindings
		.iter()
		.filter_map(|binding| {
			props
				.get(&binding.outer)
				.map(|value| (binding.child.clone(), value.clone()))
		})
		.collect()
}
