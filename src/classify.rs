//! Sorting a template's placeholders into the ways they bind to the document.

use crate::{
	compile::Template,
	directive::{Action, Directive, Prop},
	dom::Dom,
	error::TemplateError,
};
use core::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;
use tracing::{instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	Text,
	Attribute,
	Event,
	Action,
	Slot,
	Child,
}

impl Category {
	pub const ALL: [Self; 6] = [
		Self::Text,
		Self::Attribute,
		Self::Event,
		Self::Action,
		Self::Slot,
		Self::Child,
	];
}

impl Display for Category {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Text => "text",
			Self::Attribute => "attribute",
			Self::Event => "event",
			Self::Action => "action",
			Self::Slot => "slot",
			Self::Child => "child",
		})
	}
}

/// Forwards the enclosing template's prop `outer` to the child's prop `child`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
	pub child: String,
	pub outer: String,
}

/// A classified placeholder.
pub enum Placeholder<D: Dom> {
	Text { prop: String },
	Attribute { prop: String, attribute: String },
	Event { event: String, alias: String },
	Action { action: Action<D>, param: Option<String> },
	Slot { name: String },
	Child { template: Rc<Template<D>>, bindings: Vec<Binding> },
}

impl<D: Dom> Placeholder<D> {
	#[must_use]
	pub fn category(&self) -> Category {
		match self {
			Self::Text { .. } => Category::Text,
			Self::Attribute { .. } => Category::Attribute,
			Self::Event { .. } => Category::Event,
			Self::Action { .. } => Category::Action,
			Self::Slot { .. } => Category::Slot,
			Self::Child { .. } => Category::Child,
		}
	}
}

impl<D: Dom> Debug for Placeholder<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text { prop } => f.debug_struct("Text").field("prop", prop).finish(),
			Self::Attribute { prop, attribute } => f
				.debug_struct("Attribute")
				.field("prop", prop)
				.field("attribute", attribute)
				.finish(),
			Self::Event { event, alias } => f.debug_struct("Event").field("event", event).field("alias", alias).finish(),
			Self::Action { param, .. } => f.debug_struct("Action").field("param", param).finish_non_exhaustive(),
			Self::Slot { name } => f.debug_struct("Slot").field("name", name).finish(),
			Self::Child { template, bindings } => f
				.debug_struct("Child")
				.field("skeleton", &template.skeleton().id())
				.field("bindings", bindings)
				.finish(),
		}
	}
}

/// Placeholder indices per [`Category`], each in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySets {
	pub text: Vec<usize>,
	pub attribute: Vec<usize>,
	pub event: Vec<usize>,
	pub action: Vec<usize>,
	pub slot: Vec<usize>,
	pub child: Vec<usize>,
}

impl CategorySets {
	#[must_use]
	pub fn get(&self, category: Category) -> &[usize] {
		match category {
			Category::Text => &self.text,
			Category::Attribute => &self.attribute,
			Category::Event => &self.event,
			Category::Action => &self.action,
			Category::Slot => &self.slot,
			Category::Child => &self.child,
		}
	}

	fn push(&mut self, category: Category, index: usize) {
		match category {
			Category::Text => &mut self.text,
			Category::Attribute => &mut self.attribute,
			Category::Event => &mut self.event,
			Category::Action => &mut self.action,
			Category::Slot => &mut self.slot,
			Category::Child => &mut self.child,
		}
		.push(index);
	}

	#[must_use]
	pub fn category_of(&self, index: usize) -> Option<Category> {
		Category::ALL.iter().copied().find(|&category| self.get(category).contains(&index))
	}
}

pub struct Classified<D: Dom> {
	/// The literal segments with the `name=` text of attribute placeholders cut off.
	pub segments: Vec<String>,
	pub placeholders: Vec<Placeholder<D>>,
	pub categories: CategorySets,
}

/// Classifies each placeholder by its value and the literal text before it.
///
/// A plain prop name right after `name=` binds that attribute. Any other plain name is text content.
///
/// This only looks at the preceding segment, so `2*2=` in text content also reads as an attribute binding.
/// Defining the template then fails with [`TemplateError::MissingMarker`].
///
/// # Errors
///
/// If there isn't exactly one more segment than placeholders, or a placeholder is malformed.
#[instrument(skip_all, fields(placeholders = props.len()))]
pub fn classify<D: Dom>(segments: &[&str], props: Vec<Prop<D>>) -> Result<Classified<D>, TemplateError> {
	if segments.len() != props.len() + 1 {
		return Err(TemplateError::SegmentCount {
			placeholders: props.len(),
			segments: segments.len(),
		});
	}

	let mut rewritten: Vec<String> = segments.iter().map(|&segment| segment.to_owned()).collect();
	let mut placeholders = Vec::with_capacity(props.len());
	let mut categories = CategorySets::default();

	for (index, prop) in props.into_iter().enumerate() {
		let placeholder = match prop {
			Prop::Name(prop) => {
				non_empty(&prop, index, "prop")?;
				match attribute_before(&rewritten[index]) {
					Some((_, "")) => return Err(TemplateError::MissingAttributeName { index }),
					Some((start, attribute)) => {
						let attribute = attribute.to_owned();
						rewritten[index].truncate(start);
						Placeholder::Attribute { prop, attribute }
					}
					None => Placeholder::Text { prop },
				}
			}
			Prop::Directive(Directive::On { event, alias }) => {
				non_empty(&event, index, "event")?;
				let alias = alias.unwrap_or_else(|| event.clone());
				non_empty(&alias, index, "alias")?;
				Placeholder::Event { event, alias }
			}
			Prop::Directive(Directive::Use { action, param }) => {
				if let Some(param) = &param {
					non_empty(param, index, "parameter")?;
				}
				Placeholder::Action { action, param }
			}
			Prop::Directive(Directive::Slot { name }) => {
				let name = name.unwrap_or_else(|| "default".to_owned());
				non_empty(&name, index, "slot")?;
				Placeholder::Slot { name }
			}
			Prop::Directive(Directive::Component {
				template,
				segments,
				outer,
			}) => Placeholder::Child {
				bindings: bindings(index, &segments, &outer)?,
				template,
			},
		};
		trace!(index, category = %placeholder.category(), "Classified placeholder.");
		categories.push(placeholder.category(), index);
		placeholders.push(placeholder);
	}

	Ok(Classified {
		segments: rewritten,
		placeholders,
		categories,
	})
}

fn non_empty(name: &str, index: usize, what: &'static str) -> Result<(), TemplateError> {
	if name.is_empty() {
		Err(TemplateError::EmptyName { index, what })
	} else {
		Ok(())
	}
}

/// If `segment` ends with `name=`, returns where `name` starts and `name` itself, which may be empty.
fn attribute_before(segment: &str) -> Option<(usize, &str)> {
	let before = segment.strip_suffix('=')?;
	let start = before
		.char_indices()
		.rev()
		.find(|(_, c)| c.is_whitespace())
		.map_or(0, |(i, c)| i + c.len_utf8());
	Some((start, &before[start..]))
}

fn bindings(index: usize, segments: &[String], outer: &[String]) -> Result<Vec<Binding>, TemplateError> {
	if segments.len() != outer.len() + 1 {
		return Err(TemplateError::ChildBinding {
			index,
			binding: outer.len(),
			reason: "there must be exactly one more segment than forwarded props",
		});
	}

	segments
		.iter()
		.zip(outer)
		.enumerate()
		.map(|(binding, (segment, outer))| {
			let child = match attribute_before(segment) {
				Some((_, child)) if !child.is_empty() => child,
				_ => {
					return Err(TemplateError::ChildBinding {
						index,
						binding,
						reason: "the segment must end with `prop=`",
					})
				}
			};
			if outer.is_empty() {
				return Err(TemplateError::ChildBinding {
					index,
					binding,
					reason: "the forwarded prop name is empty",
				});
			}
			Ok(Binding {
				child: child.to_owned(),
				outer: outer.clone(),
			})
		})
		.collect()
}
