//! Turning classified placeholders into a shared, parsed skeleton.

use crate::{
	classify::{classify, Category, CategorySets, Classified, Placeholder},
	directive::Prop,
	dom::{memory::MemoryDom, Dom},
	error::TemplateError,
	markup::{self, Node},
};
use core::{
	fmt::{self, Debug, Formatter},
	sync::atomic::{AtomicU64, Ordering},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, trace};

/// Identifies the spot a placeholder occupies in a [`Skeleton`].
///
/// Text, slot and child markers are empty elements. The others are valueless attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
	Text(usize),
	Attribute(usize),
	Event(usize),
	Action(usize),
	Slot(usize),
	Child(usize),
}

impl Marker {
	#[must_use]
	pub fn new(category: Category, index: usize) -> Self {
		match category {
			Category::Text => Self::Text(index),
			Category::Attribute => Self::Attribute(index),
			Category::Event => Self::Event(index),
			Category::Action => Self::Action(index),
			Category::Slot => Self::Slot(index),
			Category::Child => Self::Child(index),
		}
	}

	#[must_use]
	pub fn index(self) -> usize {
		match self {
			Self::Text(index)
			| Self::Attribute(index)
			| Self::Event(index)
			| Self::Action(index)
			| Self::Slot(index)
			| Self::Child(index) => index,
		}
	}

	#[must_use]
	pub fn category(self) -> Category {
		match self {
			Self::Text(_) => Category::Text,
			Self::Attribute(_) => Category::Attribute,
			Self::Event(_) => Category::Event,
			Self::Action(_) => Category::Action,
			Self::Slot(_) => Category::Slot,
			Self::Child(_) => Category::Child,
		}
	}

	#[must_use]
	pub fn is_attribute(self) -> bool {
		matches!(self, Self::Attribute(_) | Self::Event(_) | Self::Action(_))
	}

	/// The marker's tag or attribute name.
	#[must_use]
	pub fn name(self) -> String {
		let prefix = match self {
			Self::Text(_) => "mc-text-",
			Self::Attribute(_) => "data-attribute-",
			Self::Event(_) => "data-event-",
			Self::Action(_) => "data-action-",
			Self::Slot(_) => "mc-slot-",
			Self::Child(_) => "mc-child-",
		};
		format!("{}{}", prefix, self.index())
	}

	#[must_use]
	pub fn parse_element(tag: &str) -> Option<Self> {
		let tag = tag.to_ascii_lowercase();
		let (constructor, index): (fn(usize) -> Self, _) = if let Some(index) = tag.strip_prefix("mc-text-") {
			(Self::Text, index)
		} else if let Some(index) = tag.strip_prefix("mc-slot-") {
			(Self::Slot, index)
		} else if let Some(index) = tag.strip_prefix("mc-child-") {
			(Self::Child, index)
		} else {
			return None;
		};
		index.parse().ok().map(constructor)
	}

	#[must_use]
	pub fn parse_attribute(name: &str) -> Option<Self> {
		let name = name.to_ascii_lowercase();
		let (constructor, index): (fn(usize) -> Self, _) = if let Some(index) = name.strip_prefix("data-attribute-") {
			(Self::Attribute, index)
		} else if let Some(index) = name.strip_prefix("data-event-") {
			(Self::Event, index)
		} else if let Some(index) = name.strip_prefix("data-action-") {
			(Self::Action, index)
		} else {
			return None;
		};
		index.parse().ok().map(constructor)
	}
}

static NEXT_SKELETON_ID: AtomicU64 = AtomicU64::new(0);

/// The parsed, marker-carrying markup of a template, shared by all of its instances.
#[derive(Debug)]
pub struct Skeleton {
	id: u64,
	markup: String,
	nodes: Vec<Node>,
}

impl Skeleton {
	/// Unique per skeleton within this process. Backends key their own parsed copies by it.
	#[must_use]
	pub fn id(&self) -> u64 {
		self.id
	}

	/// The normalized markup, as serialized from [`nodes`](`Skeleton::nodes`).
	#[must_use]
	pub fn markup(&self) -> &str {
		&self.markup
	}

	#[must_use]
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}
}

/// A component definition.
///
/// Create one with [`template!`](`crate::template!`) and keep the [`Rc`] around,
/// for example in a `thread_local!`, to instantiate it repeatedly.
pub struct Template<D: Dom = MemoryDom> {
	pub(crate) segments: Vec<String>,
	pub(crate) placeholders: Vec<Placeholder<D>>,
	pub(crate) categories: CategorySets,
	pub(crate) skeleton: Skeleton,
}

impl<D: Dom> Debug for Template<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Template")
			.field("segments", &self.segments)
			.field("placeholders", &self.placeholders)
			.field("skeleton", &self.skeleton.id)
			.finish()
	}
}

impl<D: Dom> Template<D> {
	/// Defines a template from its literal `segments` and the `props` between them.
	///
	/// # Errors
	///
	/// If classification fails (see [`classify`]) or a placeholder's marker doesn't end up
	/// exactly once in a position of its kind.
	#[instrument(skip_all, fields(placeholders = props.len()))]
	pub fn new(segments: &[&str], props: Vec<Prop<D>>) -> Result<Rc<Self>, TemplateError> {
		let Classified {
			segments: rewritten,
			placeholders,
			categories,
		} = classify(segments, props)?;
		let skeleton = compile(&rewritten, &placeholders)?;
		trace!(skeleton = skeleton.id, markup = %skeleton.markup, "Compiled template.");
		Ok(Rc::new(Self {
			segments: segments.iter().map(|&segment| segment.to_owned()).collect(),
			placeholders,
			categories,
			skeleton,
		}))
	}

	/// The literal segments as given.
	#[must_use]
	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	#[must_use]
	pub fn placeholders(&self) -> &[Placeholder<D>] {
		&self.placeholders
	}

	#[must_use]
	pub fn categories(&self) -> &CategorySets {
		&self.categories
	}

	#[must_use]
	pub fn skeleton(&self) -> &Skeleton {
		&self.skeleton
	}

	/// Names of the props this template reads, in order of first appearance.
	///
	/// That's text and attribute props, action parameters and props forwarded to children.
	#[must_use]
	pub fn props(&self) -> Vec<&str> {
		let mut names = Vec::new();
		for placeholder in &self.placeholders {
			match placeholder {
				Placeholder::Text { prop } | Placeholder::Attribute { prop, .. } => names.push(prop.as_str()),
				Placeholder::Action { param: Some(param), .. } => names.push(param.as_str()),
				Placeholder::Child { bindings, .. } => names.extend(bindings.iter().map(|binding| binding.outer.as_str())),
				Placeholder::Action { param: None, .. } | Placeholder::Event { .. } | Placeholder::Slot { .. } => (),
			}
		}
		dedup(names)
	}

	/// The event aliases subscribers can listen to.
	#[must_use]
	pub fn events(&self) -> Vec<&str> {
		dedup(
			self.placeholders
				.iter()
				.filter_map(|placeholder| match placeholder {
					Placeholder::Event { alias, .. } => Some(alias.as_str()),
					_ => None,
				})
				.collect(),
		)
	}

	#[must_use]
	pub fn slots(&self) -> Vec<&str> {
		dedup(
			self.placeholders
				.iter()
				.filter_map(|placeholder| match placeholder {
					Placeholder::Slot { name } => Some(name.as_str()),
					_ => None,
				})
				.collect(),
		)
	}
}

fn dedup(names: Vec<&str>) -> Vec<&str> {
	let mut unique = Vec::with_capacity(names.len());
	for name in names {
		if !unique.contains(&name) {
			unique.push(name);
		}
	}
	unique
}

/// Joins `segments` with a marker per placeholder, parses the result and checks that every marker survived.
///
/// # Errors
///
/// [`TemplateError::MissingMarker`] or [`TemplateError::DuplicateMarker`].
pub fn compile<D: Dom>(segments: &[String], placeholders: &[Placeholder<D>]) -> Result<Skeleton, TemplateError> {
	let mut source = String::new();
	for (index, segment) in segments.iter().enumerate() {
		source.push_str(segment);
		if let Some(placeholder) = placeholders.get(index) {
			let marker = Marker::new(placeholder.category(), index);
			if marker.is_attribute() {
				source.push(' ');
				source.push_str(&marker.name());
				source.push(' ');
			} else {
				let name = marker.name();
				source.push('<');
				source.push_str(&name);
				source.push_str("></");
				source.push_str(&name);
				source.push('>');
			}
		}
	}

	let nodes = markup::parse(&source);

	let mut found = HashMap::new();
	count_markers(&nodes, &mut found);
	for (index, placeholder) in placeholders.iter().enumerate() {
		let category = placeholder.category();
		match found.get(&Marker::new(category, index)).copied().unwrap_or(0) {
			0 => return Err(TemplateError::MissingMarker { index, category }),
			1 => (),
			count => return Err(TemplateError::DuplicateMarker { index, category, count }),
		}
	}

	Ok(Skeleton {
		id: NEXT_SKELETON_ID.fetch_add(1, Ordering::Relaxed),
		markup: markup::to_html(&nodes),
		nodes,
	})
}

fn count_markers(nodes: &[Node], found: &mut HashMap<Marker, usize>) {
	for node in nodes {
		if let Node::Element(element) = node {
			let markers = Marker::parse_element(&element.tag).into_iter().chain(
				element
					.attributes
					.iter()
					.filter_map(|(name, _)| Marker::parse_attribute(name)),
			);
			for marker in markers {
				*found.entry(marker).or_insert(0) += 1;
			}
			count_markers(&element.children, found);
		}
	}
}

/// Defines a [`Template`] from alternating string literals and `{placeholder}` blocks.
///
/// ```
/// use micro_component::{on, template, Template};
/// use std::rc::Rc;
///
/// let button: Rc<Template> = template!(
///     "<button class=" {"kind"} " " {on("click", "press")} ">" {"label"} "</button>"
/// )
/// .unwrap();
/// assert_eq!(button.props(), ["kind", "label"]);
/// assert_eq!(button.events(), ["press"]);
/// ```
#[macro_export]
macro_rules! template {
	($first:literal $({$placeholder:expr} $segment:literal)*) => {
		$crate::Template::new(
			&[$first $(, $segment)*],
			::std::vec![$($crate::Prop::from($placeholder)),*],
		)
	};
}
