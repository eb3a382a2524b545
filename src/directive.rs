//! Placeholder values other than plain prop names.

use crate::{
	compile::Template,
	dom::Dom,
	events::is_known_event,
	value::Value,
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::debug;

/// An imperative hook run on an element when the component mounts.
///
/// It receives the element and the current value of its parameter prop, if it has one.
pub type Action<D> = Rc<dyn Fn(&<D as Dom>::Node, Option<&Value>) -> ActionHandle>;

/// What an [`Action`] leaves behind for later parameter changes and teardown.
#[derive(Default)]
pub struct ActionHandle {
	pub(crate) update: Option<Box<dyn FnMut(&Value)>>,
	pub(crate) destroy: Option<Box<dyn FnOnce()>>,
}

impl ActionHandle {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Called with the new parameter value whenever it changes while mounted.
	#[must_use]
	pub fn on_update(mut self, update: impl FnMut(&Value) + 'static) -> Self {
		self.update = Some(Box::new(update));
		self
	}

	/// Called once when the component is destroyed.
	#[must_use]
	pub fn on_destroy(mut self, destroy: impl FnOnce() + 'static) -> Self {
		self.destroy = Some(Box::new(destroy));
		self
	}
}

impl Debug for ActionHandle {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActionHandle")
			.field("update", &self.update.is_some())
			.field("destroy", &self.destroy.is_some())
			.finish()
	}
}

/// A tagged placeholder value, created by [`on`], [`use_action`], [`slot`] or [`component`].
pub enum Directive<D: Dom> {
	On { event: String, alias: Option<String> },
	Use { action: Action<D>, param: Option<String> },
	Slot { name: Option<String> },
	Component { template: Rc<Template<D>>, segments: Vec<String>, outer: Vec<String> },
}

impl<D: Dom> Clone for Directive<D> {
	fn clone(&self) -> Self {
		match self {
			Self::On { event, alias } => Self::On {
				event: event.clone(),
				alias: alias.clone(),
			},
			Self::Use { action, param } => Self::Use {
				action: Rc::clone(action),
				param: param.clone(),
			},
			Self::Slot { name } => Self::Slot { name: name.clone() },
			Self::Component { template, segments, outer } => Self::Component {
				template: Rc::clone(template),
				segments: segments.clone(),
				outer: outer.clone(),
			},
		}
	}
}

impl<D: Dom> Debug for Directive<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::On { event, alias } => f.debug_struct("On").field("event", event).field("alias", alias).finish(),
			Self::Use { param, .. } => f.debug_struct("Use").field("param", param).finish_non_exhaustive(),
			Self::Slot { name } => f.debug_struct("Slot").field("name", name).finish(),
			Self::Component { segments, outer, .. } => f
				.debug_struct("Component")
				.field("segments", segments)
				.field("outer", outer)
				.finish_non_exhaustive(),
		}
	}
}

/// One placeholder of a template, before classification.
pub enum Prop<D: Dom> {
	Name(String),
	Directive(Directive<D>),
}

impl<D: Dom> Debug for Prop<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
			Self::Directive(directive) => f.debug_tuple("Directive").field(directive).finish(),
		}
	}
}

impl<D: Dom> From<&str> for Prop<D> {
	fn from(name: &str) -> Self {
		Self::Name(name.to_owned())
	}
}

impl<D: Dom> From<String> for Prop<D> {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}

impl<D: Dom> From<Directive<D>> for Prop<D> {
	fn from(directive: Directive<D>) -> Self {
		Self::Directive(directive)
	}
}

/// Listens for `event` on the enclosing element and re-dispatches it to subscribers of `alias`,
/// which defaults to `event`.
#[must_use]
pub fn on<'a, D: Dom>(event: &str, alias: impl Into<Option<&'a str>>) -> Directive<D> {
	if !is_known_event(event) {
		debug!("{:?} is not a standard DOM event name.", event);
	}
	Directive::On {
		event: event.to_owned(),
		alias: alias.into().map(str::to_owned),
	}
}

/// Runs `action` on the enclosing element when mounted, fed by the prop `param` if given.
#[must_use]
pub fn use_action<'a, D: Dom>(
	action: impl Fn(&D::Node, Option<&Value>) -> ActionHandle + 'static,
	param: impl Into<Option<&'a str>>,
) -> Directive<D> {
	Directive::Use {
		action: Rc::new(action),
		param: param.into().map(str::to_owned),
	}
}

/// An insertion point for slot content, named `"default"` unless `name` is given.
#[must_use]
pub fn slot<'a, D: Dom>(name: impl Into<Option<&'a str>>) -> Directive<D> {
	Directive::Slot {
		name: name.into().map(str::to_owned),
	}
}

/// Embeds an instance of `template`.
///
/// `segments` and `outer` interleave like a template: each segment but the last ends with `child_prop=`,
/// and the following entry of `outer` names the prop of this template that is forwarded to it.
/// `component(&card, &[" title=", ""], &["heading"])` forwards `heading` to the card's `title`.
///
/// The bindings are validated when the enclosing template is defined.
#[must_use]
pub fn component<D: Dom>(template: &Rc<Template<D>>, segments: &[&str], outer: &[&str]) -> Directive<D> {
	Directive::Component {
		template: Rc::clone(template),
		segments: segments.iter().map(|&segment| segment.to_owned()).collect(),
		outer: outer.iter().map(|&name| name.to_owned()).collect(),
	}
}
