//! Public event subscriptions of component instances.

use crate::dom::Listener;
use hashbrown::HashMap;
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::trace;

/// Standard DOM event names. Other names are accepted, but [`on`](`crate::on`) logs them.
pub const KNOWN_EVENTS: &[&str] = &[
	"abort",
	"animationcancel",
	"animationend",
	"animationiteration",
	"animationstart",
	"auxclick",
	"beforeinput",
	"blur",
	"cancel",
	"canplay",
	"canplaythrough",
	"change",
	"click",
	"close",
	"compositionend",
	"compositionstart",
	"compositionupdate",
	"contextmenu",
	"copy",
	"cuechange",
	"cut",
	"dblclick",
	"drag",
	"dragend",
	"dragenter",
	"dragleave",
	"dragover",
	"dragstart",
	"drop",
	"durationchange",
	"emptied",
	"ended",
	"error",
	"focus",
	"focusin",
	"focusout",
	"formdata",
	"gotpointercapture",
	"input",
	"invalid",
	"keydown",
	"keypress",
	"keyup",
	"load",
	"loadeddata",
	"loadedmetadata",
	"loadstart",
	"lostpointercapture",
	"mousedown",
	"mouseenter",
	"mouseleave",
	"mousemove",
	"mouseout",
	"mouseover",
	"mouseup",
	"paste",
	"pause",
	"play",
	"playing",
	"pointercancel",
	"pointerdown",
	"pointerenter",
	"pointerleave",
	"pointermove",
	"pointerout",
	"pointerover",
	"pointerup",
	"progress",
	"ratechange",
	"reset",
	"resize",
	"scroll",
	"securitypolicyviolation",
	"seeked",
	"seeking",
	"select",
	"selectionchange",
	"selectstart",
	"stalled",
	"submit",
	"suspend",
	"timeupdate",
	"toggle",
	"touchcancel",
	"touchend",
	"touchmove",
	"touchstart",
	"transitioncancel",
	"transitionend",
	"transitionrun",
	"transitionstart",
	"volumechange",
	"waiting",
	"wheel",
];

#[must_use]
pub fn is_known_event(name: &str) -> bool {
	KNOWN_EVENTS.contains(&name)
}

/// Subscribers by alias.
pub(crate) struct Callbacks<E> {
	handlers: HashMap<String, Vec<(u64, Listener<E>)>>,
	next_id: u64,
}

impl<E> Default for Callbacks<E> {
	fn default() -> Self {
		Self {
			handlers: HashMap::new(),
			next_id: 0,
		}
	}
}

impl<E> Callbacks<E> {
	pub(crate) fn subscribe(this: &Rc<RefCell<Self>>, alias: &str, handler: Listener<E>) -> Unsubscribe<E> {
		let mut callbacks = this.borrow_mut();
		let id = callbacks.next_id;
		callbacks.next_id += 1;
		callbacks.handlers.entry(alias.to_owned()).or_default().push((id, handler));
		Unsubscribe {
			callbacks: Rc::downgrade(this),
			alias: alias.to_owned(),
			id,
		}
	}

	/// Calls each subscriber of `alias` in subscription order and returns how many there were.
	///
	/// Handlers may subscribe or unsubscribe while this runs. That takes effect with the next event.
	pub(crate) fn fire(this: &RefCell<Self>, alias: &str, event: &E) -> usize {
		let handlers: Vec<Listener<E>> = match this.borrow().handlers.get(alias) {
			Some(handlers) => handlers.iter().map(|(_, handler)| Rc::clone(handler)).collect(),
			None => Vec::new(),
		};
		trace!("Re-dispatching {:?} to {} subscriber(s).", alias, handlers.len());
		for handler in &handlers {
			handler(event);
		}
		handlers.len()
	}

	pub(crate) fn count(&self, alias: &str) -> usize {
		self.handlers.get(alias).map_or(0, Vec::len)
	}
}

/// Returned by [`Component::on`](`crate::Component::on`).
///
/// Dropping this keeps the subscription.
pub struct Unsubscribe<E> {
	callbacks: Weak<RefCell<Callbacks<E>>>,
	alias: String,
	id: u64,
}

impl<E> Unsubscribe<E> {
	pub fn unsubscribe(self) {
		let Some(callbacks) = self.callbacks.upgrade() else {
			trace!("Unsubscribing from a dropped component.");
			return;
		};
		let mut callbacks = callbacks.borrow_mut();
		if let Some(handlers) = callbacks.handlers.get_mut(&self.alias) {
			handlers.retain(|(id, _)| *id != self.id);
			if handlers.is_empty() {
				callbacks.handlers.remove(&self.alias);
			}
		}
	}
}
