//! Change detection for host update passes.

use crate::value::{loggable, Props};
use tracing::trace;

/// Everything a host delivers to a component in one update pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tick {
	/// The component's props. Entries equal to the current ones are skipped.
	pub props: Props,
	/// Values shared with slot content. Slots are only updated if one of them changed.
	///
	/// [`None`] leaves the slots alone.
	pub slot_context: Option<Props>,
}

impl Tick {
	#[must_use]
	pub fn new(props: Props) -> Self {
		Self {
			props,
			slot_context: None,
		}
	}

	#[must_use]
	pub fn with_slot_context(mut self, slot_context: Props) -> Self {
		self.slot_context = Some(slot_context);
		self
	}
}

/// The entries of `incoming` that are absent from or different in `current`.
#[must_use]
pub fn changes(current: &Props, incoming: Props) -> Props {
	incoming
		.into_iter()
		.filter(|(name, value)| {
			let changed = current.get(name) != Some(value);
			if !changed {
				trace!(name = name.as_str(), value = ?loggable(value), "Unchanged.");
			}
			changed
		})
		.collect()
}
