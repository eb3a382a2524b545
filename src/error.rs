use crate::classify::Category;
use thiserror::Error;

/// Raised while defining a [`Template`](`crate::Template`).
///
/// These indicate mistakes in the template itself, so they surface before any instance exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
	#[error("{} placeholder(s) need {} literal segment(s), but {} were given", .placeholders, .placeholders + 1, .segments)]
	SegmentCount { placeholders: usize, segments: usize },

	#[error("placeholder {index} has an empty {what} name")]
	EmptyName { index: usize, what: &'static str },

	#[error("placeholder {index} follows `=`, but no attribute name precedes it")]
	MissingAttributeName { index: usize },

	#[error("binding {binding} of the child component at placeholder {index} is malformed: {reason}")]
	ChildBinding { index: usize, binding: usize, reason: &'static str },

	#[error(
		"the {category} marker of placeholder {index} did not survive parsing \
		(placeholders can't appear inside quoted attribute values, and directives only inside tags)"
	)]
	MissingMarker { index: usize, category: Category },

	#[error("the {category} marker of placeholder {index} appears {count} times")]
	DuplicateMarker { index: usize, category: Category, count: usize },
}

/// Raised by [`Component`](`crate::Component`) lifecycle calls made out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
	#[error("the component is already mounted")]
	AlreadyMounted,

	#[error("the component was already destroyed")]
	AlreadyDestroyed,

	#[error("the component was destroyed and can't be updated until it's mounted again")]
	UpdateAfterDestroy,

	/// The instantiated skeleton lacks a marker the template declared. This is a bug in the DOM backend.
	#[error("marker {marker:?} is missing from the instantiated skeleton")]
	MissingMarker { marker: String },
}
