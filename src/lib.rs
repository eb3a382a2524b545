#![doc(html_root_url = "https://docs.rs/micro-component/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod block;
pub mod classify;
pub mod compile;
pub mod component;
pub mod directive;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod events;
pub mod markup;
pub mod render;
pub mod value;

pub use block::{Block, TextBlock};
pub use compile::Template;
pub use component::{Component, Options, State};
pub use directive::{component, on, slot, use_action, Action, ActionHandle, Directive, Prop};
pub use dispatch::Tick;
pub use dom::{memory::MemoryDom, Dom};
pub use error::{LifecycleError, TemplateError};
pub use render::SlotRenderers;
pub use value::{Props, Value};
