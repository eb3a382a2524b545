//! Live template instances.

use crate::{
	block::Block,
	classify::Placeholder,
	compile::{Marker, Template},
	directive::ActionHandle,
	dispatch::{changes, Tick},
	dom::{memory::MemoryDom, Disposer, Dom, Listener},
	error::LifecycleError,
	events::{Callbacks, Unsubscribe},
	markup,
	render::{child_props, SlotRenderers},
	value::{loggable, Props, Value},
};
use core::{
	fmt::{self, Debug, Formatter},
	mem,
};
use hashbrown::HashMap;
use std::{cell::RefCell, rc::Rc};
use tracing::{debug, error, instrument, trace, trace_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	Unmounted,
	Created,
	Mounted,
	Destroyed,
}

enum Phase<N> {
	Unmounted,
	/// Holds the instantiated skeleton until it's mounted.
	Created(N),
	Mounted,
	Destroyed,
}

/// Construction options of a [`Component`].
pub struct Options<D: Dom> {
	pub props: Props,
	/// If set, the component is created and mounted into this node right away.
	pub target: Option<D::Node>,
	pub anchor: Option<D::Node>,
	/// Replace the target's existing children, usually server-rendered markup, instead of adding to them.
	pub hydrate: bool,
	/// Slot content by slot name.
	pub slots: HashMap<String, Box<dyn Block<D>>>,
	pub slot_context: Props,
}

impl<D: Dom> Default for Options<D> {
	fn default() -> Self {
		Self {
			props: Props::new(),
			target: None,
			anchor: None,
			hydrate: false,
			slots: HashMap::new(),
			slot_context: Props::new(),
		}
	}
}

impl<D: Dom> Options<D> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.props.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn props(mut self, props: Props) -> Self {
		self.props.extend(props);
		self
	}

	#[must_use]
	pub fn target(mut self, target: D::Node) -> Self {
		self.target = Some(target);
		self
	}

	#[must_use]
	pub fn anchor(mut self, anchor: D::Node) -> Self {
		self.anchor = Some(anchor);
		self
	}

	#[must_use]
	pub fn hydrate(mut self, hydrate: bool) -> Self {
		self.hydrate = hydrate;
		self
	}

	#[must_use]
	pub fn slot(mut self, name: impl Into<String>, content: impl Block<D> + 'static) -> Self {
		self.slots.insert(name.into(), Box::new(content));
		self
	}

	#[must_use]
	pub fn slot_context(mut self, slot_context: Props) -> Self {
		self.slot_context = slot_context;
		self
	}
}

struct TextCell<N> {
	prop: String,
	node: N,
	index: usize,
}

struct AttributeCell<N> {
	index: usize,
	prop: String,
	attribute: String,
	value: String,
	/// Bound while mounted.
	element: Option<N>,
}

struct Nested<B> {
	index: usize,
	block: B,
	/// Whether this was mounted directly into the fragment, which makes it responsible for detaching its own nodes.
	at_root: bool,
}

/// An instance of a [`Template`].
pub struct Component<D: Dom = MemoryDom> {
	template: Rc<Template<D>>,
	dom: D,
	phase: Phase<D::Node>,
	props: Props,
	slot_context: Props,
	roots: Vec<D::Node>,
	text_cells: Vec<TextCell<D::Node>>,
	attribute_cells: Vec<AttributeCell<D::Node>>,
	listening: bool,
	disposers: Vec<Disposer>,
	action_updates: Vec<(usize, Box<dyn FnMut(&Value)>)>,
	callbacks: Rc<RefCell<Callbacks<D::Event>>>,
	slots: Vec<Nested<Box<dyn Block<D>>>>,
	children: Vec<Nested<Component<D>>>,
}

impl<D: Dom> Debug for Component<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("skeleton", &self.template.skeleton().id())
			.field("state", &self.state())
			.field("roots", &self.roots)
			.field("slots", &self.slots.len())
			.field("children", &self.children.len())
			.finish_non_exhaustive()
	}
}

impl<D: Dom> Component<D> {
	/// Instantiates `template`.
	///
	/// With [`Options::target`], the instance is also created and mounted.
	///
	/// # Errors
	///
	/// Iff mounting fails.
	#[instrument(skip_all, fields(skeleton = template.skeleton().id()))]
	pub fn new(template: Rc<Template<D>>, dom: D, options: Options<D>) -> Result<Self, LifecycleError> {
		let Options {
			props,
			target,
			anchor,
			hydrate,
			mut slots,
			slot_context,
		} = options;

		for declared in template.props() {
			if !props.contains_key(declared) {
				warn!("Prop {:?} was not provided.", declared);
			}
		}
		let declared = template.props();
		for name in props.keys().filter(|name| !declared.contains(&name.as_str())) {
			trace!("Ignoring undeclared prop {:?}.", name);
		}

		let mut component = Self::instance(template, dom, props);

		let template = Rc::clone(&component.template);
		for &index in &template.categories().slot {
			let Placeholder::Slot { name } = &template.placeholders()[index] else {
				continue;
			};
			match slots.remove(name) {
				Some(block) => component.slots.push(Nested {
					index,
					block,
					at_root: false,
				}),
				None => debug!("No content for slot {:?}.", name),
			}
		}
		for name in slots.keys() {
			warn!("Discarding content for undeclared slot {:?}.", name);
		}
		component.slot_context = slot_context;

		if let Some(target) = target {
			if hydrate {
				for node in component.server_rendered(&target, anchor.as_ref()) {
					component.dom.remove(&node);
				}
			}
			component.mount(&target, anchor.as_ref())?;
		} else if hydrate {
			warn!("Hydration requested without target. Ignoring.");
		}
		Ok(component)
	}

	/// The nodes in `target` that a server render of this instance produced.
	///
	/// Without `anchor`, that's all of `target`'s children.
	/// With one, it's as many siblings right before `anchor` as the rendered markup has top-level nodes.
	/// Top-level slot content isn't counted.
	fn server_rendered(&self, target: &D::Node, anchor: Option<&D::Node>) -> Vec<D::Node> {
		let mut existing = self.dom.child_nodes(target);
		if let Some(anchor) = anchor {
			let Some(end) = existing.iter().position(|node| node == anchor) else {
				warn!("Hydration anchor is not a child of the target. Not removing anything.");
				return Vec::new();
			};
			let count = markup::parse(&self.template.render(&self.props, &SlotRenderers::new())).len();
			existing.truncate(end);
			existing = existing.split_off(end.saturating_sub(count));
		}
		debug!("Hydrating: replacing {} server-rendered node(s).", existing.len());
		existing
	}

	/// A detached instance with its child components, but without slot content.
	fn instance(template: Rc<Template<D>>, dom: D, props: Props) -> Self {
		let children = template
			.categories()
			.child
			.iter()
			.filter_map(|&index| match &template.placeholders()[index] {
				Placeholder::Child { template: child, bindings } => Some(Nested {
					index,
					block: Self::instance(Rc::clone(child), dom.clone(), child_props(bindings, &props)),
					at_root: false,
				}),
				_ => None,
			})
			.collect();

		Self {
			template,
			dom,
			phase: Phase::Unmounted,
			props,
			slot_context: Props::new(),
			roots: Vec::new(),
			text_cells: Vec::new(),
			attribute_cells: Vec::new(),
			listening: false,
			disposers: Vec::new(),
			action_updates: Vec::new(),
			callbacks: Rc::default(),
			slots: Vec::new(),
			children,
		}
	}

	#[must_use]
	pub fn state(&self) -> State {
		match self.phase {
			Phase::Unmounted => State::Unmounted,
			Phase::Created(_) => State::Created,
			Phase::Mounted => State::Mounted,
			Phase::Destroyed => State::Destroyed,
		}
	}

	#[must_use]
	pub fn template(&self) -> &Rc<Template<D>> {
		&self.template
	}

	/// Current prop values.
	#[must_use]
	pub fn props(&self) -> &Props {
		&self.props
	}

	/// The nodes this instance inserted directly into its target, excluding those of slot content and children.
	#[must_use]
	pub fn roots(&self) -> &[D::Node] {
		&self.roots
	}

	/// Subscribes to the event alias `alias`.
	pub fn on(&self, alias: &str, handler: impl Fn(&D::Event) + 'static) -> Unsubscribe<D::Event> {
		if !self.template.events().contains(&alias) {
			debug!("Subscribing to undeclared event {:?}.", alias);
		}
		Callbacks::subscribe(&self.callbacks, alias, Rc::new(handler))
	}

	#[must_use]
	pub fn subscriber_count(&self, alias: &str) -> usize {
		self.callbacks.borrow().count(alias)
	}

	/// Instantiates the skeleton and prepares text and attribute cells.
	///
	/// Calling this again before mounting does nothing.
	///
	/// # Errors
	///
	/// [`LifecycleError::AlreadyMounted`], or an error from a nested block.
	#[instrument(skip(self), fields(skeleton = self.template.skeleton().id()))]
	pub fn create(&mut self) -> Result<(), LifecycleError> {
		match self.phase {
			Phase::Created(_) => {
				debug!("Already created. Skipping.");
				return Ok(());
			}
			Phase::Mounted => return Err(LifecycleError::AlreadyMounted),
			Phase::Unmounted | Phase::Destroyed => (),
		}

		let template = Rc::clone(&self.template);
		let fragment = self.dom.instantiate(template.skeleton());

		self.text_cells = template
			.categories()
			.text
			.iter()
			.filter_map(|&index| match &template.placeholders()[index] {
				Placeholder::Text { prop } => Some(TextCell {
					index,
					prop: prop.clone(),
					node: self.dom.create_text(&text_of(&self.props, prop)),
				}),
				_ => None,
			})
			.collect();
		self.attribute_cells = template
			.categories()
			.attribute
			.iter()
			.filter_map(|&index| match &template.placeholders()[index] {
				Placeholder::Attribute { prop, attribute } => Some(AttributeCell {
					index,
					prop: prop.clone(),
					attribute: attribute.clone(),
					value: text_of(&self.props, prop),
					element: None,
				}),
				_ => None,
			})
			.collect();

		for child in &mut self.children {
			child.block.create()?;
		}
		for slot in &mut self.slots {
			slot.block.create()?;
		}

		self.phase = Phase::Created(fragment);
		Ok(())
	}

	/// Binds the instance and inserts it into `target` before `anchor`, or at its end.
	///
	/// Runs [`create`](`Component::create`) first if necessary.
	///
	/// # Errors
	///
	/// [`LifecycleError::AlreadyMounted`], a marker missing from the instantiated skeleton,
	/// or an error from a nested block.
	#[instrument(skip(self, target, anchor), fields(skeleton = self.template.skeleton().id()))]
	pub fn mount(&mut self, target: &D::Node, anchor: Option<&D::Node>) -> Result<(), LifecycleError> {
		match self.phase {
			Phase::Mounted => return Err(LifecycleError::AlreadyMounted),
			Phase::Unmounted | Phase::Destroyed => {
				trace!("Not created yet. Creating first.");
				self.create()?;
			}
			Phase::Created(_) => (),
		}
		let Phase::Created(fragment) = &self.phase else {
			return Err(LifecycleError::MissingMarker {
				marker: "#document-fragment".to_owned(),
			});
		};
		let fragment = fragment.clone();

		match self.bind(&fragment, target, anchor) {
			Ok(()) => {
				self.phase = Phase::Mounted;
				Ok(())
			}
			Err(error) => {
				error!("Mounting failed: {}. Discarding the instance.", error);
				// Not mounted, so nothing is detached.
				if let Err(error) = self.destroy(false) {
					warn!("Error while discarding: {}", error);
				}
				self.phase = Phase::Unmounted;
				Err(error)
			}
		}
	}

	/// Binds the instantiated skeleton `fragment` and inserts it into `target`.
	fn bind(&mut self, fragment: &D::Node, target: &D::Node, anchor: Option<&D::Node>) -> Result<(), LifecycleError> {
		for cell in &self.text_cells {
			let marker = self.find_element(fragment, Marker::Text(cell.index))?;
			self.dom.replace_with(&marker, &cell.node);
		}
		for index in 0..self.attribute_cells.len() {
			let marker = Marker::Attribute(self.attribute_cells[index].index);
			let element = self.find_attribute(fragment, marker)?;
			let cell = &mut self.attribute_cells[index];
			self.dom.rename_attribute(&element, &marker.name(), &cell.attribute, &cell.value);
			cell.element = Some(element);
		}

		if self.listening {
			trace!("Listeners are already attached.");
		} else {
			self.attach(fragment)?;
			self.listening = true;
		}

		let template = Rc::clone(&self.template);
		let mut nested_markers = Vec::new();
		for marker in (template.categories().slot.iter().map(|&index| Marker::Slot(index)))
			.chain(template.categories().child.iter().map(|&index| Marker::Child(index)))
		{
			nested_markers.push((marker, self.find_element(fragment, marker)?));
		}
		self.roots = self
			.dom
			.child_nodes(fragment)
			.into_iter()
			.filter(|node| !nested_markers.iter().any(|(_, marker)| marker == node))
			.collect();

		for (marker, node) in nested_markers {
			let parent = self.dom.parent(&node);
			let at_root = parent.as_ref() == Some(fragment);
			let nested: Option<(&mut (dyn Block<D> + 'static), &mut bool)> = match marker {
				Marker::Slot(index) => self
					.slots
					.iter_mut()
					.find(|slot| slot.index == index)
					.map(|slot| (&mut *slot.block, &mut slot.at_root)),
				Marker::Child(index) => self
					.children
					.iter_mut()
					.find(|child| child.index == index)
					.map(|child| (&mut child.block as &mut (dyn Block<D> + 'static), &mut child.at_root)),
				_ => None,
			};
			match (nested, &parent) {
				(Some((block, nested_at_root)), Some(parent)) => {
					*nested_at_root = at_root;
					block.mount(parent, Some(&node))?;
				}
				(Some(_), None) => error!("Marker {:?} lost its parent. Not mounting its content.", marker),
				(None, _) => trace!("{:?} has no content.", marker),
			}
			self.dom.remove(&node);
		}

		self.dom.insert_before(target, fragment, anchor);
		Ok(())
	}

	/// Attaches event listeners and runs actions.
	fn attach(&mut self, fragment: &D::Node) -> Result<(), LifecycleError> {
		let template = Rc::clone(&self.template);

		for &index in &template.categories().event {
			let Placeholder::Event { event, alias } = &template.placeholders()[index] else {
				continue;
			};
			let marker = Marker::Event(index);
			let element = self.find_attribute(fragment, marker)?;
			self.dom.remove_attribute(&element, &marker.name());

			let _span = trace_span!("Attaching listener", event = event.as_str(), alias = alias.as_str()).entered();
			let callbacks = Rc::downgrade(&self.callbacks);
			let alias = alias.clone();
			let listener: Listener<D::Event> = Rc::new(move |event: &D::Event| match callbacks.upgrade() {
				Some(callbacks) => {
					Callbacks::fire(&callbacks, &alias, event);
				}
				None => trace!("Event {:?} reached a dropped component.", alias),
			});
			let disposer = self.dom.listen(&element, event, listener);
			self.disposers.push(disposer);
		}

		for &index in &template.categories().action {
			let Placeholder::Action { action, param } = &template.placeholders()[index] else {
				continue;
			};
			let marker = Marker::Action(index);
			let element = self.find_attribute(fragment, marker)?;
			self.dom.remove_attribute(&element, &marker.name());

			let value = param.as_ref().and_then(|param| self.props.get(param));
			trace!(index, param = ?param, value = ?value.map(loggable), "Running action.");
			let ActionHandle { update, destroy } = action(&element, value);
			if let Some(update) = update {
				self.action_updates.push((index, update));
			}
			if let Some(destroy) = destroy {
				self.disposers.push(destroy);
			}
		}

		Ok(())
	}

	fn find_element(&self, root: &D::Node, marker: Marker) -> Result<D::Node, LifecycleError> {
		let name = marker.name();
		self.dom
			.find_element(root, &name)
			.ok_or(LifecycleError::MissingMarker { marker: name })
	}

	fn find_attribute(&self, root: &D::Node, marker: Marker) -> Result<D::Node, LifecycleError> {
		let name = marker.name();
		self.dom
			.find_attribute(root, &name)
			.ok_or(LifecycleError::MissingMarker { marker: name })
	}

	/// Applies `changed` as-is. Use [`set`](`Component::set`) to skip unchanged values.
	///
	/// # Errors
	///
	/// [`LifecycleError::UpdateAfterDestroy`], or an error from a child component.
	#[instrument(skip_all, fields(skeleton = self.template.skeleton().id(), changed = changed.len()))]
	pub fn update(&mut self, changed: &Props) -> Result<(), LifecycleError> {
		let staged = self.apply(changed)?;
		self.flush(staged)
	}

	/// Updates local bindings and returns the props to forward to each child.
	fn apply(&mut self, changed: &Props) -> Result<Vec<Props>, LifecycleError> {
		if let Phase::Destroyed = self.phase {
			return Err(LifecycleError::UpdateAfterDestroy);
		}
		let mut staged = vec![Props::new(); self.children.len()];
		if changed.is_empty() {
			trace!("Nothing changed.");
			return Ok(staged);
		}

		for (name, value) in changed {
			trace!(name = name.as_str(), value = ?loggable(value), "Applying prop.");
			self.props.insert(name.clone(), value.clone());
			let mut bound = false;

			for cell in self.text_cells.iter().filter(|cell| &cell.prop == name) {
				self.dom.set_text(&cell.node, &value.to_text());
				bound = true;
			}
			for cell in self.attribute_cells.iter_mut().filter(|cell| &cell.prop == name) {
				cell.value = value.to_text().into_owned();
				if let Some(element) = &cell.element {
					self.dom.set_attribute(element, &cell.attribute, &cell.value);
				}
				bound = true;
			}
			for (index, update) in &mut self.action_updates {
				if matches!(&self.template.placeholders()[*index], Placeholder::Action { param: Some(param), .. } if param == name) {
					update(value);
					bound = true;
				}
			}
			for (child, forwarded) in self.children.iter().zip(&mut staged) {
				if let Placeholder::Child { bindings, .. } = &self.template.placeholders()[child.index] {
					for binding in bindings.iter().filter(|binding| &binding.outer == name) {
						forwarded.insert(binding.child.clone(), value.clone());
						bound = true;
					}
				}
			}

			if !bound {
				trace!("No live binding for prop {:?}.", name);
			}
		}
		Ok(staged)
	}

	fn flush(&mut self, staged: Vec<Props>) -> Result<(), LifecycleError> {
		for (child, changed) in self.children.iter_mut().zip(staged) {
			if !changed.is_empty() {
				child.block.update(&changed)?;
			}
		}
		Ok(())
	}

	/// Updates the props in `props` that differ from the current ones.
	///
	/// # Errors
	///
	/// Like [`update`](`Component::update`).
	pub fn set(&mut self, props: Props) -> Result<(), LifecycleError> {
		self.tick(Tick::new(props))
	}

	/// Runs one host update pass.
	///
	/// Local bindings update first, then slot content if the slot context changed,
	/// then each child at most once.
	///
	/// # Errors
	///
	/// [`LifecycleError::UpdateAfterDestroy`], or an error from a nested block.
	#[instrument(skip_all, fields(skeleton = self.template.skeleton().id()))]
	pub fn tick(&mut self, tick: Tick) -> Result<(), LifecycleError> {
		let Tick { props, slot_context } = tick;
		let changed = changes(&self.props, props);
		let staged = self.apply(&changed)?;

		if let Some(slot_context) = slot_context {
			let dirty = changes(&self.slot_context, slot_context);
			if dirty.is_empty() {
				trace!("Slot context unchanged.");
			} else {
				self.slot_context
					.extend(dirty.iter().map(|(name, value)| (name.clone(), value.clone())));
				for slot in &mut self.slots {
					slot.block.update(&dirty)?;
				}
			}
		}

		self.flush(staged)
	}

	pub fn intro(&mut self, local: bool) {
		for slot in &mut self.slots {
			slot.block.intro(local);
		}
		for child in &mut self.children {
			child.block.intro(local);
		}
	}

	pub fn outro(&mut self, local: bool) {
		for slot in &mut self.slots {
			slot.block.outro(local);
		}
		for child in &mut self.children {
			child.block.outro(local);
		}
	}

	/// Releases listeners, actions and cells. With `detaching`, the nodes are also removed from the document.
	///
	/// The instance can be mounted again afterwards.
	///
	/// # Errors
	///
	/// [`LifecycleError::AlreadyDestroyed`], or the first error of a nested block.
	/// Nested blocks are destroyed regardless.
	#[instrument(skip(self), fields(skeleton = self.template.skeleton().id()))]
	pub fn destroy(&mut self, detaching: bool) -> Result<(), LifecycleError> {
		let mounted = match self.phase {
			Phase::Unmounted => {
				trace!("Never created. Nothing to destroy.");
				return Ok(());
			}
			Phase::Destroyed => return Err(LifecycleError::AlreadyDestroyed),
			Phase::Created(_) => false,
			Phase::Mounted => true,
		};
		self.phase = Phase::Destroyed;

		if detaching && mounted {
			for root in self.roots.drain(..) {
				self.dom.remove(&root);
			}
		}
		self.roots.clear();

		let disposers = mem::take(&mut self.disposers);
		trace!("Running {} disposer(s).", disposers.len());
		for dispose in disposers {
			dispose();
		}
		self.action_updates.clear();
		self.listening = false;
		self.text_cells.clear();
		self.attribute_cells.clear();

		let mut result = Ok(());
		for slot in &mut self.slots {
			let destroyed = slot.block.destroy(detaching && slot.at_root);
			result = result.and(destroyed);
		}
		for child in &mut self.children {
			let destroyed = child.block.destroy(detaching && child.at_root);
			result = result.and(destroyed);
		}
		result
	}
}

/// Releases listeners and action handles of instances dropped without [`destroy`](`Component::destroy`).
///
/// Nodes stay where they are.
impl<D: Dom> Drop for Component<D> {
	fn drop(&mut self) {
		let disposers = mem::take(&mut self.disposers);
		if !disposers.is_empty() {
			trace!("Dropped while live. Running {} disposer(s).", disposers.len());
		}
		for dispose in disposers {
			dispose();
		}
	}
}

fn text_of(props: &Props, name: &str) -> String {
	props.get(name).map(|value| value.to_text().into_owned()).unwrap_or_default()
}

impl<D: Dom> Block<D> for Component<D> {
	fn create(&mut self) -> Result<(), LifecycleError> {
		Component::create(self)
	}

	fn mount(&mut self, target: &D::Node, anchor: Option<&D::Node>) -> Result<(), LifecycleError> {
		Component::mount(self, target, anchor)
	}

	fn update(&mut self, changed: &Props) -> Result<(), LifecycleError> {
		Component::update(self, changed)
	}

	fn intro(&mut self, local: bool) {
		Component::intro(self, local);
	}

	fn outro(&mut self, local: bool) {
		Component::outro(self, local);
	}

	fn destroy(&mut self, detaching: bool) -> Result<(), LifecycleError> {
		Component::destroy(self, detaching)
	}
}
