use micro_component::{
	component,
	dom::memory::{Event, Node},
	on, props, slot, template, Block, Component, LifecycleError, MemoryDom, Options, Props, State, Template, TextBlock,
	Tick,
};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

/// Slot content that counts lifecycle calls.
#[derive(Default)]
struct Recorder {
	updates: Rc<Cell<usize>>,
	log: Rc<RefCell<Vec<String>>>,
	node: Option<Node>,
}

impl Block<MemoryDom> for Recorder {
	fn create(&mut self) -> Result<(), LifecycleError> {
		self.log.borrow_mut().push("create".to_owned());
		self.node = Some(Node::element("i"));
		Ok(())
	}

	fn mount(&mut self, target: &Node, anchor: Option<&Node>) -> Result<(), LifecycleError> {
		self.log.borrow_mut().push("mount".to_owned());
		if let Some(node) = &self.node {
			target.insert_before(node, anchor);
		}
		Ok(())
	}

	fn update(&mut self, changed: &Props) -> Result<(), LifecycleError> {
		let mut names: Vec<_> = changed.keys().cloned().collect();
		names.sort();
		self.log.borrow_mut().push(format!("update {}", names.join(",")));
		self.updates.set(self.updates.get() + 1);
		Ok(())
	}

	fn intro(&mut self, local: bool) {
		self.log.borrow_mut().push(format!("intro {}", local));
	}

	fn outro(&mut self, local: bool) {
		self.log.borrow_mut().push(format!("outro {}", local));
	}

	fn destroy(&mut self, detaching: bool) -> Result<(), LifecycleError> {
		self.log.borrow_mut().push(format!("destroy {}", detaching));
		if let (Some(node), true) = (self.node.take(), detaching) {
			node.remove();
		}
		Ok(())
	}
}

fn layout() -> Rc<Template> {
	template!("<main>" {slot(None)} "</main><footer>" {slot("footer")} "</footer>").unwrap()
}

#[test]
fn slot_content_is_mounted_in_place_of_the_marker() {
	let body = Node::element("body");
	let _component = Component::new(
		layout(),
		MemoryDom,
		Options::new()
			.slot("default", TextBlock::fixed(MemoryDom, "content"))
			.slot("footer", TextBlock::fixed(MemoryDom, "(c)"))
			.target(body.clone()),
	)
	.unwrap();
	assert_eq!(body.inner_html(), "<main>content</main><footer>(c)</footer>");
}

#[test]
fn missing_and_undeclared_slot_content() {
	let body = Node::element("body");
	let _component = Component::new(
		layout(),
		MemoryDom,
		Options::new()
			.slot("sidebar", TextBlock::fixed(MemoryDom, "ignored"))
			.target(body.clone()),
	)
	.unwrap();
	assert_eq!(body.inner_html(), "<main></main><footer></footer>");
}

#[test]
fn slots_update_only_when_their_context_changes() {
	let body = Node::element("body");
	let recorder = Recorder::default();
	let updates = Rc::clone(&recorder.updates);
	let log = Rc::clone(&recorder.log);
	let mut component = Component::new(
		layout(),
		MemoryDom,
		Options::new()
			.slot("default", recorder)
			.slot_context(props! { "user" => "ann" })
			.target(body.clone()),
	)
	.unwrap();
	assert_eq!(*log.borrow(), ["create", "mount"]);

	component.tick(Tick::new(props! {}).with_slot_context(props! { "user" => "ann" })).unwrap();
	assert_eq!(updates.get(), 0);

	component.tick(Tick::new(props! {}).with_slot_context(props! { "user" => "bob", "theme" => "dark" })).unwrap();
	component.tick(Tick::new(props! {}).with_slot_context(props! { "user" => "bob" })).unwrap();
	component.tick(Tick::new(props! {})).unwrap();
	assert_eq!(updates.get(), 1);
	assert_eq!(log.borrow().last().map(String::as_str), Some("update theme,user"));
}

#[test]
fn bound_text_blocks_follow_the_slot_context() {
	let body = Node::element("body");
	let mut component = Component::new(
		layout(),
		MemoryDom,
		Options::new()
			.slot("footer", TextBlock::bound(MemoryDom, "year", "2020"))
			.target(body.clone()),
	)
	.unwrap();

	component.tick(Tick::default().with_slot_context(props! { "year" => 2021 })).unwrap();
	assert_eq!(body.inner_html(), "<main></main><footer>2021</footer>");
}

#[test]
fn nested_blocks_follow_the_lifecycle() {
	let body = Node::element("body");
	let top: Rc<Template> = template!("" {slot(None)} "<hr>").unwrap();
	let recorder = Recorder::default();
	let log = Rc::clone(&recorder.log);
	let mut component = Component::new(top, MemoryDom, Options::new().slot("default", recorder).target(body.clone())).unwrap();
	assert_eq!(body.inner_html(), "<i></i><hr>");
	assert_eq!(component.roots().len(), 1);

	component.intro(true);
	component.outro(false);
	component.destroy(true).unwrap();
	assert_eq!(*log.borrow(), ["create", "mount", "intro true", "outro false", "destroy true"]);
	assert_eq!(body.inner_html(), "");
}

#[test]
fn nested_content_below_the_top_level_is_not_detached_separately() {
	let body = Node::element("body");
	let recorder = Recorder::default();
	let log = Rc::clone(&recorder.log);
	let mut component = Component::new(layout(), MemoryDom, Options::new().slot("footer", recorder).target(body.clone())).unwrap();

	component.destroy(true).unwrap();
	assert_eq!(log.borrow().last().map(String::as_str), Some("destroy false"));
	assert_eq!(body.inner_html(), "");
}

fn card() -> Rc<Template> {
	template!("<h1 class=" {"tone"} " " {on("click", "select")} ">" {"title"} "</h1>").unwrap()
}

fn page() -> Rc<Template> {
	let card = card();
	template!(
		"<section>"
		{component(&card, &[" title=", " tone=", ""], &["heading", "mood"])}
		"</section><p>" {"heading"} "</p>"
	)
	.unwrap()
}

#[test]
fn children_receive_forwarded_props() {
	let body = Node::element("body");
	let mut component = Component::new(
		page(),
		MemoryDom,
		Options::new()
			.props(props! { "heading" => "Hi", "mood" => "calm" })
			.target(body.clone()),
	)
	.unwrap();
	assert_eq!(body.inner_html(), r#"<section><h1 class="calm">Hi</h1></section><p>Hi</p>"#);

	component.set(props! { "heading" => "Bye", "mood" => "calm" }).unwrap();
	assert_eq!(body.inner_html(), r#"<section><h1 class="calm">Bye</h1></section><p>Bye</p>"#);

	component.update(&props! { "mood" => "wild", "title" => "not forwarded" }).unwrap();
	assert_eq!(body.inner_html(), r#"<section><h1 class="wild">Bye</h1></section><p>Bye</p>"#);
}

#[test]
fn children_handle_their_own_events() {
	let body = Node::element("body");
	let _component = Component::new(page(), MemoryDom, Options::new().target(body.clone())).unwrap();
	let heading = body.children()[0].children()[0].clone();
	assert_eq!(heading.tag().as_deref(), Some("h1"));
	assert_eq!(heading.listener_count(), 1);
	assert_eq!(heading.dispatch(&Event::new("click")), 1);
}

#[test]
fn top_level_children_detach_themselves() {
	let body = Node::element("body");
	let card = card();
	let list: Rc<Template> = template!(
		"" {component(&card, &[" title=", ""], &["first"])}
		"" {component(&card, &[" title=", ""], &["second"])}
		""
	)
	.unwrap();
	let mut component = Component::new(
		list,
		MemoryDom,
		Options::new()
			.props(props! { "first" => "1", "second" => "2" })
			.target(body.clone()),
	)
	.unwrap();
	assert_eq!(body.inner_html(), "<h1 class>1</h1><h1 class>2</h1>");
	assert!(component.roots().is_empty());

	component.destroy(true).unwrap();
	assert_eq!(body.inner_html(), "");
	assert_eq!(body.subtree_listener_count(), 0);
	assert_eq!(component.state(), State::Destroyed);
}

#[test]
fn children_remount_with_their_parent() {
	let body = Node::element("body");
	let mut component = Component::new(
		page(),
		MemoryDom,
		Options::new()
			.props(props! { "heading" => "Hi", "mood" => "calm" })
			.target(body.clone()),
	)
	.unwrap();
	component.destroy(true).unwrap();
	component.mount(&body, None).unwrap();
	component.set(props! { "heading" => "Again" }).unwrap();

	assert_eq!(body.inner_html(), r#"<section><h1 class="calm">Again</h1></section><p>Again</p>"#);
	assert_eq!(body.subtree_listener_count(), 1);
}
