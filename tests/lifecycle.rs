use micro_component::{
	compile::Skeleton,
	dom::{
		memory::{Event, Node},
		Disposer, Listener,
	},
	on, props, slot, template, Component, Dom, LifecycleError, MemoryDom, Options, State, Template, Value,
};
use std::{cell::Cell, rc::Rc};

fn greeting() -> Rc<Template> {
	template!("<p class=" {"tone"} ">Hello, " {"name"} "!</p>").unwrap()
}

fn mounted(target: &Node) -> Component {
	Component::new(
		greeting(),
		MemoryDom,
		Options::new()
			.props(props! { "tone" => "warm", "name" => "Ferris" })
			.target(target.clone()),
	)
	.unwrap()
}

#[test]
fn mounting_with_target() {
	let body = Node::element("body");
	let component = mounted(&body);

	assert_eq!(component.state(), State::Mounted);
	assert_eq!(body.inner_html(), r#"<p class="warm">Hello, Ferris!</p>"#);
	assert_eq!(component.roots().len(), 1);
	assert_eq!(component.roots()[0], body.children()[0]);
}

#[test]
fn without_target_nothing_happens_until_mounted() {
	let body = Node::element("body");
	let mut component = Component::new(greeting(), MemoryDom, Options::new().prop("name", "Ferris")).unwrap();
	assert_eq!(component.state(), State::Unmounted);

	component.create().unwrap();
	assert_eq!(component.state(), State::Created);
	assert_eq!(body.inner_html(), "");

	component.mount(&body, None).unwrap();
	assert_eq!(body.inner_html(), r#"<p class>Hello, Ferris!</p>"#);
}

#[test]
fn create_twice_is_idempotent() {
	let body = Node::element("body");
	let mut component = Component::new(greeting(), MemoryDom, Options::new()).unwrap();
	component.create().unwrap();
	component.create().unwrap();
	component.mount(&body, None).unwrap();
	assert_eq!(body.children().len(), 1);
}

#[test]
fn mounting_twice_fails() {
	let body = Node::element("body");
	let mut component = mounted(&body);
	assert_eq!(component.mount(&body, None), Err(LifecycleError::AlreadyMounted));
	assert_eq!(component.create(), Err(LifecycleError::AlreadyMounted));
	assert_eq!(body.children().len(), 1);
}

#[test]
fn mounting_before_an_anchor() {
	let body = Node::element("body");
	let first = Node::element("header");
	let last = Node::element("footer");
	body.append_child(&first);
	body.append_child(&last);

	Component::new(
		greeting(),
		MemoryDom,
		Options::new()
			.props(props! { "tone" => "cool", "name" => "Corro" })
			.target(body.clone())
			.anchor(last.clone()),
	)
	.unwrap();

	assert_eq!(
		body.inner_html(),
		r#"<header></header><p class="cool">Hello, Corro!</p><footer></footer>"#
	);
}

#[test]
fn updates_touch_only_bound_nodes() {
	let body = Node::element("body");
	let mut component = mounted(&body);
	let paragraph = body.children()[0].clone();

	component.update(&props! { "name" => "Corro" }).unwrap();
	assert_eq!(body.inner_html(), r#"<p class="warm">Hello, Corro!</p>"#);

	component.update(&props! { "tone" => "cool" }).unwrap();
	assert_eq!(body.inner_html(), r#"<p class="cool">Hello, Corro!</p>"#);
	assert_eq!(body.children()[0], paragraph);
	assert_eq!(component.props()["tone"], Value::from("cool"));
}

#[test]
fn repeated_props_update_every_binding() {
	let body = Node::element("body");
	let template: Rc<Template> = template!("<p title=" {"name"} ">" {"name"} " / " {"name"} "</p>").unwrap();
	let mut component = Component::new(template, MemoryDom, Options::new().prop("name", "a").target(body.clone())).unwrap();
	assert_eq!(body.inner_html(), r#"<p title="a">a / a</p>"#);

	component.update(&props! { "name" => "b" }).unwrap();
	assert_eq!(body.inner_html(), r#"<p title="b">b / b</p>"#);
}

#[test]
fn empty_and_unknown_updates_change_nothing() {
	let body = Node::element("body");
	let mut component = mounted(&body);
	let before = body.inner_html();

	component.update(&props! {}).unwrap();
	component.update(&props! {}).unwrap();
	assert_eq!(body.inner_html(), before);

	component.update(&props! { "unknown" => 1 }).unwrap();
	assert_eq!(body.inner_html(), before);
}

#[test]
fn set_skips_unchanged_values() {
	let body = Node::element("body");
	let mut component = mounted(&body);

	component.set(props! { "name" => "Ferris", "tone" => "hot" }).unwrap();
	assert_eq!(body.inner_html(), r#"<p class="hot">Hello, Ferris!</p>"#);
}

#[test]
fn updates_before_creation_are_kept() {
	let body = Node::element("body");
	let mut component = Component::new(greeting(), MemoryDom, Options::new()).unwrap();
	component.update(&props! { "name" => "early" }).unwrap();
	component.mount(&body, None).unwrap();
	assert_eq!(body.inner_html(), r#"<p class>Hello, early!</p>"#);
}

#[test]
fn destroy_detaches() {
	let body = Node::element("body");
	let mut component = mounted(&body);
	component.destroy(true).unwrap();
	assert_eq!(component.state(), State::Destroyed);
	assert_eq!(body.inner_html(), "");
	assert!(component.roots().is_empty());
}

#[test]
fn destroy_without_detaching_leaves_nodes() {
	let body = Node::element("body");
	let mut component = mounted(&body);
	component.destroy(false).unwrap();
	assert_eq!(body.inner_html(), r#"<p class="warm">Hello, Ferris!</p>"#);
}

#[test]
fn destroy_before_create_is_a_no_op() {
	let mut component = Component::new(greeting(), MemoryDom, Options::new()).unwrap();
	component.destroy(true).unwrap();
	assert_eq!(component.state(), State::Unmounted);
}

#[test]
fn destroy_after_create_only() {
	let mut component = Component::new(greeting(), MemoryDom, Options::new()).unwrap();
	component.create().unwrap();
	component.destroy(true).unwrap();
	assert_eq!(component.state(), State::Destroyed);
}

#[test]
fn misuse_after_destroy() {
	let body = Node::element("body");
	let mut component = mounted(&body);
	component.destroy(true).unwrap();

	assert_eq!(component.destroy(true), Err(LifecycleError::AlreadyDestroyed));
	assert_eq!(
		component.update(&props! { "name" => "ghost" }),
		Err(LifecycleError::UpdateAfterDestroy)
	);
	assert_eq!(
		component.set(props! { "name" => "ghost" }),
		Err(LifecycleError::UpdateAfterDestroy)
	);
}

#[test]
fn remounting_after_destroy() {
	let body = Node::element("body");
	let mut component = mounted(&body);
	component.destroy(true).unwrap();

	component.mount(&body, None).unwrap();
	assert_eq!(component.state(), State::Mounted);
	assert_eq!(body.inner_html(), r#"<p class="warm">Hello, Ferris!</p>"#);

	component.update(&props! { "name" => "again" }).unwrap();
	assert_eq!(body.inner_html(), r#"<p class="warm">Hello, again!</p>"#);
}

#[test]
fn instances_share_the_skeleton() {
	let template = greeting();
	let body = Node::element("body");
	let a = Component::new(Rc::clone(&template), MemoryDom, Options::new().prop("name", "a").target(body.clone())).unwrap();
	let b = Component::new(Rc::clone(&template), MemoryDom, Options::new().prop("name", "b").target(body.clone())).unwrap();

	assert!(Rc::ptr_eq(a.template(), b.template()));
	assert_eq!(body.inner_html(), "<p class>Hello, a!</p><p class>Hello, b!</p>");
}

/// A [`MemoryDom`] that can be told to lose slot markers.
#[derive(Clone, Default)]
struct Lossy {
	inner: MemoryDom,
	lose_slots: Rc<Cell<bool>>,
}

impl Dom for Lossy {
	type Node = Node;
	type Event = Event;

	fn instantiate(&self, skeleton: &Skeleton) -> Node {
		self.inner.instantiate(skeleton)
	}

	fn create_text(&self, data: &str) -> Node {
		self.inner.create_text(data)
	}

	fn set_text(&self, text: &Node, data: &str) {
		self.inner.set_text(text, data);
	}

	fn child_nodes(&self, node: &Node) -> Vec<Node> {
		self.inner.child_nodes(node)
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		self.inner.parent(node)
	}

	fn insert_before(&self, parent: &Node, node: &Node, anchor: Option<&Node>) {
		self.inner.insert_before(parent, node, anchor);
	}

	fn remove(&self, node: &Node) {
		self.inner.remove(node);
	}

	fn find_element(&self, root: &Node, tag: &str) -> Option<Node> {
		if self.lose_slots.get() && tag.starts_with("mc-slot-") {
			None
		} else {
			self.inner.find_element(root, tag)
		}
	}

	fn find_attribute(&self, root: &Node, name: &str) -> Option<Node> {
		self.inner.find_attribute(root, name)
	}

	fn set_attribute(&self, element: &Node, name: &str, value: &str) {
		self.inner.set_attribute(element, name, value);
	}

	fn remove_attribute(&self, element: &Node, name: &str) {
		self.inner.remove_attribute(element, name);
	}

	fn listen(&self, element: &Node, event: &str, listener: Listener<Event>) -> Disposer {
		self.inner.listen(element, event, listener)
	}
}

#[test]
fn failed_mounts_roll_back() {
	let dom = Lossy::default();
	let template: Rc<Template<Lossy>> = template!("<p " {on("click", None)} ">hi</p>" {slot(None)} "").unwrap();
	let mut component = Component::new(template, dom.clone(), Options::new()).unwrap();
	let body = Node::element("body");

	dom.lose_slots.set(true);
	assert!(matches!(component.mount(&body, None), Err(LifecycleError::MissingMarker { .. })));
	assert_eq!(component.state(), State::Unmounted);
	assert_eq!(body.inner_html(), "");

	dom.lose_slots.set(false);
	component.mount(&body, None).unwrap();
	assert_eq!(component.state(), State::Mounted);
	assert_eq!(body.inner_html(), "<p>hi</p>");
	assert_eq!(body.subtree_listener_count(), 1);
}
