use micro_component::{
	component,
	dom::memory,
	on, props, slot, template, use_action, ActionHandle, SlotRenderers, Template, Value,
};
use std::rc::Rc;

fn no_slots() -> SlotRenderers {
	SlotRenderers::new()
}

#[test]
fn attribute_binding() {
	let template: Rc<Template> = template!("<div class=" {"hello"} " />").unwrap();
	assert_eq!(
		template.render(&props! { "hello" => "bye" }, &no_slots()),
		r#"<div class="bye"></div>"#
	);
}

#[test]
fn bound_attributes_keep_their_position() {
	let template: Rc<Template> = template!("<input type=\"text\" value=" {"value"} " placeholder=\"Name\" />").unwrap();
	assert_eq!(
		template.render(&props! { "value" => "Ferris" }, &no_slots()),
		r#"<input type="text" value="Ferris" placeholder="Name">"#
	);
}

#[test]
fn values_are_escaped() {
	let template: Rc<Template> = template!("<p title=" {"title"} ">" {"body"} "</p>").unwrap();
	assert_eq!(
		template.render(
			&props! { "title" => "say \"hi\"", "body" => "<b>&</b>" },
			&no_slots()
		),
		r#"<p title="say &quot;hi&quot;">&lt;b&gt;&amp;&lt;/b&gt;</p>"#
	);
}

#[test]
fn missing_props_render_empty() {
	let template: Rc<Template> = template!("<div class=" {"kind"} ">" {"label"} "</div>").unwrap();
	assert_eq!(template.render(&props! {}, &no_slots()), "<div class></div>");
}

#[test]
fn other_values_display() {
	let template: Rc<Template> = template!("<p>" {"count"} " " {"ok"} " " {"nothing"} "</p>").unwrap();
	assert_eq!(
		template.render(
			&props! { "count" => 3, "ok" => true, "nothing" => Value::Null },
			&no_slots()
		),
		"<p>3 true </p>"
	);
}

#[test]
fn events_and_actions_leave_no_trace() {
	let template: Rc<Template> = template!(
		"<button " {on("click", "press")} " type=\"button\" "
		{use_action(|_: &memory::Node, _: Option<&Value>| ActionHandle::new(), "tooltip")} ">Go</button>"
	)
	.unwrap();
	assert_eq!(
		template.render(&props! { "tooltip" => "hint" }, &no_slots()),
		r#"<button type="button">Go</button>"#
	);
}

#[test]
fn slots_render_their_renderer_or_nothing() {
	let template: Rc<Template> = template!("<main>" {slot(None)} "</main><footer>" {slot("footer")} "</footer>").unwrap();

	let mut slots = SlotRenderers::new();
	slots.insert("default".to_owned(), Box::new(|| "<em>content</em>".to_owned()));
	assert_eq!(
		template.render(&props! {}, &slots),
		"<main><em>content</em></main><footer></footer>"
	);
}

#[test]
fn children_render_with_forwarded_props() {
	let card: Rc<Template> = template!("<h1 class=" {"tone"} ">" {"title"} "</h1>").unwrap();
	let page: Rc<Template> = template!(
		"<section>" {component(&card, &[" title=", " tone=", ""], &["heading", "mood"])} "</section>"
	)
	.unwrap();

	assert_eq!(
		page.render(
			&props! { "heading" => "Hi", "mood" => "calm", "unrelated" => "x" },
			&no_slots()
		),
		r#"<section><h1 class="calm">Hi</h1></section>"#
	);
}

#[test]
fn rendering_is_repeatable() {
	let template: Rc<Template> = template!("<p>" {"name"} "</p>").unwrap();
	let props = props! { "name" => "a" };
	assert_eq!(template.render(&props, &no_slots()), template.render(&props, &no_slots()));
}

#[test]
fn bindings_replace_attributes_of_the_same_name() {
	let template: Rc<Template> = template!("<div class=\"a\" class=" {"x"} " title=\"t\"></div>").unwrap();
	assert_eq!(
		template.render(&props! { "x" => "b" }, &no_slots()),
		r#"<div class="b" title="t"></div>"#
	);

	let twice: Rc<Template> = template!("<div class=" {"x"} " id=\"d\" class=" {"y"} "></div>").unwrap();
	assert_eq!(
		twice.render(&props! { "x" => "1", "y" => "2" }, &no_slots()),
		r#"<div id="d" class="2"></div>"#
	);
}
