use cambium::{
	h,
	memory::{MemoryNode, MemorySurface},
	set_vnode_observer, AttrValue, Error, Listener, NodeId, Reconciler, RefCallback, RefTarget, Surface, VNode, VNodeObserver,
};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

fn setup() -> (Reconciler<MemorySurface>, NodeId) {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();

	let mut surface = MemorySurface::new();
	let body = surface.create_container("body");
	let mut reconciler = Reconciler::new(surface);
	let body = reconciler.adopt(body);
	(reconciler, body)
}

fn handle(reconciler: &Reconciler<MemorySurface>, node: NodeId) -> MemoryNode {
	*reconciler.handle(node).expect("live node")
}

fn html(reconciler: &Reconciler<MemorySurface>, node: NodeId) -> String {
	reconciler.surface().to_html(handle(reconciler, node))
}

fn list(keys: &[&str]) -> VNode {
	h("ul").children(keys.iter().map(|&key| h("li").key(key).text(key))).build()
}

#[test]
fn second_pass_is_idempotent() {
	let (mut reconciler, body) = setup();
	let tree = || {
		h("ul")
			.attr("class", "list")
			.children((0..3_i32).map(|i| h("li").attr("data-index", i).text(i.to_string())))
			.child(VNode::nothing())
			.build()
	};

	let root = reconciler.render(&tree(), body, None).unwrap();
	assert_eq!(
		html(&reconciler, body),
		r#"<body><ul class="list"><li data-index="0">0</li><li data-index="1">1</li><li data-index="2">2</li></ul></body>"#
	);

	reconciler.surface_mut().reset_stats();
	let again = reconciler.render(&tree(), body, Some(root)).unwrap();
	assert_eq!(again, root);
	assert_eq!(reconciler.surface().stats().mutations(), 0);
}

#[test]
fn keyed_permutation_reuses_every_node() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&list(&["a", "b", "c", "d"]), body, None).unwrap();
	let before = reconciler.children(root).to_vec();

	reconciler.surface_mut().reset_stats();
	reconciler.render(&list(&["d", "a", "c", "b"]), body, Some(root)).unwrap();

	assert_eq!(reconciler.children(root), [before[3], before[0], before[2], before[1]]);
	assert_eq!(html(&reconciler, root), "<ul><li>d</li><li>a</li><li>c</li><li>b</li></ul>");

	let stats = reconciler.surface().stats();
	assert_eq!(stats.created_elements + stats.created_texts, 0);
	assert_eq!(stats.removes, 0);
	assert_eq!(stats.inserts, 2);
	assert_eq!(reconciler.pooled_nodes_total(), 0);
}

#[test]
fn keyed_removal_and_insertion() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&list(&["a", "b", "c"]), body, None).unwrap();
	let b = reconciler.children(root)[1];

	reconciler.render(&list(&["x", "b"]), body, Some(root)).unwrap();

	assert_eq!(html(&reconciler, root), "<ul><li>x</li><li>b</li></ul>");
	assert_eq!(reconciler.children(root)[1], b);
	// Orphans are only recollected after all new children are placed.
	assert_eq!(reconciler.pooled_nodes("li"), 2);
}

#[test]
fn tag_change_carries_children_over() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&h("main").child(h("div").key("x").child(h("b").text("bold"))).build(), body, None).unwrap();
	let old = reconciler.children(root)[0];
	let bold = reconciler.children(old)[0];

	reconciler.surface_mut().reset_stats();
	reconciler.render(&h("main").child(h("span").key("x").child(h("b").text("bold"))).build(), body, Some(root)).unwrap();

	let new = reconciler.children(root)[0];
	assert_ne!(new, old);
	assert!(!reconciler.contains_node(old));
	assert_eq!(reconciler.children(new), [bold]);
	assert_eq!(reconciler.pooled_nodes("div"), 1);
	assert_eq!(reconciler.surface().stats().created_elements, 1);
	assert_eq!(html(&reconciler, root), "<main><span><b>bold</b></span></main>");
}

#[test]
fn unkeyed_matching_is_first_fit() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&h("p").child(h("i")).child(h("b")).child(h("u")).build(), body, None).unwrap();
	let before = reconciler.children(root).to_vec();
	let (i, b, u) = (before[0], before[1], before[2]);

	reconciler.surface_mut().reset_stats();
	reconciler.render(&h("p").child(h("b")).child(h("u")).child(h("i")).build(), body, Some(root)).unwrap();

	assert_eq!(reconciler.children(root), [b, u, i]);
	let stats = reconciler.surface().stats();
	// `b` and `u` are moved in front of `i`, rather than `i` to the end.
	assert_eq!(stats.inserts, 2);
	assert_eq!(stats.appends, 0);
	assert_eq!(stats.created_elements, 0);
	assert_eq!(stats.removes, 0);
}

#[test]
fn unmatched_children_are_recycled() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&h("div").child(h("a")).child("text").child(h("a")).build(), body, None).unwrap();

	reconciler.render(&h("div").child(h("a")).build(), body, Some(root)).unwrap();

	assert_eq!(html(&reconciler, root), "<div><a></a></div>");
	assert_eq!(reconciler.pooled_nodes("a"), 1);
	assert_eq!(reconciler.children(root).len(), 1);
}

#[test]
fn text_is_updated_in_place() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&h("p").text("one").build(), body, None).unwrap();
	let text = reconciler.children(root)[0];

	reconciler.surface_mut().reset_stats();
	reconciler.render(&h("p").text("two").build(), body, Some(root)).unwrap();

	assert_eq!(reconciler.children(root), [text]);
	assert_eq!(html(&reconciler, root), "<p>two</p>");
	let stats = reconciler.surface().stats();
	assert_eq!(stats.set_texts, 1);
	assert_eq!(stats.mutations(), 1);

	let top = reconciler.render(&VNode::text("a"), body, None).unwrap();
	assert_eq!(reconciler.render(&"b".into(), body, Some(top)).unwrap(), top);
	assert_eq!(html(&reconciler, top), "b");
}

#[test]
fn attributes_are_diffed_against_the_side_table() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&h("input").attr("id", "x").attr("disabled", true).build(), body, None).unwrap();
	assert_eq!(html(&reconciler, root), r#"<input id="x" disabled=""></input>"#);

	reconciler.surface_mut().reset_stats();
	reconciler.render(&h("input").attr("id", "x").attr("disabled", false).build(), body, Some(root)).unwrap();
	assert_eq!(html(&reconciler, root), r#"<input id="x"></input>"#);
	let stats = reconciler.surface().stats();
	assert_eq!((stats.set_attributes, stats.removed_attributes), (0, 1));

	reconciler.surface_mut().reset_stats();
	reconciler.render(&h("input").build(), body, Some(root)).unwrap();
	assert_eq!(reconciler.surface().stats().removed_attributes, 1);
	assert!(reconciler.attributes(root).unwrap().is_empty());
}

#[test]
fn rejected_attributes_are_swallowed() {
	let (mut reconciler, body) = setup();
	reconciler.surface_mut().reject_attribute("style");

	let root = reconciler.render(&h("div").attr("style", "color: red").attr("id", "a").build(), body, None).unwrap();

	let handle = handle(&reconciler, root);
	assert_eq!(reconciler.surface().attribute(handle, "style"), None);
	assert_eq!(reconciler.surface().attribute(handle, "id"), Some("a"));
	assert_eq!(reconciler.attributes(root).unwrap().get("style"), Some(&AttrValue::from("color: red")));
}

#[test]
fn one_listener_per_event_type() {
	let (mut reconciler, body) = setup();
	let clicks = Rc::new(Cell::new(0));
	let counter = |step| {
		let clicks = Rc::clone(&clicks);
		Listener::new(move |_| clicks.set(clicks.get() + step))
	};

	let root = reconciler.render(&h("button").on("click", counter(1)).build(), body, None).unwrap();
	reconciler.render(&h("button").on("click", counter(10)).build(), body, Some(root)).unwrap();

	let handle = handle(&reconciler, root);
	let stats = reconciler.surface().stats();
	assert_eq!((stats.listeners_added, stats.listeners_removed), (1, 0));
	assert_eq!(reconciler.surface().listener_count(handle), 1);

	assert!(reconciler.surface().dispatch(handle, "click", ()));
	assert_eq!(clicks.get(), 10);

	reconciler.render(&h("button").build(), body, Some(root)).unwrap();
	assert_eq!(reconciler.surface().stats().listeners_removed, 1);
	assert!(!reconciler.surface().dispatch(handle, "click", ()));
	assert_eq!(clicks.get(), 10);
}

#[test]
fn element_refs() {
	let (mut reconciler, body) = setup();
	let seen = Rc::new(RefCell::new(Vec::new()));
	let reference = {
		let seen = Rc::clone(&seen);
		RefCallback::new(move |target| seen.borrow_mut().push(target))
	};

	let root = reconciler.render(&h("div").with_ref(reference).build(), body, None).unwrap();
	assert_eq!(*seen.borrow(), [Some(RefTarget::Node(root))]);

	reconciler.unmount(root).unwrap();
	assert_eq!(*seen.borrow(), [Some(RefTarget::Node(root)), None]);
	assert!(!reconciler.contains_node(root));
	assert_eq!(reconciler.pooled_nodes("div"), 1);
	assert_eq!(html(&reconciler, body), "<body></body>");
}

#[test]
fn svg_subtrees_are_namespaced() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&h("div").child(h("svg").child(h("circle"))).child(h("span")).build(), body, None).unwrap();

	let svg = reconciler.children(root)[0];
	let circle = reconciler.children(svg)[0];
	let span = reconciler.children(root)[1];
	assert!(reconciler.surface().is_namespaced(handle(&reconciler, svg)));
	assert!(reconciler.surface().is_namespaced(handle(&reconciler, circle)));
	assert!(!reconciler.surface().is_namespaced(handle(&reconciler, span)));
	assert!(!reconciler.surface().is_namespaced(handle(&reconciler, root)));
}

#[test]
fn adopted_trees_are_reused() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();

	let mut surface = MemorySurface::new();
	let body = surface.create_container("body");
	let div = surface.create_element("DIV", false);
	surface.set_attribute(&div, "class", "old").unwrap();
	let text = surface.create_text("hello");
	surface.append_child(&div, &text);
	surface.append_child(&body, &div);

	let mut reconciler = Reconciler::new(surface);
	let body = reconciler.adopt(body);
	let existing = reconciler.children(body)[0];
	assert_eq!(reconciler.attributes(existing).unwrap().get("class"), Some(&AttrValue::from("old")));

	reconciler.surface_mut().reset_stats();
	let root = reconciler.render(&h("div").attr("class", "new").text("hello").build(), body, Some(existing)).unwrap();

	assert_eq!(root, existing);
	let stats = reconciler.surface().stats();
	assert_eq!(stats.created_elements + stats.created_texts, 0);
	assert_eq!(stats.set_attributes, 1);
	assert_eq!(stats.set_texts, 0);
	assert_eq!(html(&reconciler, body), r#"<body><DIV class="new">hello</DIV></body>"#);
}

#[test]
fn stale_ids_are_rejected() {
	let (mut reconciler, body) = setup();
	let root = reconciler.render(&h("div").build(), body, None).unwrap();
	reconciler.unmount(root).unwrap();

	assert!(matches!(reconciler.render(&h("div").build(), root, None), Err(Error::StaleNode(node)) if node == root));
	assert!(matches!(reconciler.unmount(root), Err(Error::StaleNode(_))));
}

#[test]
fn every_constructed_vnode_is_observed() {
	let seen = Rc::new(Cell::new(0));
	let observer: VNodeObserver = {
		let seen = Rc::clone(&seen);
		Rc::new(move |_| seen.set(seen.get() + 1))
	};

	let previous = set_vnode_observer(Some(observer));
	let _ = h("p").text("x").build();
	set_vnode_observer(previous);

	assert_eq!(seen.get(), 2);
	let _ = VNode::nothing();
	assert_eq!(seen.get(), 2);
}
