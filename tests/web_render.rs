#![cfg(target_arch = "wasm32")]

use cambium::{h, web::WebSurface, Listener, NodeId, Reconciler, VNode};
use std::{cell::Cell, rc::Rc, sync::Once};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Document, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn setup() -> (Document, Reconciler<WebSurface>, NodeId) {
	static LOG_INIT: Once = Once::new();
	LOG_INIT.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap();
	let mut reconciler = Reconciler::new(WebSurface::new(document.clone()));
	let body = reconciler.adopt(body.into());
	(document, reconciler, body)
}

#[wasm_bindgen_test]
fn click() {
	let (document, mut reconciler, body) = setup();

	let click_count = Rc::new(Cell::new(0));
	let listener = {
		let click_count = Rc::clone(&click_count);
		Listener::new(move |event| {
			event.detail::<web_sys::Event>().expect("Expected Event but received something else.");
			click_count.set(click_count.get() + 1)
		})
	};

	let root = reconciler.render(&h("BUTTON").attr("id", "test-button").on("click", listener).text("Click").build(), body, None).unwrap();

	let button: HtmlElement = document.get_element_by_id("test-button").unwrap().dyn_into().unwrap();
	assert_eq!(click_count.get(), 0);
	button.click();
	assert_eq!(click_count.get(), 1);

	reconciler.unmount(root).unwrap();
	assert!(document.get_element_by_id("test-button").is_none());
	assert_eq!(reconciler.surface().closure_count(), 0);

	button.click();
	assert_eq!(click_count.get(), 1);
}

#[wasm_bindgen_test]
fn keyed_reorder_moves_dom_nodes() {
	let (_document, mut reconciler, body) = setup();
	let list = |keys: &[&str]| -> VNode { h("ul").children(keys.iter().map(|&key| h("li").key(key).text(key))).build() };

	let root = reconciler.render(&list(&["a", "b", "c"]), body, None).unwrap();
	let before: Vec<web_sys::Node> = reconciler.children(root).iter().map(|&child| reconciler.handle(child).unwrap().clone()).collect();

	reconciler.render(&list(&["c", "b", "a"]), body, Some(root)).unwrap();

	let ul = reconciler.handle(root).unwrap();
	assert_eq!(ul.text_content().as_deref(), Some("cba"));
	let child_nodes = ul.child_nodes();
	assert!(child_nodes.get(0).unwrap().is_same_node(Some(&before[2])));
	assert!(child_nodes.get(2).unwrap().is_same_node(Some(&before[0])));

	reconciler.unmount(root).unwrap();
}

#[wasm_bindgen_test]
fn svg_is_namespaced() {
	let (_document, mut reconciler, body) = setup();

	let root = reconciler.render(&h("svg").child(h("circle").attr("r", 4)).build(), body, None).unwrap();

	let circle = reconciler.handle(reconciler.children(root)[0]).unwrap().dyn_ref::<web_sys::Element>().unwrap().clone();
	assert_eq!(circle.namespace_uri().as_deref(), Some("http://www.w3.org/2000/svg"));
	assert_eq!(circle.get_attribute("r").as_deref(), Some("4"));

	reconciler.unmount(root).unwrap();
}
