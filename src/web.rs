//! The browser DOM as [`Surface`].

use crate::{
	options::BatchingHook,
	rc_hash_map::RcHashMap,
	surface::{Dispatcher, Event, NodeKind, Surface},
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::{error, instrument, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};
use web_sys::{CharacterData, Document, Element, Node};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Renders into a [`web_sys::Document`].
///
/// Each [`Dispatcher`] is backed by one JavaScript closure, shared by all event types it is registered for.
/// Handlers receive the [`web_sys::Event`] as [`Event::detail`].
pub struct WebSurface {
	document: Document,
	closures: RcHashMap<usize, u16, Closure<dyn Fn(web_sys::Event)>>,
}

impl WebSurface {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			closures: RcHashMap::new(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Number of JavaScript closures currently held for event listeners.
	#[must_use]
	pub fn closure_count(&self) -> usize {
		self.closures.len()
	}
}

impl Debug for WebSurface {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebSurface")
			.field("document", &self.document)
			.field("closures", &self.closures.len())
			.finish()
	}
}

fn element(node: &Node) -> Option<&Element> {
	node.dyn_ref::<Element>()
}

impl Surface for WebSurface {
	type Handle = Node;
	type Error = JsValue;

	fn create_element(&mut self, name: &str, namespaced: bool) -> Node {
		let element = if namespaced {
			self.document.create_element_ns(Some(SVG_NAMESPACE), name)
		} else {
			self.document.create_element(name)
		};
		element.expect_throw("cambium: Failed to create element").into()
	}

	fn create_text(&mut self, value: &str) -> Node {
		self.document.create_text_node(value).into()
	}

	fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), JsValue> {
		match element(node) {
			Some(element) => element.set_attribute(name, value),
			None => Err(JsValue::from_str("Not an element")),
		}
	}

	fn remove_attribute(&mut self, node: &Node, name: &str) -> Result<(), JsValue> {
		match element(node) {
			Some(element) => element.remove_attribute(name),
			None => Err(JsValue::from_str("Not an element")),
		}
	}

	fn set_text(&mut self, node: &Node, value: &str) {
		match node.dyn_ref::<CharacterData>() {
			Some(text) => text.set_data(value),
			None => error!("Expected text node"),
		}
	}

	fn insert_before(&mut self, parent: &Node, node: &Node, reference: Option<&Node>) {
		if let Err(error) = parent.insert_before(node, reference) {
			error!("Failed to insert node: {:?}", error)
		}
	}

	fn append_child(&mut self, parent: &Node, node: &Node) {
		if let Err(error) = parent.append_child(node) {
			error!("Failed to append node: {:?}", error)
		}
	}

	fn remove_child(&mut self, parent: &Node, node: &Node) {
		if let Err(error) = parent.remove_child(node) {
			warn!("Failed to remove node: {:?}", error)
		}
	}

	#[instrument(skip(self))]
	fn add_event_listener(&mut self, node: &Node, event: &str, dispatcher: &Dispatcher) {
		let closure = self
			.closures
			.increment_or_insert_with(dispatcher.id(), |_| {
				trace!("Creating closure");
				let dispatcher = dispatcher.clone();
				Closure::wrap(Box::new(move |event: web_sys::Event| {
					dispatcher.dispatch(&Event::new(event.type_(), event));
				}) as Box<dyn Fn(web_sys::Event)>)
			})
			.expect_throw("cambium: Too many (more than 65k) event types bound through the same dispatcher");
		if let Err(error) = node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
			error!("Failed to add event listener: {:?}", error)
		}
	}

	#[instrument(skip(self))]
	fn remove_event_listener(&mut self, node: &Node, event: &str, dispatcher: &Dispatcher) {
		match self.closures.weak_decrement(&dispatcher.id()) {
			Ok(Some(closure)) => {
				if let Err(error) = node.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
					error!("Failed to remove event listener: {:?}", error)
				}
			}
			Ok(None) => error!("No closure registered for this dispatcher"),
			Err(error) => error!("{}", error),
		}

		let drain = self.closures.drain_weak();
		trace!("Freed {} closure(s).", drain.count());
	}

	fn node_kind(&self, node: &Node) -> NodeKind {
		if node.node_type() == Node::TEXT_NODE {
			NodeKind::Text
		} else {
			NodeKind::Element
		}
	}

	fn tag_name(&self, node: &Node) -> String {
		element(node).map(Element::tag_name).unwrap_or_default()
	}

	fn text_value(&self, node: &Node) -> String {
		node.text_content().unwrap_or_default()
	}

	fn raw_attributes(&self, node: &Node) -> Vec<(String, String)> {
		let attributes = match element(node) {
			Some(element) => element.attributes(),
			None => return Vec::new(),
		};
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| (attribute.name(), attribute.value()))
			.collect()
	}

	fn child_nodes(&self, node: &Node) -> Vec<Node> {
		let child_nodes = node.child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.get(i)).collect()
	}
}

/// Creates a [`BatchingHook`] that schedules `flush` as microtask.
///
/// `flush` should call [`Reconciler::flush_pending_renders`](`crate::Reconciler::flush_pending_renders`),
/// typically through an [`Rc`]`<`[`RefCell`](`core::cell::RefCell`)`<_>>` it shares with the event handlers.
pub fn microtask_hook(flush: Rc<dyn Fn()>) -> BatchingHook {
	Rc::new(move || {
		let flush = Rc::clone(&flush);
		let closure = Closure::once(move |_: JsValue| flush());
		let _ = js_sys::Promise::resolve(&JsValue::UNDEFINED).then(&closure);
		// The Rust side is dropped after the single call.
		closure.forget();
	})
}
