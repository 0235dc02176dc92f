//! The capability interface between the reconciler and a concrete mutable tree of elements.

use crate::vnode::Listener;
use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace_span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	Element,
	Text,
}

/// A rendering surface, such as a browser document or [`MemorySurface`](`crate::memory::MemorySurface`).
///
/// The reconciler keeps its own side-table for every node it knows about.
/// The read accessors ([`node_kind`](`Surface::node_kind`) and below) are only used when adopting nodes it did not create.
pub trait Surface {
	type Handle: Clone + Debug;
	/// Rejections of attribute values. Logged and otherwise ignored by the reconciler.
	type Error: Debug;

	/// `namespaced` is set for elements inside an `<svg>` subtree.
	fn create_element(&mut self, name: &str, namespaced: bool) -> Self::Handle;
	fn create_text(&mut self, value: &str) -> Self::Handle;

	fn set_attribute(&mut self, node: &Self::Handle, name: &str, value: &str) -> Result<(), Self::Error>;
	fn remove_attribute(&mut self, node: &Self::Handle, name: &str) -> Result<(), Self::Error>;
	fn set_text(&mut self, node: &Self::Handle, value: &str);

	/// Inserts `node` before `reference`, or appends it if `reference` is [`None`].
	/// If `node` is already attached somewhere, it is moved.
	fn insert_before(&mut self, parent: &Self::Handle, node: &Self::Handle, reference: Option<&Self::Handle>);
	/// If `node` is already attached somewhere, it is moved.
	fn append_child(&mut self, parent: &Self::Handle, node: &Self::Handle);
	fn remove_child(&mut self, parent: &Self::Handle, node: &Self::Handle);

	fn add_event_listener(&mut self, node: &Self::Handle, event: &str, dispatcher: &Dispatcher);
	fn remove_event_listener(&mut self, node: &Self::Handle, event: &str, dispatcher: &Dispatcher);

	fn node_kind(&self, node: &Self::Handle) -> NodeKind;
	fn tag_name(&self, node: &Self::Handle) -> String;
	fn text_value(&self, node: &Self::Handle) -> String;
	fn raw_attributes(&self, node: &Self::Handle) -> Vec<(String, String)>;
	fn child_nodes(&self, node: &Self::Handle) -> Vec<Self::Handle>;
}

/// An event delivered through a [`Dispatcher`].
pub struct Event {
	name: Rc<str>,
	detail: Box<dyn Any>,
}

impl Event {
	pub fn new(name: impl Into<Rc<str>>, detail: impl Any) -> Self {
		Self {
			name: name.into(),
			detail: Box::new(detail),
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The surface-specific payload, for example a [`web_sys::Event`].
	#[must_use]
	pub fn detail<T: Any>(&self) -> Option<&T> {
		self.detail.downcast_ref()
	}
}

impl Debug for Event {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event").field("name", &self.name).finish_non_exhaustive()
	}
}

/// The single delegating listener registered per node and event type.
///
/// Handler changes only swap the entry in the shared listener map, so the surface registration stays put.
#[derive(Clone, Default)]
pub struct Dispatcher(Rc<RefCell<HashMap<Rc<str>, Listener>>>);

impl Dispatcher {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Calls the handler currently bound to `event.name()`, if any.
	/// Returns whether a handler was found.
	pub fn dispatch(&self, event: &Event) -> bool {
		let span = trace_span!("Dispatching event", event = event.name());
		let _enter = span.enter();

		// Cloned out so that the handler may rebind listeners.
		let listener = self.0.borrow().get(event.name()).cloned();
		match listener {
			Some(listener) => {
				listener.call(event);
				true
			}
			None => false,
		}
	}

	/// Identity of this dispatcher, stable for its lifetime.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}

	#[must_use]
	pub fn contains(&self, event: &str) -> bool {
		self.0.borrow().contains_key(event)
	}

	pub(crate) fn bind(&self, event: Rc<str>, listener: Listener) -> Option<Listener> {
		self.0.borrow_mut().insert(event, listener)
	}

	pub(crate) fn unbind(&self, event: &str) -> Option<Listener> {
		self.0.borrow_mut().remove(event)
	}

	pub(crate) fn events(&self) -> Vec<Rc<str>> {
		self.0.borrow().keys().cloned().collect()
	}
}

impl Debug for Dispatcher {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Dispatcher").field(&format_args!("{:#x}", self.id())).finish()
	}
}
