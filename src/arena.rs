use crate::{
	component::AnyInstance,
	surface::Dispatcher,
	vnode::{Attributes, Key, RefCallback},
};
use core::any::TypeId;
use hashbrown::HashMap;
use std::rc::Rc;

slotmap::new_key_type! {
	/// Generation-checked handle of a rendered node.
	pub struct NodeId;
	/// Generation-checked handle of a mounted component instance.
	pub struct ComponentId;
}

#[derive(Debug)]
pub(crate) enum RenderedKind {
	/// `name` is lowercased.
	Element { name: Rc<str> },
	Text { value: String },
}

/// Side-table entry of one surface node.
///
/// `parent` and `children` mirror the surface's tree for every node this reconciler knows about.
#[derive(Debug)]
pub(crate) struct RenderedNode<H> {
	pub handle: H,
	pub kind: RenderedKind,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
	/// Exactly the attributes last applied by the differ.
	pub attributes: Attributes,
	pub dispatcher: Dispatcher,
	/// Outermost component of the chain that renders into this node.
	pub component: Option<ComponentId>,
	pub component_type: Option<TypeId>,
	pub key: Option<Key>,
	pub reference: Option<RefCallback>,
	pub pooled: bool,
}

impl<H> RenderedNode<H> {
	pub fn element(handle: H, name: Rc<str>) -> Self {
		Self::new(handle, RenderedKind::Element { name })
	}

	pub fn text(handle: H, value: String) -> Self {
		Self::new(handle, RenderedKind::Text { value })
	}

	fn new(handle: H, kind: RenderedKind) -> Self {
		Self {
			handle,
			kind,
			parent: None,
			children: Vec::new(),
			attributes: Attributes::new(),
			dispatcher: Dispatcher::new(),
			component: None,
			component_type: None,
			key: None,
			reference: None,
			pooled: false,
		}
	}

	pub fn is_text(&self) -> bool {
		matches!(self.kind, RenderedKind::Text { .. })
	}

	pub fn name(&self) -> Option<&str> {
		match &self.kind {
			RenderedKind::Element { name } => Some(name),
			RenderedKind::Text { .. } => None,
		}
	}

	/// Case-insensitive tag name comparison.
	pub fn is_named(&self, name: &str) -> bool {
		self.name().map_or(false, |own| own.eq_ignore_ascii_case(name))
	}
}

/// Idle element nodes, keyed by lowercased tag name.
#[derive(Debug, Default)]
pub(crate) struct NodePool(HashMap<Rc<str>, Vec<NodeId>>);

impl NodePool {
	pub fn put(&mut self, name: Rc<str>, node: NodeId) {
		self.0.entry(name).or_default().push(node)
	}

	pub fn take(&mut self, name: &str) -> Option<NodeId> {
		self.0.get_mut(name).and_then(Vec::pop)
	}

	pub fn count(&self, name: &str) -> usize {
		self.0.get(name).map_or(0, Vec::len)
	}

	pub fn total(&self) -> usize {
		self.0.values().map(Vec::len).sum()
	}
}

/// Idle component instances, keyed by concrete component type.
#[derive(Default)]
pub(crate) struct ComponentPool(HashMap<TypeId, Vec<Box<dyn AnyInstance>>>);

impl ComponentPool {
	pub fn put(&mut self, instance: Box<dyn AnyInstance>) {
		self.0.entry(instance.component_type()).or_default().push(instance)
	}

	pub fn take(&mut self, component_type: TypeId) -> Option<Box<dyn AnyInstance>> {
		self.0.get_mut(&component_type).and_then(Vec::pop)
	}

	pub fn count(&self, component_type: TypeId) -> usize {
		self.0.get(&component_type).map_or(0, Vec::len)
	}
}
