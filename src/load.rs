//! Adoption of surface nodes this crate didn't create.

use crate::{
	arena::{NodeId, RenderedNode},
	diff::Reconciler,
	surface::{NodeKind, Surface},
	vnode::{AttrValue, Attributes},
};
use tracing::{instrument, trace};

impl<S: Surface> Reconciler<S> {
	/// Registers `handle` and all of its descendants with this reconciler and returns the id of `handle`.
	///
	/// The attribute side-table of each adopted element is seeded from the surface once, here.
	/// Use this on the container to render into, and optionally pass one of its children as `merge` to [`Reconciler::render`].
	///
	/// Adopting a node that is already known to this reconciler registers it a second time, which is a logic error.
	#[instrument(skip(self))]
	pub fn adopt(&mut self, handle: S::Handle) -> NodeId {
		self.load_node(handle)
	}

	fn load_node(&mut self, handle: S::Handle) -> NodeId {
		match self.surface.node_kind(&handle) {
			NodeKind::Text => {
				let value = self.surface.text_value(&handle);
				self.insert_node(RenderedNode::text(handle, value))
			}
			NodeKind::Element => self.load_element(handle),
		}
	}

	fn load_element(&mut self, handle: S::Handle) -> NodeId {
		let name = self.surface.tag_name(&handle).to_ascii_lowercase();
		trace!(name = %name, "Adopting element");

		let mut rendered = RenderedNode::element(handle, name.into());
		rendered.attributes = self.load_attributes(&rendered.handle);
		let child_nodes = self.surface.child_nodes(&rendered.handle);

		let element = self.insert_node(rendered);
		for child in child_nodes {
			let child = self.load_node(child);
			self.nodes[child].parent = Some(element);
			self.nodes[element].children.push(child);
		}
		element
	}

	fn load_attributes(&self, handle: &S::Handle) -> Attributes {
		let mut attributes = Attributes::new();
		for (name, value) in self.surface.raw_attributes(handle) {
			attributes.set(name, AttrValue::from(value));
		}
		attributes
	}
}
