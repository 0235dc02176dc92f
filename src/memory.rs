//! A headless [`Surface`] that keeps its tree in memory.
//!
//! Besides hosting reconciliation without a browser, it counts every mutation it receives,
//! which makes it the surface of choice for testing how much work a diff does.

use crate::surface::{Dispatcher, Event, NodeKind, Surface};
use core::{any::Any, fmt::Write as _};
use hashbrown::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryNode(usize);

/// Mutation counters. Creation of containers through [`MemorySurface::create_container`] isn't counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
	pub created_elements: usize,
	pub created_texts: usize,
	pub set_attributes: usize,
	pub removed_attributes: usize,
	pub set_texts: usize,
	pub inserts: usize,
	pub appends: usize,
	pub removes: usize,
	pub listeners_added: usize,
	pub listeners_removed: usize,
}

impl Stats {
	/// Total number of operations that changed the tree in any way.
	#[must_use]
	pub fn mutations(&self) -> usize {
		let Self {
			created_elements,
			created_texts,
			set_attributes,
			removed_attributes,
			set_texts,
			inserts,
			appends,
			removes,
			listeners_added,
			listeners_removed,
		} = *self;
		created_elements + created_texts + set_attributes + removed_attributes + set_texts + inserts + appends + removes + listeners_added + listeners_removed
	}
}

/// Returned for attribute names configured with [`MemorySurface::reject_attribute`].
#[derive(Debug, Error)]
#[error("Attribute {0:?} was rejected")]
pub struct Rejected(pub String);

#[derive(Debug)]
enum Data {
	Element {
		name: String,
		namespaced: bool,
		attributes: Vec<(String, String)>,
		listeners: HashMap<Rc<str>, Dispatcher>,
	},
	Text(String),
}

#[derive(Debug)]
struct Entry {
	data: Data,
	parent: Option<MemoryNode>,
	children: Vec<MemoryNode>,
}

#[derive(Debug, Default)]
pub struct MemorySurface {
	entries: Vec<Entry>,
	stats: Stats,
	rejected: HashSet<String>,
}

impl MemorySurface {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn push(&mut self, data: Data) -> MemoryNode {
		self.entries.push(Entry { data, parent: None, children: Vec::new() });
		MemoryNode(self.entries.len() - 1)
	}

	/// Creates a detached element without counting it, for use as render target.
	pub fn create_container(&mut self, name: &str) -> MemoryNode {
		self.push(Data::Element {
			name: name.to_owned(),
			namespaced: false,
			attributes: Vec::new(),
			listeners: HashMap::new(),
		})
	}

	/// Makes [`Surface::set_attribute`] fail for `name` from now on.
	pub fn reject_attribute(&mut self, name: impl Into<String>) {
		self.rejected.insert(name.into());
	}

	#[must_use]
	pub fn stats(&self) -> Stats {
		self.stats
	}

	pub fn reset_stats(&mut self) {
		self.stats = Stats::default()
	}

	#[must_use]
	pub fn children(&self, node: MemoryNode) -> &[MemoryNode] {
		&self.entries[node.0].children
	}

	#[must_use]
	pub fn parent(&self, node: MemoryNode) -> Option<MemoryNode> {
		self.entries[node.0].parent
	}

	#[must_use]
	pub fn attribute(&self, node: MemoryNode, name: &str) -> Option<&str> {
		match &self.entries[node.0].data {
			Data::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str()),
			Data::Text(_) => None,
		}
	}

	#[must_use]
	pub fn is_namespaced(&self, node: MemoryNode) -> bool {
		matches!(self.entries[node.0].data, Data::Element { namespaced: true, .. })
	}

	/// Number of event types with a registered listener on `node`.
	#[must_use]
	pub fn listener_count(&self, node: MemoryNode) -> usize {
		match &self.entries[node.0].data {
			Data::Element { listeners, .. } => listeners.len(),
			Data::Text(_) => 0,
		}
	}

	/// Delivers an event of type `event` to the listener registered on `node`, if any.
	/// Returns whether a handler ran.
	pub fn dispatch(&self, node: MemoryNode, event: &str, detail: impl Any) -> bool {
		let dispatcher = match &self.entries[node.0].data {
			Data::Element { listeners, .. } => listeners.get(event).cloned(),
			Data::Text(_) => None,
		};
		dispatcher.map_or(false, |dispatcher| dispatcher.dispatch(&Event::new(event, detail)))
	}

	/// Serializes the subtree at `node`.
	#[must_use]
	pub fn to_html(&self, node: MemoryNode) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: MemoryNode, html: &mut String) {
		let entry = &self.entries[node.0];
		match &entry.data {
			Data::Text(text) => escape(text, html),
			Data::Element { name, attributes, .. } => {
				html.push('<');
				html.push_str(name);
				for (name, value) in attributes {
					let _ = write!(html, " {}=\"", name);
					escape(value, html);
					html.push('"');
				}
				html.push('>');
				for &child in &entry.children {
					self.write_html(child, html)
				}
				let _ = write!(html, "</{}>", name);
			}
		}
	}

	fn detach(&mut self, node: MemoryNode) {
		if let Some(parent) = self.entries[node.0].parent.take() {
			self.entries[parent.0].children.retain(|&child| child != node)
		}
	}

	fn element_mut(&mut self, node: MemoryNode) -> Option<(&mut Vec<(String, String)>, &mut HashMap<Rc<str>, Dispatcher>)> {
		match &mut self.entries[node.0].data {
			Data::Element { attributes, listeners, .. } => Some((attributes, listeners)),
			Data::Text(_) => None,
		}
	}
}

fn escape(text: &str, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

impl Surface for MemorySurface {
	type Handle = MemoryNode;
	type Error = Rejected;

	fn create_element(&mut self, name: &str, namespaced: bool) -> MemoryNode {
		self.stats.created_elements += 1;
		self.push(Data::Element {
			name: name.to_owned(),
			namespaced,
			attributes: Vec::new(),
			listeners: HashMap::new(),
		})
	}

	fn create_text(&mut self, value: &str) -> MemoryNode {
		self.stats.created_texts += 1;
		self.push(Data::Text(value.to_owned()))
	}

	fn set_attribute(&mut self, node: &MemoryNode, name: &str, value: &str) -> Result<(), Rejected> {
		if self.rejected.contains(name) {
			return Err(Rejected(name.to_owned()));
		}
		self.stats.set_attributes += 1;
		if let Some((attributes, _)) = self.element_mut(*node) {
			match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value.to_owned(),
				None => attributes.push((name.to_owned(), value.to_owned())),
			}
		}
		Ok(())
	}

	fn remove_attribute(&mut self, node: &MemoryNode, name: &str) -> Result<(), Rejected> {
		self.stats.removed_attributes += 1;
		if let Some((attributes, _)) = self.element_mut(*node) {
			attributes.retain(|(n, _)| n != name)
		}
		Ok(())
	}

	fn set_text(&mut self, node: &MemoryNode, value: &str) {
		self.stats.set_texts += 1;
		if let Data::Text(text) = &mut self.entries[node.0].data {
			*text = value.to_owned()
		}
	}

	fn insert_before(&mut self, parent: &MemoryNode, node: &MemoryNode, reference: Option<&MemoryNode>) {
		self.stats.inserts += 1;
		self.detach(*node);
		let children = &mut self.entries[parent.0].children;
		match reference.and_then(|reference| children.iter().position(|child| child == reference)) {
			Some(index) => children.insert(index, *node),
			None => children.push(*node),
		}
		self.entries[node.0].parent = Some(*parent);
	}

	fn append_child(&mut self, parent: &MemoryNode, node: &MemoryNode) {
		self.stats.appends += 1;
		self.detach(*node);
		self.entries[parent.0].children.push(*node);
		self.entries[node.0].parent = Some(*parent);
	}

	fn remove_child(&mut self, parent: &MemoryNode, node: &MemoryNode) {
		self.stats.removes += 1;
		if self.entries[node.0].parent == Some(*parent) {
			self.detach(*node)
		} else {
			trace!(?parent, ?node, "Not a child");
		}
	}

	fn add_event_listener(&mut self, node: &MemoryNode, event: &str, dispatcher: &Dispatcher) {
		self.stats.listeners_added += 1;
		if let Some((_, listeners)) = self.element_mut(*node) {
			listeners.insert(event.into(), dispatcher.clone());
		}
	}

	fn remove_event_listener(&mut self, node: &MemoryNode, event: &str, _dispatcher: &Dispatcher) {
		self.stats.listeners_removed += 1;
		if let Some((_, listeners)) = self.element_mut(*node) {
			listeners.remove(event);
		}
	}

	fn node_kind(&self, node: &MemoryNode) -> NodeKind {
		match self.entries[node.0].data {
			Data::Element { .. } => NodeKind::Element,
			Data::Text(_) => NodeKind::Text,
		}
	}

	fn tag_name(&self, node: &MemoryNode) -> String {
		match &self.entries[node.0].data {
			Data::Element { name, .. } => name.clone(),
			Data::Text(_) => String::new(),
		}
	}

	fn text_value(&self, node: &MemoryNode) -> String {
		match &self.entries[node.0].data {
			Data::Text(text) => text.clone(),
			Data::Element { .. } => String::new(),
		}
	}

	fn raw_attributes(&self, node: &MemoryNode) -> Vec<(String, String)> {
		match &self.entries[node.0].data {
			Data::Element { attributes, .. } => attributes.clone(),
			Data::Text(_) => Vec::new(),
		}
	}

	fn child_nodes(&self, node: &MemoryNode) -> Vec<MemoryNode> {
		self.entries[node.0].children.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::MemorySurface;
	use crate::surface::Surface;

	#[test]
	fn moves_on_insert() {
		let mut surface = MemorySurface::new();
		let (a, b) = (surface.create_container("a"), surface.create_container("b"));
		let text = surface.create_text("x");

		surface.append_child(&a, &text);
		surface.insert_before(&b, &text, None);

		assert!(surface.children(a).is_empty());
		assert_eq!(surface.children(b), [text]);
		assert_eq!(surface.to_html(b), "<b>x</b>");
	}
}
