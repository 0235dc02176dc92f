//! The attribute differ.

use crate::{
	arena::NodeId,
	diff::Reconciler,
	surface::Surface,
	vnode::{AttrValue, Attributes},
};
use core::mem;
use std::rc::Rc;
use tracing::{trace, warn};

/// The event name an `on…` attribute name binds, if any.
fn event_name(attribute: &str) -> Option<Rc<str>> {
	attribute.strip_prefix("on").map(|event| event.to_ascii_lowercase().into())
}

impl<S: Surface> Reconciler<S> {
	/// Applies the difference between the last applied attributes of `node` and `attributes`.
	///
	/// Afterwards, the side-table holds exactly `attributes`, including values the surface rejected.
	pub(crate) fn diff_attributes(&mut self, node: NodeId, attributes: &Attributes) {
		let old = mem::take(&mut self.nodes[node].attributes);

		for (name, value) in old.iter() {
			if !attributes.contains(name) {
				self.set_accessor(node, name, Some(value), None)
			}
		}

		for (name, value) in attributes.iter() {
			let previous = old.get(name);
			if previous != Some(value) {
				self.set_accessor(node, name, previous, Some(value))
			}
		}

		self.nodes[node].attributes = attributes.clone();
	}

	/// Applies a single attribute change. Surface rejections are logged and otherwise ignored.
	fn set_accessor(&mut self, node: NodeId, name: &str, previous: Option<&AttrValue>, value: Option<&AttrValue>) {
		let rendered = &self.nodes[node];

		if let Some(event) = event_name(name) {
			let dispatcher = &rendered.dispatcher;
			match value {
				Some(AttrValue::Listener(listener)) => {
					if dispatcher.bind(Rc::clone(&event), listener.clone()).is_none() {
						trace!(event = &*event, "Adding event listener");
						self.surface.add_event_listener(&rendered.handle, &event, dispatcher)
					}
					return;
				}
				_ if dispatcher.contains(&event) => {
					dispatcher.unbind(&event);
					trace!(event = &*event, "Removing event listener");
					self.surface.remove_event_listener(&rendered.handle, &event, dispatcher);
					if value.is_none() {
						return;
					}
				}
				_ => (),
			}
		}

		let was_applied = previous.map_or(false, |previous| previous.to_attribute_string().is_some());
		match value.and_then(AttrValue::to_attribute_string) {
			Some(string) => {
				if let Err(error) = self.surface.set_attribute(&rendered.handle, name, &string) {
					if cfg!(feature = "dangerous-logging") {
						warn!("Could not set attribute {:?}={:?} on <{}>: {:?}", name, string, rendered.name().unwrap_or_default(), error)
					} else {
						warn!("Could not set attribute {:?} on <{}>: {:?}", name, rendered.name().unwrap_or_default(), error)
					}
				}
			}
			None if was_applied => {
				if let Err(error) = self.surface.remove_attribute(&rendered.handle, name) {
					warn!("Could not remove attribute {:?} from <{}>: {:?}", name, rendered.name().unwrap_or_default(), error)
				}
			}
			None => (),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::event_name;

	#[test]
	fn event_names() {
		assert_eq!(event_name("onClick").as_deref(), Some("click"));
		assert_eq!(event_name("onmouseover").as_deref(), Some("mouseover"));
		assert_eq!(event_name("class"), None);
	}
}
