//! The node differ and child reconciler.

use crate::{
	arena::{ComponentId, ComponentPool, NodeId, NodePool, RenderedKind, RenderedNode},
	component::{Component, Instance, Link},
	context::Context,
	error::{hook_error, Error, Result},
	lifecycle::{ComponentSlot, Hook, RenderMode},
	options::Options,
	scheduler::Scheduler,
	surface::Surface,
	vnode::{Attributes, ElementNode, Key, RefCallback, RefTarget, VNode, VNodeKind},
};
use core::{
	any::TypeId,
	fmt::{self, Debug, Formatter},
	mem,
};
use hashbrown::HashMap;
use slotmap::SlotMap;
use tracing::{instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Reconciles [`VNode`] trees against the nodes of one [`Surface`].
///
/// The reconciler owns a side-table entry for every surface node it created or [adopted](`Reconciler::adopt`),
/// every mounted component, and the recycle pools for both.
///
/// # Correct Use
///
/// Nodes the reconciler knows about must only be mutated through it.
/// Changes made directly on the surface are not observed, since diffs are computed against the side-table.
pub struct Reconciler<S: Surface> {
	pub(crate) surface: S,
	pub(crate) nodes: SlotMap<NodeId, RenderedNode<S::Handle>>,
	pub(crate) components: SlotMap<ComponentId, ComponentSlot>,
	pub(crate) node_pool: NodePool,
	pub(crate) component_pool: ComponentPool,
	pub(crate) scheduler: Scheduler,
	pub(crate) options: Options,
	pub(crate) svg_mode: bool,
	/// Element refs, fired once the current top-level operation has attached its nodes.
	pub(crate) pending_refs: Vec<(RefCallback, NodeId)>,
}

impl<S: Surface> Reconciler<S> {
	#[must_use]
	pub fn new(surface: S) -> Self {
		Self::with_options(surface, Options::default())
	}

	#[must_use]
	#[instrument(skip(surface))]
	pub fn with_options(surface: S, options: Options) -> Self {
		Self {
			surface,
			nodes: SlotMap::with_key(),
			components: SlotMap::with_key(),
			node_pool: NodePool::default(),
			component_pool: ComponentPool::default(),
			scheduler: Scheduler::new(options.render_batching_hook.clone()),
			options,
			svg_mode: false,
			pending_refs: Vec::new(),
		}
	}

	#[must_use]
	pub fn options(&self) -> &Options {
		&self.options
	}

	/// Replaces the current configuration.
	pub fn set_options(&mut self, options: Options) {
		self.scheduler.set_hook(options.render_batching_hook.clone());
		self.options = options;
	}

	#[must_use]
	pub fn surface(&self) -> &S {
		&self.surface
	}

	/// Direct access to the surface.
	/// See [Correct Use](`Reconciler`#correct-use).
	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	/// Reconciles `vnode` against `merge` (or builds it from scratch) and makes sure the result is a child of `parent`.
	///
	/// Returns the root node of the result, which is `merge` whenever it could be reused.
	/// If `merge` already belongs to a component of the same type as `vnode`, that component is updated and
	/// mount hooks are not run again.
	///
	/// # Errors
	///
	/// [`Error::StaleNode`] if `parent` or `merge` isn't known to this reconciler,
	/// otherwise any error returned by a render function or lifecycle hook.
	/// Mutations applied before the error stay in place.
	#[instrument(skip(self, vnode))]
	pub fn render(&mut self, vnode: &VNode, parent: NodeId, merge: Option<NodeId>) -> Result<NodeId> {
		let result = self.render_into(vnode, parent, merge);
		self.finish_operation(result)
	}

	fn render_into(&mut self, vnode: &VNode, parent: NodeId, merge: Option<NodeId>) -> Result<NodeId> {
		self.check_node(parent)?;
		if let Some(merge) = merge {
			self.check_node(merge)?;
		}

		let existing = merge.and_then(|merge| self.nodes[merge].component);

		let built = self.diff(merge, vnode, &Context::new(), false, false)?;
		// Components updated in place (also behind functional wrappers) were mounted before.
		let mounted = self.nodes[built].component.filter(|&component| Some(component) != existing);

		if let Some(component) = mounted {
			self.deep_hook(component, Hook::WillMount)?;
		}
		if self.nodes[built].parent != Some(parent) {
			self.append_child(parent, built);
		}
		if let Some(component) = mounted {
			self.deep_hook(component, Hook::DidMount)?;
		}

		Ok(built)
	}

	/// Tears down `node` and its subtree: components are unmounted, element nodes return to the pool,
	/// and the node is detached from its parent.
	///
	/// # Errors
	///
	/// [`Error::StaleNode`] if `node` isn't known to this reconciler, otherwise the first error returned by an unmount hook.
	#[instrument(skip(self))]
	pub fn unmount(&mut self, node: NodeId) -> Result<()> {
		let result = self.check_node(node).and_then(|()| self.recollect_node_tree(node, false));
		self.finish_operation(result)
	}

	/// Renders every component that became dirty since the last flush.
	///
	/// Updates sent through [`Link`]s are applied first. Components marked dirty during the flush are rendered
	/// in a follow-up batch of the same call, so this only returns once nothing is pending.
	///
	/// # Errors
	///
	/// The first error returned by a render function or lifecycle hook.
	/// Components of the aborted batch stay queued.
	#[instrument(skip(self))]
	pub fn flush_pending_renders(&mut self) -> Result<()> {
		let result = self.flush();
		self.finish_operation(result)
	}

	fn flush(&mut self) -> Result<()> {
		let mut batches = 0_usize;
		loop {
			for update in self.scheduler.take_updates() {
				let slot = match self.components.get_mut(update.id) {
					Some(slot) => slot,
					None => {
						trace!(id = ?update.id, "Dropping state update of unmounted component");
						continue;
					}
				};
				(update.apply)(slot.instance.as_any_mut());
				slot.render_callbacks.extend(update.callback);
				if !slot.dirty {
					slot.dirty = true;
					self.scheduler.enqueue(update.id);
				}
			}

			let mut batch = self.scheduler.take_batch();
			if batch.is_empty() && !self.scheduler.is_pending() {
				self.scheduler.recycle(batch);
				break;
			}

			batches += 1;
			let span = trace_span!("Rendering batch", batches, len = batch.len());
			let _enter = span.enter();
			while let Some(id) = batch.pop() {
				if self.components.get(id).map_or(false, |slot| slot.dirty) {
					if let Err(error) = self.render_component(id, RenderMode::Async, false) {
						if let Some(slot) = self.components.get_mut(id) {
							slot.dirty = true;
						}
						batch.push(id);
						self.scheduler.requeue(batch);
						return Err(error);
					}
				}
			}
			self.scheduler.recycle(batch);
		}

		if STATIC_MAX_LEVEL >= Level::WARN && batches > 100 {
			warn!("Flushing took {} batches. A component may be updating itself on each render.", batches)
		}
		Ok(())
	}

	/// Renders `component` synchronously, skipping [`Component::should_update`].
	///
	/// # Errors
	///
	/// [`Error::StaleComponent`] if `component` isn't mounted, otherwise any error returned by a render function or lifecycle hook.
	#[instrument(skip(self))]
	pub fn force_update(&mut self, component: ComponentId) -> Result<()> {
		let result = self.check_component(component).and_then(|()| self.render_component(component, RenderMode::Force, false));
		self.finish_operation(result)
	}

	/// Merges into `component`'s state right away and schedules a render pass, like [`Scope::set_state`](`crate::Scope::set_state`).
	///
	/// # Errors
	///
	/// [`Error::StaleComponent`] if `component` isn't a mounted `C`.
	pub fn set_state<C: Component>(&mut self, component: ComponentId, update: impl FnOnce(&mut C::State, &C::Props)) -> Result<()> {
		self.components
			.get_mut(component)
			.and_then(|slot| slot.instance.as_any_mut().downcast_mut::<Instance<C>>())
			.ok_or(Error::StaleComponent(component))?
			.set_state(update);
		self.trigger_component_render(component);
		Ok(())
	}

	/// A `'static` handle for sending state updates to `component`.
	///
	/// # Errors
	///
	/// [`Error::StaleComponent`] if `component` isn't a mounted `C`.
	pub fn link<C: Component>(&self, component: ComponentId) -> Result<Link<C>> {
		self.instance::<C>(component)?;
		Ok(Link::new(component, &self.scheduler))
	}

	fn instance<C: Component>(&self, component: ComponentId) -> Result<&Instance<C>> {
		self.components
			.get(component)
			.and_then(|slot| slot.instance.as_any().downcast_ref::<Instance<C>>())
			.ok_or(Error::StaleComponent(component))
	}

	#[must_use]
	pub fn component<C: Component>(&self, component: ComponentId) -> Option<&C> {
		self.instance::<C>(component).ok().map(Instance::component)
	}

	#[must_use]
	pub fn state<C: Component>(&self, component: ComponentId) -> Option<&C::State> {
		self.instance::<C>(component).ok().map(Instance::state)
	}

	#[must_use]
	pub fn props<C: Component>(&self, component: ComponentId) -> Option<&C::Props> {
		self.instance::<C>(component).ok().map(Instance::props)
	}

	#[must_use]
	pub fn is_dirty(&self, component: ComponentId) -> Option<bool> {
		self.components.get(component).map(|slot| slot.dirty)
	}

	/// The root node currently representing `component`.
	#[must_use]
	pub fn base(&self, component: ComponentId) -> Option<NodeId> {
		self.components.get(component).and_then(|slot| slot.base)
	}

	/// The component `component` delegates its rendering to, if it renders another component directly.
	#[must_use]
	pub fn child_component(&self, component: ComponentId) -> Option<ComponentId> {
		self.components.get(component).and_then(|slot| slot.child)
	}

	/// The outermost component rendering into `node`.
	#[must_use]
	pub fn owner(&self, node: NodeId) -> Option<ComponentId> {
		self.nodes.get(node).and_then(|node| node.component)
	}

	#[must_use]
	pub fn handle(&self, node: NodeId) -> Option<&S::Handle> {
		self.nodes.get(node).map(|node| &node.handle)
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes.get(node).and_then(|node| node.parent)
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		self.nodes.get(node).map_or(&[][..], |node| node.children.as_slice())
	}

	/// The attributes last applied to `node`, which may differ from what the surface reports.
	#[must_use]
	pub fn attributes(&self, node: NodeId) -> Option<&Attributes> {
		self.nodes.get(node).map(|node| &node.attributes)
	}

	#[must_use]
	pub fn contains_node(&self, node: NodeId) -> bool {
		self.nodes.get(node).map_or(false, |node| !node.pooled)
	}

	/// Number of idle element nodes with tag name `name` (case-insensitive).
	#[must_use]
	pub fn pooled_nodes(&self, name: &str) -> usize {
		self.node_pool.count(&name.to_ascii_lowercase())
	}

	#[must_use]
	pub fn pooled_nodes_total(&self) -> usize {
		self.node_pool.total()
	}

	/// Number of idle instances of `C`.
	#[must_use]
	pub fn pooled_components<C: Component>(&self) -> usize {
		self.component_pool.count(TypeId::of::<C>())
	}

	#[must_use]
	pub fn live_components(&self) -> usize {
		self.components.len()
	}

	fn check_node(&self, node: NodeId) -> Result<()> {
		if self.contains_node(node) {
			Ok(())
		} else {
			Err(Error::StaleNode(node))
		}
	}

	fn check_component(&self, component: ComponentId) -> Result<()> {
		if self.components.contains_key(component) {
			Ok(())
		} else {
			Err(Error::StaleComponent(component))
		}
	}

	/// Fires collected element refs on success and drops them otherwise.
	fn finish_operation<T>(&mut self, result: Result<T>) -> Result<T> {
		let refs = mem::take(&mut self.pending_refs);
		if result.is_ok() {
			for (reference, node) in refs {
				if self.contains_node(node) {
					reference.call(Some(RefTarget::Node(node)))
				}
			}
		}
		result
	}

	pub(crate) fn insert_node(&mut self, node: RenderedNode<S::Handle>) -> NodeId {
		self.nodes.insert(node)
	}

	fn detach_mirror(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node].parent.take() {
			self.nodes[parent].children.retain(|&child| child != node)
		}
	}

	/// Inserts `node` before `reference` (or appends it), moving it if it's attached elsewhere.
	pub(crate) fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
		self.detach_mirror(node);
		let nodes = &self.nodes;
		let index = reference.and_then(|reference| nodes[parent].children.iter().position(|&child| child == reference));
		self.surface.insert_before(&nodes[parent].handle, &nodes[node].handle, index.and(reference).map(|reference| &nodes[reference].handle));
		let children = &mut self.nodes[parent].children;
		match index {
			Some(index) => children.insert(index, node),
			None => children.push(node),
		}
		self.nodes[node].parent = Some(parent);
	}

	pub(crate) fn append_child(&mut self, parent: NodeId, node: NodeId) {
		self.detach_mirror(node);
		self.surface.append_child(&self.nodes[parent].handle, &self.nodes[node].handle);
		self.nodes[parent].children.push(node);
		self.nodes[node].parent = Some(parent);
	}

	/// Detaches `node` from its parent, if any.
	pub(crate) fn remove_node(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node].parent {
			self.surface.remove_child(&self.nodes[parent].handle, &self.nodes[node].handle);
			self.detach_mirror(node)
		}
	}

	pub(crate) fn replace_child(&mut self, parent: NodeId, node: NodeId, replaced: NodeId) {
		self.insert_before(parent, node, Some(replaced));
		self.remove_node(replaced)
	}

	/// Resolves functional component references until something else is reached.
	pub(crate) fn resolve_functional(&self, mut vnode: VNode, context: &Context) -> Result<VNode> {
		while let VNodeKind::Functional(functional) = vnode.kind() {
			let span = trace_span!("Rendering functional component", name = functional.name);
			let _enter = span.enter();
			let rendered = (functional.render)(context).map_err(hook_error(functional.name, "render"))?;
			vnode = rendered;
		}
		Ok(vnode)
	}

	/// Morphs `dom` (or a new node) into the shape of `vnode` and returns the result.
	///
	/// With `unmount_children_only`, a replaced `dom` is left alone instead of being recollected.
	#[instrument(skip(self, vnode, context))]
	pub(crate) fn diff(&mut self, dom: Option<NodeId>, vnode: &VNode, context: &Context, mount_all: bool, unmount_children_only: bool) -> Result<NodeId> {
		let key = vnode.key().cloned();
		let reference = vnode.reference().cloned();
		let vnode = self.resolve_functional(vnode.clone(), context)?;
		let dom = dom.filter(|&dom| self.contains_node(dom));

		match vnode.kind() {
			VNodeKind::Nothing => self.diff_text(dom, "", unmount_children_only),
			VNodeKind::Text(text) => self.diff_text(dom, text, unmount_children_only),
			VNodeKind::Stateful(stateful) => self.build_component_from_vnode(dom, &vnode, stateful, context, mount_all),
			VNodeKind::Element(element) => {
				let key = key.or_else(|| vnode.key().cloned());
				let reference = reference.or_else(|| vnode.reference().cloned());

				let svg_mode = self.svg_mode;
				if element.name.eq_ignore_ascii_case("svg") {
					self.svg_mode = true;
				}
				let result = self.diff_element(dom, element, key, reference, context, mount_all, unmount_children_only);
				self.svg_mode = svg_mode;
				result
			}
			VNodeKind::Functional(_) => unreachable!("functional references are resolved above"),
		}
	}

	fn diff_text(&mut self, dom: Option<NodeId>, text: &str, unmount_children_only: bool) -> Result<NodeId> {
		if let Some(dom) = dom {
			if self.nodes[dom].is_text() {
				if !unmount_children_only {
					self.release_owner(dom)?;
				}
				let node = &mut self.nodes[dom];
				if let RenderedKind::Text { value } = &mut node.kind {
					if value != text {
						trace!("Updating text");
						self.surface.set_text(&node.handle, text);
						*value = text.to_owned();
					}
				}
				return Ok(dom);
			}

			if !unmount_children_only {
				self.recollect_node_tree(dom, false)?;
			}
		}

		let handle = self.surface.create_text(text);
		Ok(self.insert_node(RenderedNode::text(handle, text.to_owned())))
	}

	#[allow(clippy::too_many_arguments)]
	fn diff_element(
		&mut self,
		dom: Option<NodeId>,
		element: &ElementNode,
		key: Option<Key>,
		reference: Option<RefCallback>,
		context: &Context,
		mount_all: bool,
		unmount_children_only: bool,
	) -> Result<NodeId> {
		let span = trace_span!("Diffing element", name = &*element.name);
		let _enter = span.enter();

		let out = match dom {
			None => self.create_node(&element.name),
			Some(dom) if !self.nodes[dom].is_named(&element.name) => {
				if STATIC_MAX_LEVEL >= Level::TRACE {
					trace!(previous = ?self.nodes[dom].name(), "Replacing element with a differently named one");
				}
				let out = self.create_node(&element.name);
				for child in self.nodes[dom].children.clone() {
					self.append_child(out, child)
				}
				if !unmount_children_only {
					self.recollect_node_tree(dom, false)?;
				}
				out
			}
			Some(dom) => {
				if !unmount_children_only {
					self.release_owner(dom)?;
				}
				dom
			}
		};

		self.diff_children(out, &element.children, context, mount_all)?;
		self.diff_attributes(out, &element.attributes);

		let node = &mut self.nodes[out];
		node.key = key;
		node.reference = reference.clone();
		if let Some(reference) = reference {
			self.pending_refs.push((reference, out));
		}
		Ok(out)
	}

	/// Takes an idle node from the pool, or creates one.
	fn create_node(&mut self, name: &str) -> NodeId {
		let normalized = name.to_ascii_lowercase();
		if let Some(node) = self.node_pool.take(&normalized) {
			trace!(name = %normalized, "Reusing pooled element");
			self.nodes[node].pooled = false;
			return node;
		}
		let handle = self.surface.create_element(name, self.svg_mode);
		self.insert_node(RenderedNode::element(handle, normalized.into()))
	}

	/// Unmounts a component that still claims `node` while a plain node takes its place.
	fn release_owner(&mut self, node: NodeId) -> Result<()> {
		if let Some(owner) = self.nodes[node].component {
			trace!(?owner, "Releasing node from its previous owner");
			self.unmount_component(owner, false)?;
			let node = &mut self.nodes[node];
			node.component = None;
			node.component_type = None;
		}
		Ok(())
	}

	fn diff_children(&mut self, dom: NodeId, vchildren: &[VNode], context: &Context, mount_all: bool) -> Result<()> {
		let node = &self.nodes[dom];
		if let ([only], [first]) = (vchildren, &*node.children) {
			if let VNodeKind::Text(text) = only.kind() {
				let first = *first;
				let node = &mut self.nodes[first];
				if node.component.is_none() {
					if let RenderedKind::Text { value } = &mut node.kind {
						if **text != **value {
							self.surface.set_text(&node.handle, text);
							*value = text.to_string();
						}
						return Ok(());
					}
				}
			}
		}

		if !vchildren.is_empty() || !self.nodes[dom].children.is_empty() {
			self.inner_diff_node(dom, vchildren, context, mount_all)?;
		}
		Ok(())
	}

	/// The key `node` is matched by: its owning component's, or its own.
	fn key_of(&self, node: NodeId) -> Option<Key> {
		let node = &self.nodes[node];
		match node.component.and_then(|owner| self.components.get(owner)) {
			Some(owner) => owner.key.clone(),
			None => node.key.clone(),
		}
	}

	pub(crate) fn is_same_node_type(&self, node: NodeId, vnode: &VNode) -> bool {
		let node = &self.nodes[node];
		match vnode.kind() {
			VNodeKind::Nothing => false,
			VNodeKind::Text(_) => node.is_text(),
			VNodeKind::Element(element) => node.is_named(&element.name),
			VNodeKind::Stateful(stateful) => node.component_type == Some(stateful.type_id),
			VNodeKind::Functional(_) => true,
		}
	}

	/// Reconciles the children of `dom` with `vchildren`.
	///
	/// Keyed children are matched by key. The others are matched first-fit by type, scanning forward from the first
	/// unclaimed one, so the result is not necessarily the minimal edit.
	#[instrument(skip(self, vchildren, context))]
	fn inner_diff_node(&mut self, dom: NodeId, vchildren: &[VNode], context: &Context, mount_all: bool) -> Result<()> {
		let original = self.nodes[dom].children.clone();

		let mut keyed: Vec<(Key, Option<NodeId>)> = Vec::new();
		let mut keyed_index = HashMap::<Key, usize>::new();
		let mut keyed_len = 0_usize;
		let mut displaced = Vec::new();
		let mut children = Vec::with_capacity(original.len());
		for &child in &original {
			match self.key_of(child) {
				Some(key) => match keyed_index.get(&key) {
					Some(&index) => {
						if STATIC_MAX_LEVEL >= Level::WARN {
							warn!(?key, "Duplicate key among existing children. The later one wins.")
						}
						displaced.extend(keyed[index].1.replace(child));
					}
					None => {
						keyed_index.insert(key.clone(), keyed.len());
						keyed.push((key, Some(child)));
						keyed_len += 1;
					}
				},
				None => children.push(Some(child)),
			}
		}

		let mut children_len = children.len();
		let mut min = 0;
		let mut position = 0;
		for vchild in vchildren.iter().filter(|vchild| !vchild.is_nothing()) {
			let mut child = None;

			if keyed_len > 0 {
				if let Some(&index) = vchild.key().and_then(|key| keyed_index.get(key)) {
					if let Some(claimed) = keyed[index].1.take() {
						child = Some(claimed);
						keyed_len -= 1;
					}
				}
			}

			if child.is_none() && min < children_len {
				for j in min..children_len {
					if let Some(candidate) = children[j] {
						if self.is_same_node_type(candidate, vchild) {
							child = children[j].take();
							if j == children_len - 1 {
								children_len -= 1;
							}
							if j == min {
								min += 1;
							}
							break;
						}
					}
				}
			}

			let child = self.diff(child, vchild, context, mount_all, false)?;

			let mounting = if mount_all || self.nodes[child].parent != Some(dom) { self.nodes[child].component } else { None };
			if let Some(component) = mounting {
				self.deep_hook(component, Hook::WillMount)?;
			}

			let next = self.nodes[dom].children.get(position).copied();
			if next != Some(child) {
				match next {
					Some(next) => self.insert_before(dom, child, Some(next)),
					None => self.append_child(dom, child),
				}
			}

			if let Some(component) = mounting {
				self.deep_hook(component, Hook::DidMount)?;
			}
			position += 1;
		}

		let orphans: Vec<NodeId> = children.into_iter().flatten().chain(keyed.into_iter().filter_map(|(_, node)| node)).chain(displaced).collect();
		if !orphans.is_empty() {
			trace!(count = orphans.len(), "Removing orphaned children");
		}
		for orphan in orphans.into_iter().rev() {
			self.recollect_node_tree(orphan, false)?;
		}
		Ok(())
	}

	/// Tears down `node` and its subtree.
	///
	/// With `unmount_only`, components are unmounted but nodes stay where they are.
	pub(crate) fn recollect_node_tree(&mut self, node: NodeId, unmount_only: bool) -> Result<()> {
		let rendered = match self.nodes.get_mut(node) {
			Some(rendered) if !rendered.pooled => rendered,
			_ => return Ok(()),
		};

		if let Some(reference) = rendered.reference.take() {
			reference.call(None)
		}

		match rendered.component.filter(|&owner| self.components.contains_key(owner)) {
			Some(owner) => self.unmount_component(owner, !unmount_only),
			None => {
				if !unmount_only {
					if self.nodes[node].is_text() {
						self.remove_node(node);
						self.nodes.remove(node);
						return Ok(());
					}
					self.collect_node(node);
				}

				for child in self.nodes[node].children.clone().into_iter().rev() {
					self.recollect_node_tree(child, unmount_only)?;
				}
				Ok(())
			}
		}
	}

	/// Detaches an element node, resets it completely and puts it into the pool.
	fn collect_node(&mut self, node: NodeId) {
		self.remove_node(node);

		let rendered = &mut self.nodes[node];
		let name = match &rendered.kind {
			RenderedKind::Element { name } => name.clone(),
			RenderedKind::Text { .. } => return,
		};

		for event in rendered.dispatcher.events() {
			rendered.dispatcher.unbind(&event);
			self.surface.remove_event_listener(&rendered.handle, &event, &rendered.dispatcher);
		}
		for (attribute, value) in rendered.attributes.iter() {
			if value.to_attribute_string().is_some() {
				if let Err(error) = self.surface.remove_attribute(&rendered.handle, attribute) {
					warn!("Could not remove attribute {:?} from pooled <{}>: {:?}", attribute, name, error)
				}
			}
		}
		rendered.attributes.clear();
		rendered.component = None;
		rendered.component_type = None;
		rendered.key = None;
		rendered.reference = None;
		rendered.pooled = true;

		trace!(name = &*name, "Pooling element");
		self.node_pool.put(name, node)
	}
}

impl<S: Surface> Debug for Reconciler<S>
where
	S: Debug,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reconciler")
			.field("surface", &self.surface)
			.field("nodes", &self.nodes.len())
			.field("components", &self.components.len())
			.field("node_pool", &self.node_pool)
			.field("scheduler", &self.scheduler)
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
