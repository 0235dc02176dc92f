//! Mounting, updating and unmounting components.

use crate::{
	arena::{ComponentId, NodeId},
	component::{AnyInstance, HookCx},
	context::Context,
	diff::Reconciler,
	error::{hook_error, Error, Result},
	surface::Surface,
	vnode::{Key, RefCallback, RefTarget, StatefulNode, VNode, VNodeKind},
};
use core::mem;
use std::rc::Rc;
use tracing::{instrument, trace, trace_span};

/// Bookkeeping of one mounted component.
pub(crate) struct ComponentSlot {
	pub instance: Box<dyn AnyInstance>,
	pub dirty: bool,
	pub disable_rendering: bool,
	pub base: Option<NodeId>,
	/// A node to render into on first render, instead of creating one.
	pub next_base: Option<NodeId>,
	/// The component that renders this one directly.
	pub parent: Option<ComponentId>,
	/// The component this one renders directly.
	pub child: Option<ComponentId>,
	pub key: Option<Key>,
	pub reference: Option<RefCallback>,
	pub context: Context,
	pub previous_context: Option<Context>,
	pub render_callbacks: Vec<Box<dyn FnOnce()>>,
}

impl ComponentSlot {
	fn new(instance: Box<dyn AnyInstance>, context: Context) -> Self {
		Self {
			instance,
			dirty: true,
			disable_rendering: false,
			base: None,
			next_base: None,
			parent: None,
			child: None,
			key: None,
			reference: None,
			context,
			previous_context: None,
			render_callbacks: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderMode {
	/// Only apply props.
	No,
	/// Render right away.
	Sync,
	/// Render right away, skipping [`Component::should_update`](`crate::Component::should_update`).
	Force,
	/// Mark dirty and leave rendering to the next flush.
	/// When flushing, renders without diffing if there is neither a current nor a next base.
	Async,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Hook {
	WillMount,
	DidMount,
}

impl<S: Surface> Reconciler<S> {
	fn slot_mut(&mut self, component: ComponentId) -> Result<&mut ComponentSlot> {
		self.components.get_mut(component).ok_or(Error::StaleComponent(component))
	}

	/// Runs `f` against `component`'s instance and the parts of its bookkeeping hooks may touch.
	fn with_hook_cx<R>(&mut self, component: ComponentId, f: impl FnOnce(&mut dyn AnyInstance, &mut HookCx<'_>) -> R) -> Result<R> {
		let scheduler = &self.scheduler;
		let ComponentSlot {
			instance,
			dirty,
			render_callbacks,
			context,
			..
		} = self.components.get_mut(component).ok_or(Error::StaleComponent(component))?;
		let mut cx = HookCx {
			id: component,
			context,
			dirty,
			callbacks: render_callbacks,
			scheduler,
		};
		Ok(f(&mut **instance, &mut cx))
	}

	fn name_of(&self, component: ComponentId) -> &'static str {
		self.components.get(component).map_or("<unmounted>", |slot| slot.instance.name())
	}

	/// The last component up the chain of direct parents, which is what owns rendered nodes.
	fn outermost(&self, mut component: ComponentId) -> ComponentId {
		while let Some(parent) = self.components.get(component).and_then(|slot| slot.parent) {
			component = parent;
		}
		component
	}

	/// Runs a mount hook on `component` and every component it renders directly, outermost first.
	pub(crate) fn deep_hook(&mut self, component: ComponentId, hook: Hook) -> Result<()> {
		let mut current = Some(component);
		while let Some(component) = current {
			let name = self.name_of(component);
			match hook {
				Hook::WillMount => self.with_hook_cx(component, |instance, cx| instance.will_mount(cx))?.map_err(hook_error(name, "will_mount"))?,
				Hook::DidMount => self.with_hook_cx(component, |instance, cx| instance.did_mount(cx))?.map_err(hook_error(name, "did_mount"))?,
			}
			current = self.components.get(component).and_then(|slot| slot.child);
		}
		Ok(())
	}

	/// Marks `component` dirty and queues it, unless it's dirty already.
	pub(crate) fn trigger_component_render(&mut self, component: ComponentId) {
		if let Some(slot) = self.components.get_mut(component) {
			if !slot.dirty {
				slot.dirty = true;
				self.scheduler.enqueue(component)
			}
		}
	}

	/// Applies new props, key, ref and context to `component`, then renders it according to `mode`.
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn set_component_props(
		&mut self,
		component: ComponentId,
		vnode: &VNode,
		stateful: &StatefulNode,
		mode: RenderMode,
		context: &Context,
		mount_all: bool,
	) -> Result<()> {
		let name = stateful.name;
		let slot = self.slot_mut(component)?;
		let disabled = mem::replace(&mut slot.disable_rendering, true);
		slot.key = vnode.key().cloned();
		slot.reference = vnode.reference().cloned();

		let received = if slot.base.is_some() {
			self.with_hook_cx(component, |instance, cx| instance.will_receive_props(cx, &stateful.props, context))?
				.map_err(hook_error(name, "will_receive_props"))
		} else {
			Ok(())
		};

		let slot = self.slot_mut(component)?;
		if !slot.context.ptr_eq(context) {
			let previous = mem::replace(&mut slot.context, context.clone());
			slot.previous_context.get_or_insert(previous);
		}
		slot.instance.set_props(Rc::clone(&stateful.props));
		slot.disable_rendering = disabled;
		received?;

		match mode {
			RenderMode::No => (),
			RenderMode::Async => self.trigger_component_render(component),
			RenderMode::Sync | RenderMode::Force => self.render_component(component, mode, mount_all)?,
		}

		if let Some(reference) = self.components.get(component).and_then(|slot| slot.reference.clone()) {
			reference.call(Some(RefTarget::Component(component)))
		}
		Ok(())
	}

	/// Renders `component` and commits the result, taking components that render components into account.
	#[allow(clippy::too_many_lines)]
	#[instrument(skip(self))]
	pub(crate) fn render_component(&mut self, component: ComponentId, mode: RenderMode, mount_all: bool) -> Result<()> {
		let slot = self.slot_mut(component)?;
		if slot.disable_rendering {
			return Ok(());
		}

		let name = slot.instance.name();
		let is_update = slot.base.is_some();
		let initial_base = slot.base.or(slot.next_base).filter(|&base| self.contains_node(base));
		let initial_owner = initial_base.and_then(|base| self.nodes[base].component);
		let slot = self.slot_mut(component)?;
		let context = slot.context.clone();
		let previous_context = slot.previous_context.take().unwrap_or_else(|| context.clone());

		let mut skip = false;
		if is_update {
			if mode != RenderMode::Force && !slot.instance.should_update(&previous_context, &context) {
				trace!("Skipping render");
				skip = true;
			} else {
				slot.instance.will_update(&previous_context, &context).map_err(hook_error(name, "will_update"))?;
			}
		}

		let previous = slot.instance.take_previous();
		slot.next_base = None;
		slot.dirty = false;

		if !skip {
			let rendered = {
				let span = trace_span!("Rendering component", name);
				let _enter = span.enter();
				self.with_hook_cx(component, |instance, cx| instance.render(cx))?.map_err(hook_error(name, "render"))?
			};

			let slot = self.slot_mut(component)?;
			let context = match slot.instance.child_context(&context) {
				Some(contribution) => context.extend(&contribution),
				None => context.clone(),
			};
			let rendered = self.resolve_functional(rendered, &context)?;

			let mut to_unmount = None;
			let base = if let VNodeKind::Stateful(stateful) = rendered.kind() {
				let existing = self.slot_mut(component)?.child;
				let inner = match existing.filter(|&child| self.components.get(child).map_or(false, |slot| slot.instance.component_type() == stateful.type_id)) {
					Some(inner) => {
						self.set_component_props(inner, &rendered, stateful, RenderMode::Sync, &context, false)?;
						inner
					}
					None => {
						to_unmount = existing;
						let inner = self.create_component(stateful, &context, false);
						self.components[inner].parent = Some(component);
						self.slot_mut(component)?.child = Some(inner);
						if is_update {
							self.deep_hook(inner, Hook::WillMount)?;
						}
						self.set_component_props(inner, &rendered, stateful, RenderMode::No, &context, false)?;
						self.render_component(inner, RenderMode::Sync, false)?;
						if is_update {
							self.deep_hook(inner, Hook::DidMount)?;
						}
						inner
					}
				};
				self.slot_mut(inner)?.base
			} else {
				let mut cbase = initial_base;
				to_unmount = self.slot_mut(component)?.child.take();
				if to_unmount.is_some() {
					cbase = None;
				}

				if initial_base.is_some() || mode == RenderMode::Sync {
					if let Some(cbase) = cbase {
						let node = &mut self.nodes[cbase];
						node.component = None;
						node.component_type = None;
					}
					Some(self.diff(cbase, &rendered, &context, mount_all || !is_update, true)?)
				} else {
					None
				}
			};

			if let Some(initial_base) = initial_base.filter(|&initial_base| base != Some(initial_base) && self.contains_node(initial_base)) {
				if let (Some(parent), Some(base)) = (self.nodes[initial_base].parent, base) {
					if parent != base {
						self.replace_child(parent, base, initial_base)
					}
				}
				if to_unmount.is_none() && initial_owner == Some(self.outermost(component)) {
					let node = &mut self.nodes[initial_base];
					node.component = None;
					node.component_type = None;
					self.recollect_node_tree(initial_base, false)?;
				}
			}

			if let Some(to_unmount) = to_unmount {
				self.unmount_component(to_unmount, true)?;
			}

			self.slot_mut(component)?.base = base;
			if let Some(base) = base {
				let owner = self.outermost(component);
				let owner_type = self.components[owner].instance.component_type();
				let node = &mut self.nodes[base];
				node.component = Some(owner);
				node.component_type = Some(owner_type);
			}

			if is_update {
				self.with_hook_cx(component, |instance, cx| instance.did_update(cx, previous, &previous_context))?
					.map_err(hook_error(name, "did_update"))?;
			}
		}

		let callbacks = mem::take(&mut self.slot_mut(component)?.render_callbacks);
		for callback in callbacks.into_iter().rev() {
			callback()
		}
		Ok(())
	}

	/// Applies a component reference to `dom`, updating the component that owns it if the types match.
	#[instrument(skip(self, vnode, stateful, context), fields(name = stateful.name))]
	pub(crate) fn build_component_from_vnode(&mut self, dom: Option<NodeId>, vnode: &VNode, stateful: &StatefulNode, context: &Context, mount_all: bool) -> Result<NodeId> {
		let owner = dom.and_then(|dom| self.nodes[dom].component).filter(|&owner| self.components.contains_key(owner));
		let is_owner = owner.is_some() && dom.and_then(|dom| self.nodes[dom].component_type) == Some(stateful.type_id);

		if let Some(owner) = owner {
			if is_owner && (!mount_all || self.components[owner].child.is_some()) {
				let mode = if self.options.synchronous_updates { RenderMode::Sync } else { RenderMode::Async };
				self.set_component_props(owner, vnode, stateful, mode, context, mount_all)?;
				return self.slot_mut(owner)?.base.ok_or(Error::NoBase { component: stateful.name });
			}
		}

		let mut dom = dom;
		let mut old_dom = dom;
		if let Some(owner) = owner {
			if is_owner {
				// Same type, but being remounted.
				self.unmount_component(owner, false)?;
				if let Some(dom) = dom {
					let node = &mut self.nodes[dom];
					node.component = None;
					node.component_type = None;
				}
			} else {
				self.unmount_component(owner, true)?;
				dom = None;
				old_dom = None;
			}
		}

		let dom = self.create_component_from_vnode(vnode, stateful, dom, context, mount_all)?;
		if let Some(old_dom) = old_dom.filter(|&old_dom| old_dom != dom && self.contains_node(old_dom)) {
			let node = &mut self.nodes[old_dom];
			node.component = None;
			node.component_type = None;
			self.recollect_node_tree(old_dom, false)?;
		}
		Ok(dom)
	}

	fn create_component_from_vnode(&mut self, vnode: &VNode, stateful: &StatefulNode, dom: Option<NodeId>, context: &Context, mount_all: bool) -> Result<NodeId> {
		let component = self.create_component(stateful, context, dom.is_some());
		self.components[component].next_base = dom;
		self.set_component_props(component, vnode, stateful, RenderMode::Sync, context, mount_all)?;
		self.slot_mut(component)?.base.ok_or(Error::NoBase { component: stateful.name })
	}

	/// Instantiates a component, reusing a pooled instance unless `fresh`.
	fn create_component(&mut self, stateful: &StatefulNode, context: &Context, fresh: bool) -> ComponentId {
		let pooled = if fresh { None } else { self.component_pool.take(stateful.type_id) };
		let instance = match pooled {
			Some(mut instance) => {
				trace!(name = stateful.name, "Reusing pooled component instance");
				instance.reinitialize(Rc::clone(&stateful.props), context);
				instance
			}
			None => (stateful.instantiate)(Rc::clone(&stateful.props), context),
		};
		self.components.insert(ComponentSlot::new(instance, context.clone()))
	}

	/// Tears down `component`, and the component it renders first.
	///
	/// With `remove`, its base node is recollected. Otherwise it stays in place and only components below it are unmounted.
	/// The instance always ends up in the pool.
	#[instrument(skip(self))]
	pub(crate) fn unmount_component(&mut self, component: ComponentId, remove: bool) -> Result<()> {
		let name = self.name_of(component);
		if let Some(reference) = self.slot_mut(component)?.reference.take() {
			reference.call(None)
		}
		self.with_hook_cx(component, |instance, cx| instance.will_unmount(cx))?.map_err(hook_error(name, "will_unmount"))?;

		let base = self.slot_mut(component)?.base.filter(|&base| self.contains_node(base));
		match self.slot_mut(component)?.child {
			// The inner component shares the base and takes care of it.
			Some(inner) => self.unmount_component(inner, remove)?,
			None => {
				if let Some(base) = base {
					if remove {
						let node = &mut self.nodes[base];
						node.component = None;
						node.component_type = None;
						self.recollect_node_tree(base, false)?;
					} else {
						for child in self.nodes[base].children.clone().into_iter().rev() {
							self.recollect_node_tree(child, true)?;
						}
					}
				}
			}
		}

		if let Some(base) = base {
			if let Some(node) = self.nodes.get_mut(base) {
				if node.component == Some(component) {
					node.component = None;
					node.component_type = None;
				}
			}
		}

		let slot = self.components.remove(component).ok_or(Error::StaleComponent(component))?;
		if let Some(parent) = slot.parent.and_then(|parent| self.components.get_mut(parent)) {
			if parent.child == Some(component) {
				parent.child = None;
			}
		}

		let mut instance = slot.instance;
		let unmounted = instance.did_unmount();
		instance.clear_previous();
		self.component_pool.put(instance);
		unmounted.map_err(hook_error(name, "did_unmount"))
	}
}
