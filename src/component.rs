//! Stateful components.
//!
//! A [`Component`] is instantiated when a [`VNode::component`] reference has no matching instance at its position,
//! and is driven through its lifecycle by the [`Reconciler`](`crate::Reconciler`):
//!
//! ```text
//! unmounted → mounting → mounted(clean) ⇄ mounted(dirty) → updating → mounted(clean) … → unmounting → unmounted(recycled)
//! ```
//!
//! All hooks are optional. Errors returned from them are not caught anywhere and abort the current reconciliation pass.

use crate::{arena::ComponentId, context::Context, scheduler::Scheduler, vnode::VNode};
use core::{
	any::{type_name, Any, TypeId},
	marker::PhantomData,
};
use std::rc::Rc;

pub trait Component: Sized + 'static {
	type Props: 'static;
	/// Cloned once per update cycle to provide the previous state to [`did_update`](`Component::did_update`).
	type State: Clone + Default + 'static;

	fn create(props: &Self::Props, context: &Context) -> Self;

	/// Falls back to [`Default`].
	fn initial_state(&self, _props: &Self::Props) -> Self::State {
		Self::State::default()
	}

	fn render(&self, scope: &Scope<'_, Self>) -> anyhow::Result<VNode>;

	/// Values merged into the context of everything this component renders.
	fn child_context(&self, _current: Snapshot<'_, Self>) -> Option<Context> {
		None
	}

	/// Returning `false` skips [`render`](`Component::render`) and [`did_update`](`Component::did_update`) for this update.
	/// Not consulted on mount or [`force_update`](`crate::Reconciler::force_update`).
	fn should_update(&self, _current: Snapshot<'_, Self>, _next: Snapshot<'_, Self>) -> bool {
		true
	}

	/// Runs on updates only, before `props` and `context` are replaced.
	fn will_receive_props(&mut self, _scope: &mut Scope<'_, Self>, _next_props: &Self::Props, _next_context: &Context) -> anyhow::Result<()> {
		Ok(())
	}

	fn will_mount(&mut self, _scope: &mut Scope<'_, Self>) -> anyhow::Result<()> {
		Ok(())
	}

	fn did_mount(&mut self, _scope: &mut Scope<'_, Self>) -> anyhow::Result<()> {
		Ok(())
	}

	fn will_update(&mut self, _current: Snapshot<'_, Self>, _next: Snapshot<'_, Self>) -> anyhow::Result<()> {
		Ok(())
	}

	fn did_update(&mut self, _scope: &mut Scope<'_, Self>, _previous: Snapshot<'_, Self>) -> anyhow::Result<()> {
		Ok(())
	}

	fn will_unmount(&mut self, _scope: &mut Scope<'_, Self>) -> anyhow::Result<()> {
		Ok(())
	}

	fn did_unmount(&mut self) -> anyhow::Result<()> {
		Ok(())
	}
}

/// A read-only view of a component's inputs at one point of an update cycle.
pub struct Snapshot<'a, C: Component> {
	pub props: &'a C::Props,
	pub state: &'a C::State,
	pub context: &'a Context,
}

impl<'a, C: Component> Clone for Snapshot<'a, C> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<'a, C: Component> Copy for Snapshot<'a, C> {}

/// A component's view of itself inside a hook or render.
pub struct Scope<'a, C: Component> {
	id: ComponentId,
	props: &'a Rc<C::Props>,
	state: &'a mut C::State,
	previous_state: &'a mut Option<C::State>,
	context: &'a Context,
	dirty: &'a mut bool,
	callbacks: &'a mut Vec<Box<dyn FnOnce()>>,
	scheduler: &'a Scheduler,
}

impl<'a, C: Component> Scope<'a, C> {
	#[must_use]
	pub fn id(&self) -> ComponentId {
		self.id
	}

	#[must_use]
	pub fn props(&self) -> &C::Props {
		self.props
	}

	#[must_use]
	pub fn state(&self) -> &C::State {
		self.state
	}

	#[must_use]
	pub fn context(&self) -> &Context {
		self.context
	}

	#[must_use]
	pub fn snapshot(&self) -> Snapshot<'_, C> {
		Snapshot {
			props: self.props,
			state: self.state,
			context: self.context,
		}
	}

	/// A `'static` handle for updating this component from event handlers.
	#[must_use]
	pub fn link(&self) -> Link<C> {
		Link::new(self.id, self.scheduler)
	}

	/// Merges into the current state right away and schedules a render pass.
	/// Never renders synchronously.
	pub fn set_state(&mut self, update: impl FnOnce(&mut C::State, &C::Props)) {
		merge_state::<C, _>(self.state, self.previous_state, self.props, update);
		if !*self.dirty {
			*self.dirty = true;
			self.scheduler.enqueue(self.id);
		}
	}

	/// Like [`set_state`](`Scope::set_state`), and runs `callback` after the next render pass of this component.
	pub fn set_state_then(&mut self, update: impl FnOnce(&mut C::State, &C::Props), callback: impl FnOnce() + 'static) {
		self.callbacks.push(Box::new(callback));
		self.set_state(update)
	}
}

fn merge_state<C, F>(state: &mut C::State, previous_state: &mut Option<C::State>, props: &C::Props, update: F)
where
	C: Component,
	F: FnOnce(&mut C::State, &C::Props),
{
	if previous_state.is_none() {
		*previous_state = Some(state.clone());
	}
	update(state, props)
}

/// A cloneable, `'static` handle to a mounted component.
///
/// Updates sent through a [`Link`] are applied when the [`Reconciler`](`crate::Reconciler`) next flushes,
/// all of them before the single render pass they cause.
pub struct Link<C: Component> {
	id: ComponentId,
	scheduler: Scheduler,
	_component: PhantomData<fn() -> C>,
}

impl<C: Component> Clone for Link<C> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			scheduler: self.scheduler.clone(),
			_component: PhantomData,
		}
	}
}

impl<C: Component> Link<C> {
	pub(crate) fn new(id: ComponentId, scheduler: &Scheduler) -> Self {
		Self {
			id,
			scheduler: scheduler.clone(),
			_component: PhantomData,
		}
	}

	#[must_use]
	pub fn id(&self) -> ComponentId {
		self.id
	}

	pub fn set_state(&self, update: impl FnOnce(&mut C::State, &C::Props) + 'static) {
		self.scheduler.defer(
			self.id,
			Box::new(move |instance: &mut dyn Any| {
				if let Some(instance) = instance.downcast_mut::<Instance<C>>() {
					instance.set_state(update)
				}
			}),
			None,
		)
	}

	pub fn set_state_then(&self, update: impl FnOnce(&mut C::State, &C::Props) + 'static, callback: impl FnOnce() + 'static) {
		self.scheduler.defer(
			self.id,
			Box::new(move |instance: &mut dyn Any| {
				if let Some(instance) = instance.downcast_mut::<Instance<C>>() {
					instance.set_state(update)
				}
			}),
			Some(Box::new(callback) as Box<dyn FnOnce()>),
		)
	}
}

/// The untyped parts of a component's bookkeeping that hooks can touch.
pub(crate) struct HookCx<'a> {
	pub id: ComponentId,
	pub context: &'a Context,
	pub dirty: &'a mut bool,
	pub callbacks: &'a mut Vec<Box<dyn FnOnce()>>,
	pub scheduler: &'a Scheduler,
}

/// Object-safe face of [`Instance`], as stored in the component arena and pool.
pub(crate) trait AnyInstance {
	fn component_type(&self) -> TypeId;
	fn name(&self) -> &'static str;
	fn as_any_mut(&mut self) -> &mut dyn Any;
	fn as_any(&self) -> &dyn Any;

	/// Reinitialises a pooled instance completely.
	fn reinitialize(&mut self, props: Rc<dyn Any>, context: &Context);
	/// Replaces `props`, keeping the first replaced value as previous props for this cycle.
	fn set_props(&mut self, props: Rc<dyn Any>);
	fn clear_previous(&mut self);
	/// Takes the previous props and state of this cycle, defaulting to the current ones.
	fn take_previous(&mut self) -> Box<dyn Any>;

	fn will_receive_props(&mut self, cx: &mut HookCx<'_>, props: &Rc<dyn Any>, next_context: &Context) -> anyhow::Result<()>;
	fn should_update(&self, previous_context: &Context, context: &Context) -> bool;
	fn will_update(&mut self, previous_context: &Context, context: &Context) -> anyhow::Result<()>;
	fn render(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<VNode>;
	fn child_context(&self, context: &Context) -> Option<Context>;
	fn did_update(&mut self, cx: &mut HookCx<'_>, previous: Box<dyn Any>, previous_context: &Context) -> anyhow::Result<()>;
	fn will_mount(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<()>;
	fn did_mount(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<()>;
	fn will_unmount(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<()>;
	fn did_unmount(&mut self) -> anyhow::Result<()>;
}

pub(crate) struct Instance<C: Component> {
	component: C,
	props: Rc<C::Props>,
	previous_props: Option<Rc<C::Props>>,
	state: C::State,
	previous_state: Option<C::State>,
}

impl<C: Component> Instance<C> {
	fn new(props: Rc<C::Props>, context: &Context) -> Self {
		let component = C::create(&props, context);
		let state = component.initial_state(&props);
		Self {
			component,
			props,
			previous_props: None,
			state,
			previous_state: None,
		}
	}

	pub(crate) fn component(&self) -> &C {
		&self.component
	}

	pub(crate) fn props(&self) -> &C::Props {
		&self.props
	}

	pub(crate) fn state(&self) -> &C::State {
		&self.state
	}

	pub(crate) fn set_state(&mut self, update: impl FnOnce(&mut C::State, &C::Props)) {
		merge_state::<C, _>(&mut self.state, &mut self.previous_state, &self.props, update)
	}

	fn scope<'a>(&'a mut self, cx: &'a mut HookCx<'_>) -> (&'a mut C, Scope<'a, C>) {
		(
			&mut self.component,
			Scope {
				id: cx.id,
				props: &self.props,
				state: &mut self.state,
				previous_state: &mut self.previous_state,
				context: cx.context,
				dirty: &mut *cx.dirty,
				callbacks: &mut *cx.callbacks,
				scheduler: cx.scheduler,
			},
		)
	}
}

fn downcast_props<C: Component>(props: Rc<dyn Any>) -> Rc<C::Props> {
	match props.downcast::<C::Props>() {
		Ok(props) => props,
		Err(_) => unreachable!("props of `{}` built for a different component type", type_name::<C>()),
	}
}

pub(crate) fn instantiate<C: Component>(props: Rc<dyn Any>, context: &Context) -> Box<dyn AnyInstance> {
	Box::new(Instance::<C>::new(downcast_props::<C>(props), context))
}

impl<C: Component> AnyInstance for Instance<C> {
	fn component_type(&self) -> TypeId {
		TypeId::of::<C>()
	}

	fn name(&self) -> &'static str {
		type_name::<C>()
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn reinitialize(&mut self, props: Rc<dyn Any>, context: &Context) {
		*self = Self::new(downcast_props::<C>(props), context)
	}

	fn set_props(&mut self, props: Rc<dyn Any>) {
		let props = downcast_props::<C>(props);
		let previous = core::mem::replace(&mut self.props, props);
		self.previous_props.get_or_insert(previous);
	}

	fn clear_previous(&mut self) {
		self.previous_props = None;
		self.previous_state = None;
	}

	fn take_previous(&mut self) -> Box<dyn Any> {
		let props = self.previous_props.take().unwrap_or_else(|| Rc::clone(&self.props));
		let state = self.previous_state.take().unwrap_or_else(|| self.state.clone());
		Box::new((props, state))
	}

	fn will_receive_props(&mut self, cx: &mut HookCx<'_>, props: &Rc<dyn Any>, next_context: &Context) -> anyhow::Result<()> {
		let next_props = downcast_props::<C>(Rc::clone(props));
		let (component, mut scope) = self.scope(cx);
		component.will_receive_props(&mut scope, &next_props, next_context)
	}

	fn should_update(&self, previous_context: &Context, context: &Context) -> bool {
		let current = Snapshot {
			props: self.previous_props.as_deref().unwrap_or(&self.props),
			state: self.previous_state.as_ref().unwrap_or(&self.state),
			context: previous_context,
		};
		let next = Snapshot {
			props: &*self.props,
			state: &self.state,
			context,
		};
		self.component.should_update(current, next)
	}

	fn will_update(&mut self, previous_context: &Context, context: &Context) -> anyhow::Result<()> {
		let current = Snapshot {
			props: self.previous_props.as_deref().unwrap_or(&self.props),
			state: self.previous_state.as_ref().unwrap_or(&self.state),
			context: previous_context,
		};
		let next = Snapshot {
			props: &*self.props,
			state: &self.state,
			context,
		};
		self.component.will_update(current, next)
	}

	fn render(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<VNode> {
		let (component, scope) = self.scope(cx);
		component.render(&scope)
	}

	fn child_context(&self, context: &Context) -> Option<Context> {
		self.component.child_context(Snapshot {
			props: &self.props,
			state: &self.state,
			context,
		})
	}

	fn did_update(&mut self, cx: &mut HookCx<'_>, previous: Box<dyn Any>, previous_context: &Context) -> anyhow::Result<()> {
		let (previous_props, previous_state) = match previous.downcast::<(Rc<C::Props>, C::State)>() {
			Ok(previous) => *previous,
			Err(_) => unreachable!("previous snapshot of `{}` has a different type", type_name::<C>()),
		};
		let (component, mut scope) = self.scope(cx);
		component.did_update(
			&mut scope,
			Snapshot {
				props: &previous_props,
				state: &previous_state,
				context: previous_context,
			},
		)
	}

	fn will_mount(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<()> {
		let (component, mut scope) = self.scope(cx);
		component.will_mount(&mut scope)
	}

	fn did_mount(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<()> {
		let (component, mut scope) = self.scope(cx);
		component.did_mount(&mut scope)
	}

	fn will_unmount(&mut self, cx: &mut HookCx<'_>) -> anyhow::Result<()> {
		let (component, mut scope) = self.scope(cx);
		component.will_unmount(&mut scope)
	}

	fn did_unmount(&mut self) -> anyhow::Result<()> {
		self.component.did_unmount()
	}
}
