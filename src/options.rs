//! Configuration.

use crate::vnode::VNode;
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;

/// Called whenever a render pass becomes necessary after the last flush.
/// It should (eventually) cause [`Reconciler::flush_pending_renders`](`crate::Reconciler::flush_pending_renders`) to be called.
pub type BatchingHook = Rc<dyn Fn()>;

/// Called for every constructed [`VNode`].
pub type VNodeObserver = Rc<dyn Fn(&VNode)>;

#[derive(Clone)]
pub struct Options {
	/// Whether prop changes re-render components synchronously. Defaults to `true`.
	///
	/// When `false`, prop changes only mark the component dirty and a later flush renders it.
	pub synchronous_updates: bool,
	/// Replaces the default deferral (which is to wait for the host to flush).
	pub render_batching_hook: Option<BatchingHook>,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			synchronous_updates: true,
			render_batching_hook: None,
		}
	}
}

impl Debug for Options {
	#[allow(clippy::non_ascii_literal)]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Options")
			.field("synchronous_updates", &self.synchronous_updates)
			.field("render_batching_hook", &self.render_batching_hook.as_ref().map(|_| "…"))
			.finish()
	}
}

thread_local! {
	static VNODE_OBSERVER: RefCell<Option<VNodeObserver>> = RefCell::new(None);
}

/// Installs (or with [`None`] removes) the observer for virtual node construction on this thread.
/// Returns the previous observer.
pub fn set_vnode_observer(observer: Option<VNodeObserver>) -> Option<VNodeObserver> {
	VNODE_OBSERVER.with(|slot| slot.replace(observer))
}

pub(crate) fn observe(vnode: &VNode) {
	// Cloned out so that the observer may construct nodes itself.
	if let Some(observer) = VNODE_OBSERVER.with(|slot| slot.borrow().clone()) {
		observer(vnode)
	}
}
