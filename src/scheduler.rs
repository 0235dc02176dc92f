//! The dirty queue.
//!
//! Components are queued at most once per dirty period. That is enforced by the dirty flag kept by the
//! [`Reconciler`](`crate::Reconciler`), not by the queue itself.

use crate::{arena::ComponentId, options::BatchingHook};
use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	mem,
};
use std::rc::Rc;
use tracing::trace;

/// A state update sent through a [`Link`](`crate::component::Link`), applied at the start of the next flush.
pub(crate) struct PendingUpdate {
	pub id: ComponentId,
	pub apply: Box<dyn FnOnce(&mut dyn Any)>,
	pub callback: Option<Box<dyn FnOnce()>>,
}

#[derive(Default)]
struct Queue {
	items: Vec<ComponentId>,
	offline: Vec<ComponentId>,
	updates: Vec<PendingUpdate>,
	hook: Option<BatchingHook>,
	/// Whether the batching hook was called since the last flush.
	scheduled: bool,
}

/// Shared handle to the dirty queue.
#[derive(Clone, Default)]
pub(crate) struct Scheduler(Rc<RefCell<Queue>>);

impl Scheduler {
	pub fn new(hook: Option<BatchingHook>) -> Self {
		let scheduler = Self::default();
		scheduler.set_hook(hook);
		scheduler
	}

	pub fn set_hook(&self, hook: Option<BatchingHook>) {
		self.0.borrow_mut().hook = hook
	}

	pub fn enqueue(&self, id: ComponentId) {
		trace!(?id, "Enqueueing render");
		self.0.borrow_mut().items.push(id);
		self.notify()
	}

	pub fn defer(&self, id: ComponentId, apply: Box<dyn FnOnce(&mut dyn Any)>, callback: Option<Box<dyn FnOnce()>>) {
		trace!(?id, "Deferring state update");
		self.0.borrow_mut().updates.push(PendingUpdate { id, apply, callback });
		self.notify()
	}

	/// Calls the batching hook once per scheduled cycle.
	fn notify(&self) {
		let hook = {
			let mut queue = self.0.borrow_mut();
			if queue.scheduled {
				return;
			}
			queue.scheduled = true;
			queue.hook.clone()
		};
		// Called outside of the borrow, as the hook may flush right away.
		if let Some(hook) = hook {
			hook()
		}
	}

	pub fn take_updates(&self) -> Vec<PendingUpdate> {
		mem::take(&mut self.0.borrow_mut().updates)
	}

	/// Swaps the online and offline queues and returns the previously online one.
	///
	/// Components enqueued while the returned batch is drained land in the fresh online queue.
	/// Hand the drained batch back through [`Scheduler::recycle`].
	pub fn take_batch(&self) -> Vec<ComponentId> {
		let mut queue = self.0.borrow_mut();
		let Queue { items, offline, .. } = &mut *queue;
		mem::swap(items, offline);
		queue.scheduled = false;
		mem::take(&mut queue.offline)
	}

	/// Returns an emptied batch allocation to the offline slot.
	pub fn recycle(&self, mut batch: Vec<ComponentId>) {
		batch.clear();
		let mut queue = self.0.borrow_mut();
		if queue.offline.capacity() < batch.capacity() {
			queue.offline = batch;
		}
	}

	/// Puts the unprocessed rest of an aborted batch back into the online queue, without calling the hook.
	pub fn requeue(&self, batch: Vec<ComponentId>) {
		self.0.borrow_mut().items.extend(batch)
	}

	pub fn is_pending(&self) -> bool {
		let queue = self.0.borrow();
		!queue.items.is_empty() || !queue.updates.is_empty()
	}
}

impl Debug for Scheduler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let queue = self.0.borrow();
		f.debug_struct("Scheduler")
			.field("items", &queue.items)
			.field("updates", &queue.updates.len())
			.field("scheduled", &queue.scheduled)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::Scheduler;
	use crate::arena::ComponentId;
	use core::cell::Cell;
	use slotmap::SlotMap;
	use std::rc::Rc;

	#[test]
	fn hook_runs_once_per_cycle() {
		let calls = Rc::new(Cell::new(0));
		let scheduler = Scheduler::new(Some(Rc::new({
			let calls = Rc::clone(&calls);
			move || calls.set(calls.get() + 1)
		})));

		let mut ids = SlotMap::<ComponentId, ()>::with_key();
		let (a, b) = (ids.insert(()), ids.insert(()));

		scheduler.enqueue(a);
		scheduler.enqueue(b);
		assert_eq!(calls.get(), 1);

		let batch = scheduler.take_batch();
		assert_eq!(batch, [a, b]);
		scheduler.recycle(batch);

		scheduler.enqueue(a);
		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn enqueueing_during_a_batch_goes_to_the_next_one() {
		let scheduler = Scheduler::new(None);
		let mut ids = SlotMap::<ComponentId, ()>::with_key();
		let (a, b) = (ids.insert(()), ids.insert(()));

		scheduler.enqueue(a);
		let mut batch = scheduler.take_batch();
		scheduler.enqueue(b);

		assert_eq!(batch.pop(), Some(a));
		assert!(batch.is_empty());
		assert!(scheduler.is_pending());
		assert_eq!(scheduler.take_batch(), [b]);
		assert!(!scheduler.is_pending());
	}
}
