use core::{
	any::{Any, TypeId},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;

/// Values handed down the component tree, keyed by their type.
///
/// Contexts are immutable and cheap to clone. [`Context::with`] and [`Context::extend`] produce a new context,
/// which components observe as a context change (contexts are compared by identity, not by value).
#[derive(Clone, Default)]
pub struct Context(Rc<HashMap<TypeId, Rc<dyn Any>>>);

impl Context {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get<T: 'static>(&self) -> Option<&T> {
		self.0.get(&TypeId::of::<T>()).and_then(|value| value.downcast_ref())
	}

	/// Returns a new context containing `value` in addition to (or replacing) the entries of this one.
	#[must_use]
	pub fn with<T: 'static>(&self, value: T) -> Self {
		let mut map = (*self.0).clone();
		map.insert(TypeId::of::<T>(), Rc::new(value));
		Self(Rc::new(map))
	}

	/// Merges `contribution` over this context. Entries of `contribution` win.
	#[must_use]
	pub fn extend(&self, contribution: &Context) -> Self {
		if contribution.is_empty() {
			return self.clone();
		}
		let mut map = (*self.0).clone();
		map.extend(contribution.0.iter().map(|(k, v)| (*k, Rc::clone(v))));
		Self(Rc::new(map))
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for Context {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context").field("len", &self.0.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::Context;

	#[derive(Debug, PartialEq)]
	struct Theme(&'static str);

	#[test]
	fn extend_overrides_and_keeps() {
		let base = Context::new().with(Theme("light")).with(3_u8);
		let child = base.extend(&Context::new().with(Theme("dark")));

		assert_eq!(child.get::<Theme>(), Some(&Theme("dark")));
		assert_eq!(child.get::<u8>(), Some(&3));
		assert_eq!(base.get::<Theme>(), Some(&Theme("light")));
		assert!(!child.ptr_eq(&base));
	}

	#[test]
	fn empty_contribution_keeps_identity() {
		let base = Context::new().with(1_i32);
		assert!(base.extend(&Context::new()).ptr_eq(&base));
	}
}
