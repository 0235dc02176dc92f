use crate::arena::{ComponentId, NodeId};
use thiserror::Error;

/// Errors surfaced by [`Reconciler`](`crate::Reconciler`) entry points.
///
/// Nothing is rolled back when one of these is returned.
/// Mutations applied before the failure stay on the surface.
#[derive(Error, Debug)]
pub enum Error {
	/// A render function or lifecycle hook returned an error.
	#[error("`{component}::{hook}` failed")]
	Hook {
		component: &'static str,
		hook: &'static str,
		#[source]
		source: anyhow::Error,
	},

	#[error("Node {0:?} is not (or no longer) part of this reconciler")]
	StaleNode(NodeId),

	#[error("Component {0:?} is not (or no longer) mounted in this reconciler")]
	StaleComponent(ComponentId),

	#[error("`{component}` finished a synchronous render without a base node")]
	NoBase { component: &'static str },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

pub(crate) fn hook_error(component: &'static str, hook: &'static str) -> impl FnOnce(anyhow::Error) -> Error {
	move |source| Error::Hook { component, hook, source }
}
