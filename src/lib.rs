#![doc(html_root_url = "https://docs.rs/cambium/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod arena;
mod attributes;
mod component;
mod context;
mod diff;
mod error;
mod lifecycle;
mod load;
pub mod memory;
mod options;
mod rc_hash_map;
mod scheduler;
mod surface;
mod vnode;
pub mod web;

pub use arena::{ComponentId, NodeId};
pub use component::{Component, Link, Scope, Snapshot};
pub use context::Context;
pub use diff::Reconciler;
pub use error::{Error, Result};
pub use options::{set_vnode_observer, BatchingHook, Options, VNodeObserver};
pub use surface::{Dispatcher, Event, NodeKind, Surface};
pub use vnode::{h, AttrValue, Attributes, ElementBuilder, ElementNode, FunctionalNode, Key, Listener, RefCallback, RefTarget, StatefulNode, VNode, VNodeKind};
