//! The immutable virtual node model.
//!
//! A [`VNode`] describes one desired tree node. Node identity is resolved once, at construction,
//! into one of the [`VNodeKind`] variants, so the reconciler never inspects types at diff time.

use crate::{
	arena::{ComponentId, NodeId},
	component::{instantiate, AnyInstance, Component},
	context::Context,
	options,
	surface::Event,
};
use core::{
	any::{type_name, Any, TypeId},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;

/// An identity hint, unique among siblings.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(Rc<str>);

impl Key {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Debug for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Debug::fmt(&*self.0, f)
	}
}

impl From<&str> for Key {
	fn from(key: &str) -> Self {
		Self(key.into())
	}
}

impl From<String> for Key {
	fn from(key: String) -> Self {
		Self(key.into())
	}
}

macro_rules! key_from_integer {
	($($integer:ty),*$(,)?) => {$(
		impl From<$integer> for Key {
			fn from(key: $integer) -> Self {
				Self(key.to_string().into())
			}
		}
	)*};
}
key_from_integer!(i32, i64, u32, u64, usize);

/// An event handler. Compared by identity.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
	pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for Listener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
	}
}

/// What a [`RefCallback`] receives while attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
	Node(NodeId),
	Component(ComponentId),
}

/// Called with the rendered target once attached, and with [`None`] before teardown.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(Option<RefTarget>)>);

impl RefCallback {
	pub fn new(callback: impl Fn(Option<RefTarget>) + 'static) -> Self {
		Self(Rc::new(callback))
	}

	pub fn call(&self, target: Option<RefTarget>) {
		(self.0)(target)
	}
}

impl Debug for RefCallback {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "RefCallback({:p})", Rc::as_ptr(&self.0))
	}
}

#[derive(Debug, Clone)]
pub enum AttrValue {
	Text(Rc<str>),
	Number(f64),
	/// `true` applies the attribute with an empty value, `false` removes it.
	Bool(bool),
	Listener(Listener),
}

impl AttrValue {
	/// The string form applied to the surface, or [`None`] for values that aren't applied as attributes.
	#[must_use]
	pub fn to_attribute_string(&self) -> Option<String> {
		match self {
			AttrValue::Text(text) => Some(text.to_string()),
			AttrValue::Number(number) => Some(number.to_string()),
			AttrValue::Bool(true) => Some(String::new()),
			AttrValue::Bool(false) | AttrValue::Listener(_) => None,
		}
	}
}

impl PartialEq for AttrValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(AttrValue::Text(a), AttrValue::Text(b)) => a == b,
			(AttrValue::Number(a), AttrValue::Number(b)) => a == b,
			(AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
			(AttrValue::Listener(a), AttrValue::Listener(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		AttrValue::Text(value.into())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		AttrValue::Text(value.into())
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Bool(value)
	}
}

impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		AttrValue::Number(value)
	}
}

impl From<i32> for AttrValue {
	fn from(value: i32) -> Self {
		AttrValue::Number(value.into())
	}
}

impl From<Listener> for AttrValue {
	fn from(value: Listener) -> Self {
		AttrValue::Listener(value)
	}
}

/// An insertion-ordered attribute set. Names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(Rc<str>, AttrValue)>);

impl Attributes {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0.iter().find(|(n, _)| &**n == name).map(|(_, v)| v)
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Sets `name` to `value`, keeping the original position of an existing entry.
	pub fn set(&mut self, name: impl Into<Rc<str>>, value: impl Into<AttrValue>) {
		let name = name.into();
		let value = value.into();
		match self.0.iter_mut().find(|(n, _)| *n == name) {
			Some(entry) => entry.1 = value,
			None => self.0.push((name, value)),
		}
	}

	pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
		let index = self.0.iter().position(|(n, _)| &**n == name)?;
		Some(self.0.remove(index).1)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.0.iter().map(|(n, v)| (&**n, v))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn clear(&mut self) {
		self.0.clear()
	}
}

pub struct ElementNode {
	pub name: Rc<str>,
	pub attributes: Attributes,
	pub children: Vec<VNode>,
}

pub struct FunctionalNode {
	pub(crate) name: &'static str,
	pub(crate) render: Box<dyn Fn(&Context) -> anyhow::Result<VNode>>,
}

pub struct StatefulNode {
	pub(crate) type_id: TypeId,
	pub(crate) name: &'static str,
	pub(crate) props: Rc<dyn Any>,
	pub(crate) instantiate: fn(Rc<dyn Any>, &Context) -> Box<dyn AnyInstance>,
}

impl StatefulNode {
	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	#[must_use]
	pub fn is<C: Component>(&self) -> bool {
		self.type_id == TypeId::of::<C>()
	}
}

#[derive(Clone)]
pub enum VNodeKind {
	/// Renders nothing inside a child list, and an empty text node where a node is required.
	Nothing,
	Text(Rc<str>),
	Element(Rc<ElementNode>),
	Functional(Rc<FunctionalNode>),
	Stateful(Rc<StatefulNode>),
}

#[derive(Clone)]
pub struct VNode {
	kind: VNodeKind,
	key: Option<Key>,
	reference: Option<RefCallback>,
}

impl VNode {
	fn from_parts(kind: VNodeKind, key: Option<Key>, reference: Option<RefCallback>) -> Self {
		let vnode = Self { kind, key, reference };
		options::observe(&vnode);
		vnode
	}

	#[must_use]
	pub fn nothing() -> Self {
		Self::from_parts(VNodeKind::Nothing, None, None)
	}

	pub fn text(text: impl Into<Rc<str>>) -> Self {
		Self::from_parts(VNodeKind::Text(text.into()), None, None)
	}

	/// A stateful component reference. Children, if any, are part of `props`.
	pub fn component<C: Component>(props: C::Props) -> Self {
		Self::from_parts(
			VNodeKind::Stateful(Rc::new(StatefulNode {
				type_id: TypeId::of::<C>(),
				name: type_name::<C>(),
				props: Rc::new(props),
				instantiate: instantiate::<C>,
			})),
			None,
			None,
		)
	}

	/// A functional component reference, resolved to its output whenever it is diffed.
	pub fn function<P: 'static, F>(render: F, props: P) -> Self
	where
		F: Fn(&P, &Context) -> anyhow::Result<VNode> + 'static,
	{
		Self::from_parts(
			VNodeKind::Functional(Rc::new(FunctionalNode {
				name: type_name::<F>(),
				render: Box::new(move |context| render(&props, context)),
			})),
			None,
			None,
		)
	}

	#[must_use]
	pub fn keyed(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn with_ref(mut self, reference: RefCallback) -> Self {
		self.reference = Some(reference);
		self
	}

	#[must_use]
	pub fn kind(&self) -> &VNodeKind {
		&self.kind
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	#[must_use]
	pub fn reference(&self) -> Option<&RefCallback> {
		self.reference.as_ref()
	}

	#[must_use]
	pub fn is_nothing(&self) -> bool {
		matches!(self.kind, VNodeKind::Nothing)
	}
}

impl Debug for VNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = match &self.kind {
			VNodeKind::Nothing => return f.write_str("Nothing"),
			VNodeKind::Text(text) => {
				let mut debug = f.debug_struct("Text");
				if cfg!(feature = "dangerous-logging") {
					debug.field("text", text);
				} else {
					debug.field("len", &text.len());
				}
				debug
			}
			VNodeKind::Element(element) => {
				let mut debug = f.debug_struct("Element");
				debug.field("name", &element.name).field("children", &element.children);
				debug
			}
			VNodeKind::Functional(functional) => {
				let mut debug = f.debug_struct("Functional");
				debug.field("name", &functional.name);
				debug
			}
			VNodeKind::Stateful(stateful) => {
				let mut debug = f.debug_struct("Stateful");
				debug.field("name", &stateful.name);
				debug
			}
		};
		if let Some(key) = &self.key {
			debug.field("key", key);
		}
		debug.finish()
	}
}

impl From<&str> for VNode {
	fn from(text: &str) -> Self {
		Self::text(text)
	}
}

impl From<String> for VNode {
	fn from(text: String) -> Self {
		Self::text(text)
	}
}

impl<T: Into<VNode>> From<Option<T>> for VNode {
	fn from(vnode: Option<T>) -> Self {
		vnode.map_or_else(Self::nothing, Into::into)
	}
}

impl From<ElementBuilder> for VNode {
	fn from(builder: ElementBuilder) -> Self {
		builder.build()
	}
}

/// Starts building an element node.
///
/// ```
/// use cambium::{h, VNode};
///
/// let vnode: VNode = h("ul").attr("class", "list").child(h("li").key(1).text("one")).into();
/// assert_eq!(vnode.key(), None);
/// ```
pub fn h(name: impl Into<Rc<str>>) -> ElementBuilder {
	ElementBuilder {
		name: name.into(),
		attributes: Attributes::new(),
		children: Vec::new(),
		key: None,
		reference: None,
	}
}

#[must_use]
pub struct ElementBuilder {
	name: Rc<str>,
	attributes: Attributes,
	children: Vec<VNode>,
	key: Option<Key>,
	reference: Option<RefCallback>,
}

impl ElementBuilder {
	pub fn attr(mut self, name: impl Into<Rc<str>>, value: impl Into<AttrValue>) -> Self {
		self.attributes.set(name, value);
		self
	}

	/// Binds `listener` to the event `event` (without `on` prefix).
	pub fn on(mut self, event: &str, listener: Listener) -> Self {
		self.attributes.set(format!("on{}", event), listener);
		self
	}

	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	pub fn with_ref(mut self, reference: RefCallback) -> Self {
		self.reference = Some(reference);
		self
	}

	pub fn child(mut self, child: impl Into<VNode>) -> Self {
		self.children.push(child.into());
		self
	}

	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<VNode>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}

	pub fn text(self, text: impl Into<Rc<str>>) -> Self {
		self.child(VNode::text(text))
	}

	pub fn build(self) -> VNode {
		VNode::from_parts(
			VNodeKind::Element(Rc::new(ElementNode {
				name: self.name,
				attributes: self.attributes,
				children: self.children,
			})),
			self.key,
			self.reference,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::{h, AttrValue, Attributes, Key, Listener, VNode, VNodeKind};

	#[test]
	fn attributes_keep_first_position_on_update() {
		let mut attributes = Attributes::new();
		attributes.set("id", "a");
		attributes.set("title", "t");
		attributes.set("id", "b");

		let names: Vec<_> = attributes.iter().map(|(n, _)| n).collect();
		assert_eq!(names, ["id", "title"]);
		assert_eq!(attributes.get("id"), Some(&AttrValue::from("b")));
	}

	#[test]
	fn listeners_compare_by_identity() {
		let listener = Listener::new(|_| ());
		assert_eq!(AttrValue::from(listener.clone()), AttrValue::from(listener));
		assert_ne!(AttrValue::from(Listener::new(|_| ())), AttrValue::from(Listener::new(|_| ())));
	}

	#[test]
	fn integer_and_string_keys_collide() {
		assert_eq!(Key::from(0_usize), Key::from("0"));
	}

	#[test]
	fn absent_children_are_nothing() {
		let vnode: VNode = h("p").child(None::<VNode>).build();
		match vnode.kind() {
			VNodeKind::Element(element) => assert!(element.children[0].is_nothing()),
			_ => panic!("expected an element"),
		}
	}

	#[test]
	fn attribute_strings() {
		assert_eq!(AttrValue::Number(2.0).to_attribute_string().as_deref(), Some("2"));
		assert_eq!(AttrValue::Bool(true).to_attribute_string().as_deref(), Some(""));
		assert_eq!(AttrValue::Bool(false).to_attribute_string(), None);
	}
}
