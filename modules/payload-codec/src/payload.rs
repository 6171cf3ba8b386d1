//! Payload values, their shape identity, and the type-erased handle the
//! registry passes around.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{PayloadError, PayloadResult};

/// Anything that can travel as an event or command body.
///
/// Blanket-implemented: a type only needs serde support and to be shareable
/// across threads.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

// ---------------------------------------------------------------------------
// Shape identity
// ---------------------------------------------------------------------------

/// The concrete type of a payload, independent of whether it is held by value
/// or behind a `Box`. Equality is exact type identity, never the type's name.
#[derive(Clone, Copy)]
pub struct PayloadShape {
    id: TypeId,
    name: &'static str,
}

impl PayloadShape {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name. Diagnostic only.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Whether the shape is a named structured type: not a primitive, not an
    /// anonymous type such as a tuple, slice, array, reference, pointer,
    /// closure or trait object, and not a std wrapper or collection
    /// (`Option`, `Box`, `Vec`, maps and sets).
    ///
    /// Decided from [`std::any::type_name`], whose output format std does not
    /// guarantee to be stable across compiler releases.
    pub fn is_named(&self) -> bool {
        is_named_type(self.name)
    }
}

impl PartialEq for PayloadShape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PayloadShape {}

impl Hash for PayloadShape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PayloadShape").field(&self.name).finish()
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const PRIMITIVE_TYPES: &[&str] = &[
    "bool",
    "char",
    "str",
    "i8",
    "i16",
    "i32",
    "i64",
    "i128",
    "isize",
    "u8",
    "u16",
    "u32",
    "u64",
    "u128",
    "usize",
    "f32",
    "f64",
    "!",
    "alloc::string::String",
];

const ANONYMOUS_PREFIXES: &[&str] = &[
    "(", "[", "&", "*", "fn(", "dyn ", "unsafe ", "extern ", "impl ",
];

/// Std wrappers and collections stand in for pointer, nil-able, slice and map
/// types; none of them names a payload.
const WRAPPER_PREFIXES: &[&str] = &[
    "core::option::Option<",
    "alloc::boxed::Box<",
    "alloc::vec::Vec<",
    "alloc::rc::Rc<",
    "alloc::sync::Arc<",
    "alloc::collections::",
    "std::collections::",
];

fn is_named_type(type_name: &str) -> bool {
    let name = type_name.trim();
    if name.is_empty() || PRIMITIVE_TYPES.contains(&name) {
        return false;
    }
    if ANONYMOUS_PREFIXES
        .iter()
        .chain(WRAPPER_PREFIXES)
        .any(|prefix| name.starts_with(prefix))
    {
        return false;
    }
    !name.contains("{{closure}}")
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// How an initiator hands out its payload: as a plain value (`T`) or behind a
/// reference (`Box<T>`). Construction returns the same kind it was registered
/// with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Value,
    Reference,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Value => f.write_str("value"),
            Handle::Reference => f.write_str("reference"),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding seam
// ---------------------------------------------------------------------------

/// Something `convert_payload` can encode: any [`Payload`] (by `&value` or
/// `&Box<T>`) or an already type-erased [`AnyPayload`].
pub trait AsPayload {
    fn shape(&self) -> PayloadShape;

    fn encode(&self, pretty: bool) -> serde_json::Result<Vec<u8>>;
}

impl<T: Payload> AsPayload for T {
    fn shape(&self) -> PayloadShape {
        PayloadShape::of::<T>()
    }

    fn encode(&self, pretty: bool) -> serde_json::Result<Vec<u8>> {
        if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
    }
}

impl AsPayload for AnyPayload {
    fn shape(&self) -> PayloadShape {
        self.inner.erased_shape()
    }

    fn encode(&self, pretty: bool) -> serde_json::Result<Vec<u8>> {
        self.inner.erased_encode(pretty)
    }
}

/// Object-safe view over a concrete payload type.
trait ErasedPayload: Send + Sync {
    fn erased_shape(&self) -> PayloadShape;

    /// Shape of the same payload behind a `Box`.
    fn boxed_shape(&self) -> PayloadShape;

    fn erased_encode(&self, pretty: bool) -> serde_json::Result<Vec<u8>>;

    fn decode_over(&mut self, document: Value) -> serde_json::Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Payload> ErasedPayload for T {
    fn erased_shape(&self) -> PayloadShape {
        PayloadShape::of::<T>()
    }

    fn boxed_shape(&self) -> PayloadShape {
        PayloadShape::of::<Box<T>>()
    }

    fn erased_encode(&self, pretty: bool) -> serde_json::Result<Vec<u8>> {
        self.encode(pretty)
    }

    fn decode_over(&mut self, document: Value) -> serde_json::Result<()> {
        let seed = match serde_json::to_value(&*self) {
            Ok(seed) => seed,
            Err(err) => {
                warn!(
                    shape = %PayloadShape::of::<T>(),
                    error = %err,
                    "Payload seed cannot be serialized, decoding from data alone"
                );
                *self = serde_json::from_value(document)?;
                return Ok(());
            }
        };

        let merged = overlay(seed, document.clone());
        if merged == document {
            *self = serde_json::from_value(document)?;
            return Ok(());
        }

        match serde_json::from_value(merged) {
            Ok(decoded) => *self = decoded,
            // A complete document decodes without the seed's help.
            Err(err) => {
                debug!(
                    shape = %PayloadShape::of::<T>(),
                    error = %err,
                    "Seeded decode failed, decoding from data alone"
                );
                *self = serde_json::from_value(document)?;
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// Lays `document` over `seed`: object keys present in the document win,
/// nested objects merge recursively, everything else is replaced.
///
/// Two single-key objects with different keys are externally tagged enum
/// variants; the document's variant replaces the seed's.
fn overlay(seed: Value, document: Value) -> Value {
    match (seed, document) {
        (Value::Object(base), Value::Object(fields))
            if is_variant_switch(&base, &fields) =>
        {
            Value::Object(fields)
        }
        (Value::Object(mut base), Value::Object(fields)) => {
            for (key, value) in fields {
                let merged = match base.remove(&key) {
                    Some(existing) => overlay(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, document) => document,
    }
}

fn is_variant_switch(seed: &Map<String, Value>, document: &Map<String, Value>) -> bool {
    seed.len() == 1 && document.len() == 1 && seed.keys().ne(document.keys())
}

// ---------------------------------------------------------------------------
// AnyPayload
// ---------------------------------------------------------------------------

/// A payload whose concrete type is only known at runtime.
///
/// Produced by initiators and by `create_payload`. Remembers whether it is
/// held by value or by reference; use [`AnyPayload::downcast`] or
/// [`AnyPayload::downcast_box`] to get the concrete type back.
pub struct AnyPayload {
    inner: Box<dyn ErasedPayload>,
    handle: Handle,
}

impl AnyPayload {
    /// Wrap a payload held by value.
    pub fn value<T: Payload>(payload: T) -> Self {
        Self {
            inner: Box::new(payload),
            handle: Handle::Value,
        }
    }

    /// Wrap a payload held by reference.
    pub fn boxed<T: Payload>(payload: Box<T>) -> Self {
        Self {
            inner: payload,
            handle: Handle::Reference,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn is_reference(&self) -> bool {
        self.handle == Handle::Reference
    }

    pub fn shape(&self) -> PayloadShape {
        self.inner.erased_shape()
    }

    /// Shape of this payload's type when held as `Box<T>`.
    pub fn boxed_shape(&self) -> PayloadShape {
        self.inner.boxed_shape()
    }

    pub fn is<T: Payload>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Take the concrete payload out, whatever its handle.
    pub fn downcast<T: Payload>(self) -> PayloadResult<T> {
        self.downcast_box().map(|payload| *payload)
    }

    /// Take the concrete payload out as a `Box<T>` without copying it.
    pub fn downcast_box<T: Payload>(self) -> PayloadResult<Box<T>> {
        let found = self.shape().type_name();
        self.inner
            .into_any()
            .downcast::<T>()
            .map_err(|_| PayloadError::PayloadTypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })
    }

    pub(crate) fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = handle;
        self
    }

    pub(crate) fn decode_over(&mut self, document: Value) -> serde_json::Result<()> {
        self.inner.decode_over(document)
    }
}

impl fmt::Debug for AnyPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyPayload")
            .field("shape", &self.shape())
            .field("handle", &self.handle)
            .finish()
    }
}
