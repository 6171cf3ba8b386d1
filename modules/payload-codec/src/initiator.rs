//! Payload initiators: zero-argument factories for fresh payload instances.

use std::fmt;
use std::sync::Arc;

use crate::payload::{AnyPayload, Payload};

/// Produces a fresh instance of one payload shape.
///
/// Invoked once at registration to learn the shape, then once per
/// `create_payload` call to seed decoding. Returning `None` is the nil case
/// and is rejected at registration.
#[derive(Clone)]
pub struct PayloadInitiator {
    factory: Arc<dyn Fn() -> Option<AnyPayload> + Send + Sync>,
}

impl PayloadInitiator {
    /// Raw form. Prefer [`PayloadInitiator::value`] or
    /// [`PayloadInitiator::reference`] unless the factory can fail.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Option<AnyPayload> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Payloads constructed from this initiator are held by value.
    pub fn value<T, F>(factory: F) -> Self
    where
        T: Payload,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(move || Some(AnyPayload::value(factory())))
    }

    /// Payloads constructed from this initiator are held by reference.
    pub fn reference<T, F>(factory: F) -> Self
    where
        T: Payload,
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        Self::new(move || Some(AnyPayload::boxed(factory())))
    }

    /// By-value initiator seeded with `T::default()`.
    pub fn of<T: Payload + Default>() -> Self {
        Self::value(T::default)
    }

    /// By-reference initiator seeded with `T::default()`.
    pub fn boxed_of<T: Payload + Default>() -> Self {
        Self::reference(|| Box::new(T::default()))
    }

    pub fn initiate(&self) -> Option<AnyPayload> {
        (self.factory)()
    }
}

impl fmt::Debug for PayloadInitiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadInitiator").finish_non_exhaustive()
    }
}
