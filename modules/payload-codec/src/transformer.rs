//! PayloadTransformer: the payload registry and its JSON codec.
//!
//! Registration happens through `&mut self`, conversion and construction
//! through `&self`. Populate the registry during startup, then share it
//! (e.g. behind an `Arc`) for the rest of the process; no locking is done.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::data::PayloadData;
use crate::error::{PayloadError, PayloadResult};
use crate::initiator::PayloadInitiator;
use crate::payload::{AnyPayload, AsPayload, Handle, Payload, PayloadShape};

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Registration {
    initiator: PayloadInitiator,
    shape: PayloadShape,
    boxed_shape: PayloadShape,
    handle: Handle,
}

// ---------------------------------------------------------------------------
// PayloadTransformer
// ---------------------------------------------------------------------------

/// Maps payload type names to initiators, and payload shapes back to names.
#[derive(Debug, Clone, Default)]
pub struct PayloadTransformer {
    config: CodecConfig,
    initiators: HashMap<String, Registration>,
    names: HashMap<PayloadShape, String>,
}

impl PayloadTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Register `initiator` under `name`.
    ///
    /// The initiator is invoked once to learn the payload's shape and whether
    /// it is held by value or by reference. Nothing is stored on failure.
    pub fn register_payload(
        &mut self,
        name: impl Into<String>,
        initiator: PayloadInitiator,
    ) -> PayloadResult<()> {
        let name = name.into();

        match self.try_register(name.clone(), initiator) {
            Ok(registration) => {
                debug!(
                    payload_type = %name,
                    shape = %registration.shape,
                    handle = %registration.handle,
                    "Registered payload type"
                );
                self.names.insert(registration.shape, name.clone());
                self.names.insert(registration.boxed_shape, name.clone());
                self.initiators.insert(name, registration);
                Ok(())
            }
            Err(err) => {
                debug!(payload_type = %name, error = %err, "Rejected payload registration");
                Err(err)
            }
        }
    }

    /// Register every entry, stopping at the first failure.
    ///
    /// Not transactional: entries registered before the failing one stay
    /// registered. With a `HashMap` input the iteration order, and therefore
    /// which entries made it in, is unspecified.
    pub fn register_payloads<I, S>(&mut self, entries: I) -> PayloadResult<()>
    where
        I: IntoIterator<Item = (S, PayloadInitiator)>,
        S: Into<String>,
    {
        for (name, initiator) in entries {
            self.register_payload(name, initiator)?;
        }
        Ok(())
    }

    fn try_register(
        &self,
        name: String,
        initiator: PayloadInitiator,
    ) -> PayloadResult<Registration> {
        if name.is_empty() {
            return Err(PayloadError::InvalidPayloadType);
        }

        let sample = initiator
            .initiate()
            .ok_or(PayloadError::InitiatorInvalidResult)?;

        let shape = sample.shape();
        if !shape.is_named() {
            return Err(PayloadError::InvalidPayloadName {
                type_name: shape.type_name(),
            });
        }

        if self.initiators.contains_key(&name) {
            return Err(PayloadError::DuplicatePayloadType { name });
        }

        Ok(Registration {
            initiator,
            shape,
            boxed_shape: sample.boxed_shape(),
            handle: sample.handle(),
        })
    }

    // -----------------------------------------------------------------------
    // Forward conversion
    // -----------------------------------------------------------------------

    /// Encode `payload` and return it with its registered name.
    ///
    /// The shape must match a registration exactly; a same-named type from
    /// another module is not registered. `T` and `Box<T>` share a registration.
    pub fn convert_payload<P>(&self, payload: &P) -> PayloadResult<(String, Vec<u8>)>
    where
        P: AsPayload + ?Sized,
    {
        let shape = payload.shape();
        let name = self
            .names
            .get(&shape)
            .ok_or(PayloadError::PayloadNotRegistered {
                type_name: shape.type_name(),
            })?;

        let data = payload
            .encode(self.config.pretty)
            .map_err(|source| PayloadError::PayloadCannotBeSerialized {
                name: name.clone(),
                source,
            })?;

        trace!(payload_type = %name, bytes = data.len(), "Converted payload");
        Ok((name.clone(), data))
    }

    // -----------------------------------------------------------------------
    // Reverse construction
    // -----------------------------------------------------------------------

    /// Build the payload registered under `name` from encoded `data`.
    ///
    /// A fresh instance from the initiator is decoded into: fields present in
    /// `data` overwrite it, absent fields keep the initiator's values, and an
    /// enum variant in `data` replaces the initiator's variant. Data that
    /// does not fit over the seed is decoded on its own. The result has the
    /// handle (value or reference) the initiator declared.
    /// Malformed data surfaces as [`PayloadError::Decode`] carrying the
    /// serde_json error unchanged.
    pub fn create_payload<'a>(
        &self,
        name: &str,
        data: impl Into<PayloadData<'a>>,
    ) -> PayloadResult<AnyPayload> {
        let registration =
            self.initiators
                .get(name)
                .ok_or_else(|| PayloadError::UnknownPayloadType {
                    name: name.to_string(),
                })?;

        let source = data.into().source()?;
        let document: Value = serde_json::from_slice(source)?;

        let mut payload = registration
            .initiator
            .initiate()
            .ok_or(PayloadError::InitiatorInvalidResult)?;
        if payload.shape() != registration.shape {
            return Err(PayloadError::PayloadTypeMismatch {
                expected: registration.shape.type_name(),
                found: payload.shape().type_name(),
            });
        }

        payload.decode_over(document)?;

        trace!(payload_type = %name, handle = %registration.handle, "Created payload");
        Ok(payload.with_handle(registration.handle))
    }

    /// [`create_payload`](Self::create_payload) followed by a downcast to `T`.
    pub fn create<'a, T: Payload>(
        &self,
        name: &str,
        data: impl Into<PayloadData<'a>>,
    ) -> PayloadResult<T> {
        self.create_payload(name, data)?.downcast()
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn is_registered(&self, name: &str) -> bool {
        self.initiators.contains_key(name)
    }

    /// Registered name for payloads of type `T`.
    pub fn name_of<T: Payload>(&self) -> Option<&str> {
        self.name_of_shape(PayloadShape::of::<T>())
    }

    pub fn name_of_shape(&self, shape: PayloadShape) -> Option<&str> {
        self.names.get(&shape).map(String::as_str)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.initiators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.initiators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initiators.is_empty()
    }
}
