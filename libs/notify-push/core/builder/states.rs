/// Type-state markers for the builder pattern
///
/// The capability provider is the one required field; `build()` only
/// exists once it has been set.

use std::marker::PhantomData;

/// Marker trait for capability state
pub trait CapabilityState {}

/// Capability provider has not been set
pub struct NoCapabilities;
impl CapabilityState for NoCapabilities {}

/// Capability provider has been set
pub struct HasCapabilities;
impl CapabilityState for HasCapabilities {}

/// Phantom marker to prevent direct construction
#[derive(Debug, Clone, Copy)]
pub struct TypeState<C> {
    _capabilities: PhantomData<C>,
}

impl<C> TypeState<C> {
    pub(crate) fn new() -> Self {
        Self {
            _capabilities: PhantomData,
        }
    }
}

impl<C> Default for TypeState<C> {
    fn default() -> Self {
        Self::new()
    }
}
