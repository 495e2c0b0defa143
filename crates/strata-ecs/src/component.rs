//! Component type identity.
//!
//! Any `'static` value type can be attached to an entity; there is no
//! registration step. A [`ComponentTypeId`] is the runtime key under which a
//! component type's pool lives in the pool map. It is derived from the
//! language's own type identity ([`std::any::TypeId`]) and is therefore only
//! stable within a single build of a single process -- it must never be
//! persisted.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for types that can be attached to an entity.
///
/// Blanket-implemented for every `'static` type: components only need to be
/// movable. The registry is single-threaded, so no `Send`/`Sync` bounds
/// apply.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Runtime identifier of a component type.
///
/// Equality and hashing use only the underlying [`TypeId`]; the type name is
/// carried for diagnostics.
#[derive(Clone, Copy, Eq)]
pub struct ComponentTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// The identifier of component type `T`.
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Human-readable name of the component type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 64-bit hash of the type identity, used by the pool map's probing.
    #[inline]
    pub(crate) fn hash_u64(&self) -> u64 {
        let mut hasher = TypeIdHasher::default();
        self.type_id.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for ComponentTypeId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Hash for ComponentTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.name)
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ---------------------------------------------------------------------------
// TypeIdHasher
// ---------------------------------------------------------------------------

/// A hasher for type identities.
///
/// `TypeId` already is a high-entropy fingerprint, so a Fibonacci-multiply
/// fold of its bytes is enough; running it through SipHash would only add
/// cost. The fold accepts any input width, so it does not depend on how the
/// standard library feeds `TypeId` into the hasher.
#[derive(Default)]
pub(crate) struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        const FIB_MULT: u64 = 11_400_714_819_323_198_485;
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.0 = (self.0 ^ u64::from_ne_bytes(word)).wrapping_mul(FIB_MULT);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
