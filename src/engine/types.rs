//! Core identifiers, bit layouts and component signatures.
//!
//! This module defines the small, copyable types shared by every other part of
//! the runtime: entity id packing, component ids, and the fixed-size bitsets
//! used both to describe which components an entity carries and to express
//! query filters.
//!
//! ## Entity Representation
//!
//! Entities are encoded as a packed 64-bit integer:
//!
//! ```text
//! | generation (32) | index (32) |
//! ```
//!
//! - **Index** identifies the storage slot and is reused after destruction.
//! - **Generation** is bumped every time the slot is freed, so a handle that
//!   outlives its entity never aliases the next occupant.
//!
//! ## Signatures
//!
//! A [`Signature`] is a fixed array of `u64` words with one bit per registered
//! component type. Entity membership tests and query matching are word-wise
//! bit operations with no allocation.
//!
//! A [`QuerySignature`] combines three signatures:
//!
//! - `all`: every component must be present (intersection),
//! - `none`: no component may be present (exclusion),
//! - `any`: at least one component must be present (ignored when empty).

/// Bit-width type used for compile-time layout calculations.
pub type Bits = u8;

/// Entity identifier encoded as a packed 64-bit value.
pub type EntityID = u64;
/// Slot index of an entity.
pub type IndexID = u32;
/// Generation counter used to detect stale entities.
pub type GenerationID = u32;

/// Simulation tick counter.
pub type Tick = u64;

/// Total number of bits in an [`EntityID`].
pub const ENTITY_BITS: Bits = 64;
/// Number of bits reserved for the generation.
pub const GENERATION_BITS: Bits = 32;
/// Number of bits reserved for the slot index.
pub const INDEX_BITS: Bits = ENTITY_BITS - GENERATION_BITS;

const _: [(); 1] = [(); (GENERATION_BITS < ENTITY_BITS) as usize];
const _: [(); 1] = [(); (INDEX_BITS > 0) as usize];

const fn mask(bits: Bits) -> EntityID {
    if bits == 0 { 0 } else { ((1 as EntityID) << bits) - 1 }
}

/// Mask selecting the index portion of an [`EntityID`].
pub const INDEX_MASK: EntityID = mask(INDEX_BITS);

/// Unique identifier for a component type.
pub type ComponentID = u16;

/// Maximum number of registered component types.
pub const COMPONENT_CAP: usize = 256;
/// Number of `u64` words required to represent a full component signature.
pub const SIGNATURE_SIZE: usize = (COMPONENT_CAP + 63) / 64;

/// Bitset representing a set of components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Packed component bitset.
    pub components: [u64; SIGNATURE_SIZE],
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            components: [0u64; SIGNATURE_SIZE],
        }
    }
}

impl Signature {
    /// Sets the bit corresponding to `component_id`.
    #[inline]
    pub fn set(&mut self, component_id: ComponentID) {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        self.components[index] |= 1u64 << bits;
    }

    /// Clears the bit corresponding to `component_id`.
    #[inline]
    pub fn clear(&mut self, component_id: ComponentID) {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        self.components[index] &= !(1u64 << bits);
    }

    /// Returns `true` if `component_id` is present in this signature.
    #[inline]
    pub fn has(&self, component_id: ComponentID) -> bool {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        (self.components[index] >> bits) & 1 == 1
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|&word| word == 0)
    }

    /// Returns `true` if all components in `signature` are present.
    #[inline]
    pub fn contains_all(&self, signature: &Signature) -> bool {
        for (component_a, component_b) in self.components.iter().zip(signature.components.iter()) {
            if (component_a & component_b) != *component_b { return false; }
        }
        true
    }

    /// Returns `true` if at least one component of `signature` is present.
    #[inline]
    pub fn intersects(&self, signature: &Signature) -> bool {
        self.components
            .iter()
            .zip(signature.components.iter())
            .any(|(a, b)| (a & b) != 0)
    }

    /// Iterates over all component IDs set in this signature.
    pub fn iterate_over_components(&self) -> impl Iterator<Item = ComponentID> + '_ {
        self.components
            .iter()
            .enumerate()
            .flat_map(|(word_index, &word)| {
                let base = word_index * 64;
                let mut bits = word;
                std::iter::from_fn(move || {
                    if bits == 0 {
                        return None;
                    }
                    let tz = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    Some((base + tz) as ComponentID)
                })
            })
    }
}

/// Component filter used for query matching.
///
/// ## Invariants
/// * `include_disabled == false` means entities carrying the `Disabled`
///   marker never match, whatever the three sets say.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuerySignature {
    /// Components that must all be present.
    pub all: Signature,

    /// Components that must all be absent.
    pub none: Signature,

    /// Components of which at least one must be present. Empty means "no constraint".
    pub any: Signature,

    /// Whether disabled entities are visible to the query.
    pub include_disabled: bool,
}

impl QuerySignature {
    /// Returns `true` if an entity with `signature` satisfies this filter.
    ///
    /// `disabled` is the component id of the `Disabled` marker.
    #[inline]
    pub fn matches(&self, signature: &Signature, disabled: ComponentID) -> bool {
        if !self.include_disabled && signature.has(disabled) {
            return false;
        }
        signature.contains_all(&self.all)
            && !signature.intersects(&self.none)
            && (self.any.is_empty() || signature.intersects(&self.any))
    }

    /// Returns `true` if `component_id` appears in any of the three sets.
    pub fn mentions(&self, component_id: ComponentID) -> bool {
        self.all.has(component_id) || self.none.has(component_id) || self.any.has(component_id)
    }
}
