//! Item traits shared by every engine component
//!
//! The engine is generic over the managed item type. It never creates or
//! destroys items; it only proposes typed patches against them.

use crate::id::ItemId;
use std::fmt::Debug;

/// Anything with a stable unique identifier
pub trait Identified {
    /// Identifier of this item
    fn id(&self) -> &ItemId;
}

/// Items that accept a closed set of typed patches
///
/// # Invariants
/// For any item `x` and patch `p`, applying `x.inverse(&p)` after `p`
/// restores every field `p` touched to its value in `x`.
pub trait Patchable: Identified + Clone + Debug + Send + Sync + 'static {
    /// Patch variants accepted by this item kind
    type Patch: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Apply patch in place
    fn apply(&mut self, patch: &Self::Patch);

    /// Patch restoring this item's current values for the fields `patch` touches
    #[must_use]
    fn inverse(&self, patch: &Self::Patch) -> Self::Patch;

    /// Apply patch to a copy
    #[must_use]
    fn patched(&self, patch: &Self::Patch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// Items exposing named field values to the multi-field index
pub trait Indexable: Identified {
    /// Values of `field` on this item
    ///
    /// Multi-valued fields return one entry per value; absent or unknown
    /// fields return an empty vector.
    fn field_values(&self, field: &str) -> Vec<String>;
}
