//! Handles addressing multibodies and links inside a kernel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Slot of a link in a multibody's link array.
///
/// Non-negative values index the articulated links in parent-before-child
/// order. [`LinkIndex::BASE`] (-1) addresses the base object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkIndex(pub i32);

impl LinkIndex {
    /// The base (root) link.
    pub const BASE: Self = Self(-1);

    /// Create a link index.
    #[must_use]
    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    /// Link index for an articulated link slot.
    #[must_use]
    pub fn from_slot(slot: usize) -> Self {
        Self(i32::try_from(slot).unwrap_or(i32::MAX))
    }

    /// Raw index value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Whether this is the base.
    #[must_use]
    pub const fn is_base(self) -> bool {
        self.0 == -1
    }

    /// Array slot of an articulated link, `None` for the base or a negative
    /// index.
    #[must_use]
    pub fn slot(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl std::fmt::Display for LinkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_base() {
            write!(f, "Link(base)")
        } else {
            write!(f, "Link({})", self.0)
        }
    }
}

/// Identifier of a multibody registered with a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultibodyId(pub u32);

impl MultibodyId {
    /// Create a multibody ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for MultibodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Multibody({})", self.0)
    }
}

/// Address of one link (or the base) of one multibody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkHandle {
    /// Owning multibody.
    pub multibody: MultibodyId,
    /// Link within the multibody.
    pub link: LinkIndex,
}

impl LinkHandle {
    /// Create a link handle.
    #[must_use]
    pub const fn new(multibody: MultibodyId, link: LinkIndex) -> Self {
        Self { multibody, link }
    }

    /// Handle to the base of a multibody.
    #[must_use]
    pub const fn base(multibody: MultibodyId) -> Self {
        Self::new(multibody, LinkIndex::BASE)
    }
}

impl std::fmt::Display for LinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.multibody, self.link)
    }
}
