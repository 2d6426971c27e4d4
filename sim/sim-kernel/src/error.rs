//! Error types for kernel operations.

use thiserror::Error;

use crate::handle::{LinkHandle, LinkIndex, MultibodyId};

/// Errors reported by a physics kernel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KernelError {
    /// The multibody does not exist (or was removed).
    #[error("unknown multibody: {0}")]
    UnknownMultibody(MultibodyId),

    /// The link does not exist in its multibody.
    #[error("unknown link: {0}")]
    UnknownLink(LinkHandle),

    /// A joint operation was addressed to the base.
    #[error("{0} has no joint coordinate")]
    NoJointCoordinate(LinkHandle),

    /// Links must be set up in slot order, parents first.
    #[error("link {got} set up out of order (expected {expected})")]
    LinkOutOfOrder {
        /// Next free slot.
        expected: LinkIndex,
        /// Slot in the descriptor.
        got: LinkIndex,
    },

    /// The parent index does not precede the link.
    #[error("link {link} has invalid parent {parent}")]
    InvalidParent {
        /// Link being set up.
        link: LinkIndex,
        /// Its parent.
        parent: LinkIndex,
    },

    /// The multibody has been finalized and cannot take more links.
    #[error("{0} is already finalized")]
    AlreadyFinalized(MultibodyId),

    /// The multibody must be finalized before it can be simulated or queried.
    #[error("{0} is not finalized")]
    NotFinalized(MultibodyId),

    /// Step size rejected by the kernel.
    #[error("invalid step size: {0}")]
    InvalidStep(f64),

    /// Descriptor data rejected by the kernel.
    #[error("invalid descriptor: {reason}")]
    InvalidDescriptor {
        /// What was wrong.
        reason: String,
    },
}

impl KernelError {
    /// Create an invalid descriptor error.
    #[must_use]
    pub fn invalid_descriptor(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            reason: reason.into(),
        }
    }

    /// Whether the error is about a missing multibody or link.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownMultibody(_) | Self::UnknownLink(_))
    }
}
