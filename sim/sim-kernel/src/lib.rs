//! Physics-kernel boundary for articulated multibodies.
//!
//! The coupling layer talks to a rigid-multibody physics kernel only through
//! the [`PhysicsKernel`] trait. A kernel keeps state in its own
//! representation: a base object plus an array of links addressed by
//! [`LinkIndex`], where index `-1` ([`LinkIndex::BASE`]) is the base and links
//! are stored parent-before-child.
//!
//! # Registration
//!
//! ```text
//! create_multibody(base) ─► setup_revolute_joint(0) ─► ... ─► finalize_multibody
//! ```
//!
//! # Reference kernel
//!
//! [`ReferenceKernel`] is a small in-process kernel. It is not a general
//! physics engine: joints integrate independently and constraint readouts are
//! quasi-static. It exists so the coupling protocol can be exercised without
//! an external engine.

#![doc(html_root_url = "https://docs.rs/sim-kernel/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod descriptor;
mod error;
mod handle;
mod kernel;
mod reference;

pub use descriptor::{BaseDescriptor, RevoluteJointDescriptor};
pub use error::KernelError;
pub use handle::{LinkHandle, LinkIndex, MultibodyId};
pub use kernel::PhysicsKernel;
pub use reference::ReferenceKernel;

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
