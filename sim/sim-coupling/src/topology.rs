//! Topology registry: joint names to kernel link indices.
//!
//! Built once per robot by a depth-first walk from the root. The root gets no
//! link slot (it is the kernel's base, [`LinkIndex::BASE`]); every other joint
//! gets the next sequential index, so a link's index is always greater than
//! its parent's.

use hashbrown::HashMap;
use sim_kernel::LinkIndex;
use sim_kinematics::RobotModel;
use sim_types::{JointId, JointType};
use tracing::debug;

use crate::error::CouplingError;
use crate::Result;

/// One articulated link in the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyEntry {
    /// Joint name.
    pub name: String,
    /// Joint in the robot model.
    pub joint: JointId,
    /// Parent link ([`LinkIndex::BASE`] for children of the root).
    pub parent: LinkIndex,
}

/// Immutable mapping between a robot's joints and kernel link slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    root_name: String,
    root: JointId,
    links: Vec<TopologyEntry>,
    by_name: HashMap<String, LinkIndex>,
    by_joint: HashMap<JointId, LinkIndex>,
}

impl Topology {
    /// Build the topology of a robot model.
    ///
    /// Fails if the root is not a free joint, if any other joint is not
    /// revolute, or if two joints share a name.
    pub fn build(model: &RobotModel) -> Result<Self> {
        let root = model.root();
        let root_joint = model
            .joint(root)
            .ok_or(sim_kinematics::ModelError::UnknownJoint(root))?;
        if root_joint.joint_type != JointType::Free {
            return Err(CouplingError::NonFloatingRoot {
                joint: root_joint.name.clone(),
                kind: root_joint.joint_type,
            });
        }

        let mut topology = Self {
            root_name: root_joint.name.clone(),
            root,
            links: Vec::new(),
            by_name: HashMap::new(),
            by_joint: HashMap::new(),
        };
        topology
            .by_name
            .insert(root_joint.name.clone(), LinkIndex::BASE);
        topology.by_joint.insert(root, LinkIndex::BASE);

        // (joint, parent link) pairs; children pushed in reverse so the first
        // child is visited first.
        let mut stack: Vec<(JointId, LinkIndex)> = model
            .children(root)
            .iter()
            .rev()
            .map(|&child| (child, LinkIndex::BASE))
            .collect();

        while let Some((id, parent)) = stack.pop() {
            let joint = model.joint(id).ok_or(sim_kinematics::ModelError::UnknownJoint(id))?;
            if joint.joint_type != JointType::Revolute {
                return Err(CouplingError::UnsupportedJoint {
                    joint: joint.name.clone(),
                    kind: joint.joint_type,
                });
            }

            let index = LinkIndex::from_slot(topology.links.len());
            if topology.by_name.insert(joint.name.clone(), index).is_some() {
                return Err(CouplingError::DuplicateJointName(joint.name.clone()));
            }
            topology.by_joint.insert(id, index);
            topology.links.push(TopologyEntry {
                name: joint.name.clone(),
                joint: id,
                parent,
            });

            stack.extend(model.children(id).iter().rev().map(|&child| (child, index)));
        }

        debug!(robot = model.name(), links = topology.links.len(), "topology built");
        Ok(topology)
    }

    /// Number of articulated links (root excluded).
    #[must_use]
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Root joint name.
    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Root joint ID.
    #[must_use]
    pub fn root(&self) -> JointId {
        self.root
    }

    /// Link index of a joint by name. The root maps to [`LinkIndex::BASE`].
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<LinkIndex> {
        self.by_name.get(name).copied()
    }

    /// Link index of a joint by ID.
    #[must_use]
    pub fn index_of_joint(&self, joint: JointId) -> Option<LinkIndex> {
        self.by_joint.get(&joint).copied()
    }

    /// Entry for an articulated link.
    #[must_use]
    pub fn entry(&self, index: LinkIndex) -> Option<&TopologyEntry> {
        index.slot().and_then(|slot| self.links.get(slot))
    }

    /// Joint mirrored by a link. [`LinkIndex::BASE`] maps to the root.
    #[must_use]
    pub fn joint_of(&self, index: LinkIndex) -> Option<JointId> {
        if index.is_base() {
            Some(self.root)
        } else {
            self.entry(index).map(|e| e.joint)
        }
    }

    /// Joint name of a link. [`LinkIndex::BASE`] maps to the root.
    #[must_use]
    pub fn name_of(&self, index: LinkIndex) -> Option<&str> {
        if index.is_base() {
            Some(&self.root_name)
        } else {
            self.entry(index).map(|e| e.name.as_str())
        }
    }

    /// Parent link of an articulated link.
    #[must_use]
    pub fn parent_of(&self, index: LinkIndex) -> Option<LinkIndex> {
        self.entry(index).map(|e| e.parent)
    }

    /// Articulated links in index order.
    pub fn links(&self) -> impl Iterator<Item = (LinkIndex, &TopologyEntry)> + '_ {
        self.links
            .iter()
            .enumerate()
            .map(|(slot, entry)| (LinkIndex::from_slot(slot), entry))
    }
}
