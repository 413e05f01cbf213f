// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Arena-backed quadtree nodes.
//!
//! Nodes reference their parent and children by index into a single
//! `Arena`, not by `Rc`/`Arc` pointer: a child holding a strong reference to
//! its parent while the parent holds strong references to its children is a
//! reference cycle neither side can break, so node identity here is a plain
//! `usize` and ownership lives only in the arena's backing `Vec`.

use crate::leaf::LeafRecord;
use quadrille_geo::Rectangle;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One node of the quadtree. Interior nodes have empty `leaves` and a
/// populated `children`; leaf nodes (until they split) have a populated
/// `leaves` and an empty `children`.
pub struct QuadTreeNode {
    pub bounding_box: Rectangle,
    pub parent: Option<usize>,
    /// Materialized exactly once, on first split, via
    /// [`Arena::ensure_children`]. `OnceLock` gives single-execution and
    /// happens-before-publish for free, so no separate lock or flag is
    /// needed to guard materialization.
    children: OnceLock<[usize; 4]>,
    leaves: RwLock<HashMap<String, LeafRecord>>,
}

impl QuadTreeNode {
    fn new_leaf(bounding_box: Rectangle, parent: Option<usize>) -> QuadTreeNode {
        QuadTreeNode {
            bounding_box,
            parent,
            children: OnceLock::new(),
            leaves: RwLock::new(HashMap::new()),
        }
    }

    pub fn children(&self) -> Option<[usize; 4]> {
        self.children.get().copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.get().is_none()
    }

    pub fn leaves_read(&self) -> RwLockReadGuard<'_, HashMap<String, LeafRecord>> {
        self.leaves.read().unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn leaves_write(&self) -> RwLockWriteGuard<'_, HashMap<String, LeafRecord>> {
        self.leaves.write().unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Owns every node of the tree and hands out stable integer indices in
/// place of pointers.
pub struct Arena {
    nodes: RwLock<Vec<Box<QuadTreeNode>>>,
}

impl Arena {
    pub fn new() -> Arena {
        Arena {
            nodes: RwLock::new(Vec::new()),
        }
    }

    /// Pushes the root node (no parent) and returns its index. Must be
    /// called exactly once, before any other arena operation.
    pub fn push_root(&self, bounding_box: Rectangle) -> usize {
        let mut nodes = self.nodes.write().unwrap_or_else(|poison| poison.into_inner());
        nodes.push(Box::new(QuadTreeNode::new_leaf(bounding_box, None)));
        nodes.len() - 1
    }

    /// Runs `f` with a reference to the node at `index`.
    ///
    /// The arena's own lock is held only for the duration of the index
    /// lookup; `f` sees a `&QuadTreeNode` whose internal `leaves`/`children`
    /// locking is independent of the arena lock, so nested node-level
    /// locking inside `f` cannot deadlock against a concurrent arena
    /// mutation (arena mutation only ever appends, never removes or moves
    /// existing entries).
    pub fn with_node<R>(&self, index: usize, f: impl FnOnce(&QuadTreeNode) -> R) -> R {
        let nodes = self.nodes.read().unwrap_or_else(|poison| poison.into_inner());
        f(&nodes[index])
    }

    pub fn bounding_box_of(&self, index: usize) -> Rectangle {
        self.with_node(index, |n| n.bounding_box)
    }

    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.with_node(index, |n| n.parent)
    }

    pub fn children_of(&self, index: usize) -> Option<[usize; 4]> {
        self.with_node(index, |n| n.children())
    }

    /// Materializes `index`'s four children on first call, splitting its
    /// bounding box into quadrants; returns the (possibly just-created)
    /// child indices on every call.
    ///
    /// New nodes are pushed into the arena before the `OnceLock` is told
    /// about them, so a losing thread in the race to materialize leaves
    /// behind up to three orphaned, unreferenced nodes rather than risking
    /// a deadlock from mutating the arena from inside the `OnceLock`
    /// initializer while still holding the parent's lock. Orphaned nodes
    /// are never collected, consistent with this tree never reclaiming
    /// node storage.
    pub fn ensure_children(&self, index: usize) -> [usize; 4] {
        if let Some(existing) = self.children_of(index) {
            return existing;
        }

        let bounding_box = self.bounding_box_of(index);
        let quadrants = bounding_box.quadrants();
        let mut fresh = [0usize; 4];
        {
            let mut nodes = self.nodes.write().unwrap_or_else(|poison| poison.into_inner());
            for (slot, quadrant) in fresh.iter_mut().zip(quadrants.into_iter()) {
                nodes.push(Box::new(QuadTreeNode::new_leaf(quadrant, Some(index))));
                *slot = nodes.len() - 1;
            }
        }

        self.with_node(index, |n| *n.children.get_or_init(|| fresh))
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
