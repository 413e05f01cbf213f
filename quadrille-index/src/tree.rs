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

//! The fixed-depth region quadtree: concurrent insert/update/delete/get and
//! the radius-bounded nearby-locations query.

use crate::errors::{IndexError, IndexResult};
use crate::leaf::{DataMap, LeafRecord};
use crate::node::Arena;
use crate::shard_map::ShardedMap;
use quadrille_geo::{great_circle_distance_m, intersects_rectangle, Position, Rectangle};
use std::cmp::Ordering;

/// Depth of the leaf layer below the root. The source pins this at 16; it
/// is exposed here as a constructor parameter for testability with a
/// shallow tree.
pub const DEFAULT_HEIGHT: usize = 16;

/// One (id, position, data) hit from [`QuadTree::get_nearby_locations`],
/// carrying the distance it was found at so callers don't have to
/// recompute it.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyLocation {
    pub leaf: LeafRecord,
    pub distance_m: f64,
}

/// A fixed-height region quadtree over the whole WGS84 lat/lon rectangle.
pub struct QuadTree {
    arena: Arena,
    location_index: ShardedMap<usize>,
    height: usize,
    root: usize,
}

impl QuadTree {
    /// Builds an empty tree of the given height, rooted at the whole
    /// lat/lon rectangle.
    pub fn new(height: usize) -> QuadTree {
        let arena = Arena::new();
        let whole_world = Rectangle::new(
            Position::new(90.0, -180.0).expect("in range"),
            Position::new(-90.0, 180.0).expect("in range"),
        );
        let root = arena.push_root(whole_world);
        QuadTree {
            arena,
            location_index: ShardedMap::new(),
            height,
            root,
        }
    }

    /// The index of the child whose quadrant contains `pos`, breaking ties
    /// (points on a shared edge) by [`Rectangle::quadrants`]'s iteration
    /// order.
    fn quadrant_index(quadrants: &[Rectangle; 4], pos: Position) -> usize {
        quadrants
            .iter()
            .position(|q| q.contains(pos))
            .unwrap_or(quadrants.len() - 1)
    }

    /// Descends from the root to the leaf-layer node that owns `pos`,
    /// materializing children lazily along the way.
    fn descend(&self, pos: Position) -> usize {
        let mut current = self.root;
        for _ in 0..self.height {
            let children = self.arena.ensure_children(current);
            let quadrants = children.map(|c| self.arena.bounding_box_of(c));
            let idx = Self::quadrant_index(&quadrants, pos);
            current = children[idx];
        }
        current
    }

    /// Inserts (or overwrites) the leaf for `id`. Always targets the
    /// leaf-layer node whose box contains `pos`.
    pub fn insert(&self, id: &str, pos: Position, data: DataMap) {
        let node = self.descend(pos);
        let mut shard = self.location_index.write_shard(id);
        self.arena.with_node(node, |n| {
            n.leaves_write().insert(id.to_string(), LeafRecord::new(id, pos, data));
        });
        shard.insert(id.to_string(), node);
    }

    fn current_owner(&self, id: &str) -> Option<usize> {
        self.location_index.read_shard(id).get(id).copied()
    }

    /// Removes `id`'s leaf record. Fails with
    /// [`IndexError::LocationNotFound`] if `id` has no current owner.
    pub fn delete(&self, id: &str) -> IndexResult<()> {
        // The pre-check outside the lock is only a fast path: the
        // authoritative check happens after the shard lock is held, below.
        if self.current_owner(id).is_none() {
            return Err(IndexError::LocationNotFound(id.to_string()));
        }

        let mut shard = self.location_index.write_shard(id);
        let node = match shard.get(id).copied() {
            Some(node) => node,
            None => return Err(IndexError::LocationNotFound(id.to_string())),
        };
        self.arena.with_node(node, |n| {
            n.leaves_write().remove(id);
        });
        shard.remove(id);
        Ok(())
    }

    /// Returns a copy of `id`'s leaf record, or
    /// [`IndexError::LocationNotFound`].
    pub fn get(&self, id: &str) -> IndexResult<LeafRecord> {
        let shard = self.location_index.read_shard(id);
        let node = shard
            .get(id)
            .copied()
            .ok_or_else(|| IndexError::LocationNotFound(id.to_string()))?;
        self.arena
            .with_node(node, |n| n.leaves_read().get(id).cloned())
            .ok_or_else(|| IndexError::LocationNotFound(id.to_string()))
    }

    /// Relocates `id` to `pos` in place if its owning box still contains
    /// `pos`; otherwise removes it from its current node and re-inserts it
    /// via a fresh descent, carrying its existing data.
    pub fn update_location(&self, id: &str, pos: Position) -> IndexResult<()> {
        let existing_data;
        {
            let mut shard = self.location_index.write_shard(id);
            let node = match shard.get(id).copied() {
                Some(node) => node,
                None => return Err(IndexError::LocationNotFound(id.to_string())),
            };

            let in_place = self.arena.with_node(node, |n| {
                if n.bounding_box.contains(pos) {
                    let mut leaves = n.leaves_write();
                    if let Some(record) = leaves.get_mut(id) {
                        record.position = pos;
                    }
                    true
                } else {
                    false
                }
            });
            if in_place {
                return Ok(());
            }

            existing_data = self.arena.with_node(node, |n| {
                n.leaves_write().remove(id).map(|record| record.data)
            });
            shard.remove(id);
        }

        let data = existing_data.unwrap_or_default();
        self.insert(id, pos, data);
        Ok(())
    }

    /// Replaces `id`'s data payload in place. Does not touch position.
    pub fn update_data(&self, id: &str, data: DataMap) -> IndexResult<()> {
        let shard = self.location_index.write_shard(id);
        let node = shard
            .get(id)
            .copied()
            .ok_or_else(|| IndexError::LocationNotFound(id.to_string()))?;
        self.arena.with_node(node, |n| {
            if let Some(record) = n.leaves_write().get_mut(id) {
                record.data = data;
            }
        });
        Ok(())
    }

    /// The combined move: relocates `id` to `pos` and replaces its data in
    /// one call, carrying `data` through the relocation path if one is
    /// needed.
    pub fn update(&self, id: &str, pos: Position, data: DataMap) -> IndexResult<()> {
        {
            let mut shard = self.location_index.write_shard(id);
            let node = match shard.get(id).copied() {
                Some(node) => node,
                None => return Err(IndexError::LocationNotFound(id.to_string())),
            };

            let in_place = self.arena.with_node(node, |n| {
                if n.bounding_box.contains(pos) {
                    let mut leaves = n.leaves_write();
                    if let Some(record) = leaves.get_mut(id) {
                        record.position = pos;
                        record.data = data.clone();
                    }
                    true
                } else {
                    false
                }
            });
            if in_place {
                return Ok(());
            }

            self.arena.with_node(node, |n| {
                n.leaves_write().remove(id);
            });
            shard.remove(id);
        }

        self.insert(id, pos, data);
        Ok(())
    }

    /// Collects every leaf in `node`'s subtree within `radius_m` of
    /// `query_pos`, recursing through children whose box intersects the
    /// radius (corner heuristic only -- this never tests `contains`, even
    /// for a box the query point is inside).
    fn collect_subtree_within(
        &self,
        node: usize,
        query_pos: Position,
        radius_m: f64,
        out: &mut Vec<NearbyLocation>,
    ) {
        match self.arena.children_of(node) {
            None => {
                self.arena.with_node(node, |n| {
                    for leaf in n.leaves_read().values() {
                        let d = great_circle_distance_m(query_pos, leaf.position);
                        if d <= radius_m {
                            out.push(NearbyLocation {
                                leaf: leaf.clone(),
                                distance_m: d,
                            });
                        }
                    }
                });
            }
            Some(children) => {
                for child in children {
                    let child_box = self.arena.bounding_box_of(child);
                    if intersects_rectangle(query_pos, child_box, radius_m) {
                        self.collect_subtree_within(child, query_pos, radius_m, out);
                    }
                }
            }
        }
    }

    /// Finds ids within `radius_m` of `query_pos`, nearest first, truncated
    /// to `limit`.
    ///
    /// Descends to the seed leaf node that owns `query_pos`, scans it
    /// directly, then walks upward: at each ancestor, tests its three
    /// off-path children against the radius and recursively collects any
    /// that intersect. Ascent stops as soon as an ancestor has zero
    /// intersecting off-path children, since no farther ancestor's
    /// siblings can be any closer than this one's.
    pub fn get_nearby_locations(
        &self,
        query_pos: Position,
        radius_m: f64,
        limit: usize,
    ) -> Vec<NearbyLocation> {
        let mut found = Vec::new();
        let seed = self.descend(query_pos);
        self.arena.with_node(seed, |n| {
            for leaf in n.leaves_read().values() {
                let d = great_circle_distance_m(query_pos, leaf.position);
                if d <= radius_m {
                    found.push(NearbyLocation {
                        leaf: leaf.clone(),
                        distance_m: d,
                    });
                }
            }
        });

        let mut child_on_path = seed;
        let mut ancestor = self.arena.parent_of(seed);
        while let Some(current) = ancestor {
            let siblings = self
                .arena
                .children_of(current)
                .expect("an ancestor of a descended node always has children");
            let mut explored = 0usize;
            for sibling in siblings {
                if sibling == child_on_path {
                    continue;
                }
                let sibling_box = self.arena.bounding_box_of(sibling);
                if intersects_rectangle(query_pos, sibling_box, radius_m) {
                    explored += 1;
                    self.collect_subtree_within(sibling, query_pos, radius_m, &mut found);
                }
            }
            if explored == 0 {
                break;
            }
            child_on_path = current;
            ancestor = self.arena.parent_of(current);
        }

        found.sort_by(|a, b| {
            a.distance_m
                .partial_cmp(&b.distance_m)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.leaf.id.cmp(&b.leaf.id))
        });
        found.truncate(limit);
        found
    }

    /// A snapshot of every leaf in the tree, for the RSM's snapshot path.
    /// Not atomic across nodes.
    pub fn get_all_locations(&self) -> Vec<LeafRecord> {
        let mut out = Vec::new();
        self.collect_all(self.root, &mut out);
        out
    }

    fn collect_all(&self, node: usize, out: &mut Vec<LeafRecord>) {
        match self.arena.children_of(node) {
            None => {
                self.arena.with_node(node, |n| {
                    out.extend(n.leaves_read().values().cloned());
                });
            }
            Some(children) => {
                for child in children {
                    self.collect_all(child, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    #[test]
    fn insert_then_get_round_trips() {
        let tree = QuadTree::new(4);
        tree.insert("a", p(12.97, 77.59), DataMap::new());
        let record = tree.get("a").unwrap();
        assert_eq!(record.id, "a");
        assert_eq!(record.position, p(12.97, 77.59));
    }

    #[test]
    fn get_missing_id_fails() {
        let tree = QuadTree::new(4);
        assert_eq!(
            tree.get("missing").unwrap_err(),
            IndexError::LocationNotFound("missing".to_string())
        );
    }

    #[test]
    fn delete_removes_the_leaf() {
        let tree = QuadTree::new(4);
        tree.insert("a", p(12.97, 77.59), DataMap::new());
        tree.delete("a").unwrap();
        assert!(tree.get("a").is_err());
    }

    #[test]
    fn delete_missing_id_fails() {
        let tree = QuadTree::new(4);
        assert_eq!(
            tree.delete("missing").unwrap_err(),
            IndexError::LocationNotFound("missing".to_string())
        );
    }

    #[test]
    fn update_location_moves_across_subtrees() {
        let tree = QuadTree::new(4);
        tree.insert("a", p(80.0, -170.0), DataMap::new());
        tree.update_location("a", p(-80.0, 170.0)).unwrap();
        let record = tree.get("a").unwrap();
        assert_eq!(record.position, p(-80.0, 170.0));
    }

    #[test]
    fn update_data_preserves_position() {
        let tree = QuadTree::new(4);
        tree.insert("a", p(12.97, 77.59), DataMap::new());
        let mut data = DataMap::new();
        data.insert("k".to_string(), serde_json::json!("v"));
        tree.update_data("a", data.clone()).unwrap();
        let record = tree.get("a").unwrap();
        assert_eq!(record.position, p(12.97, 77.59));
        assert_eq!(record.data, data);
    }

    #[test]
    fn get_all_locations_sees_every_insert() {
        let tree = QuadTree::new(4);
        for i in 0..20 {
            let lat = -80.0 + (i as f64) * 7.0;
            tree.insert(&format!("id-{i}"), p(lat, 10.0), DataMap::new());
        }
        assert_eq!(tree.get_all_locations().len(), 20);
    }

    #[test]
    fn get_nearby_locations_finds_close_points_and_sorts_by_distance() {
        let tree = QuadTree::new(6);
        let center = p(12.9660637, 77.7157481);
        tree.insert("near", p(12.9660737, 77.7157581), DataMap::new());
        tree.insert("mid", p(12.9700000, 77.7200000), DataMap::new());
        tree.insert("far", p(50.0, 50.0), DataMap::new());

        let results = tree.get_nearby_locations(center, 5_000.0, 10);
        let ids: Vec<&str> = results.iter().map(|r| r.leaf.id.as_str()).collect();
        assert!(ids.contains(&"near"));
        assert!(!ids.contains(&"far"));
        for pair in results.windows(2) {
            assert!(pair[0].distance_m <= pair[1].distance_m);
        }
    }

    #[test]
    fn get_nearby_locations_respects_limit() {
        let tree = QuadTree::new(5);
        let center = p(0.0, 0.0);
        for i in 0..10 {
            tree.insert(&format!("id-{i}"), p(0.0001 * i as f64, 0.0), DataMap::new());
        }
        let results = tree.get_nearby_locations(center, 1_000_000.0, 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn insert_overwrites_duplicate_id() {
        let tree = QuadTree::new(4);
        tree.insert("a", p(10.0, 10.0), DataMap::new());
        tree.insert("a", p(-10.0, -10.0), DataMap::new());
        assert_eq!(tree.get("a").unwrap().position, p(-10.0, -10.0));
        assert_eq!(tree.get_all_locations().len(), 1);
    }
}
