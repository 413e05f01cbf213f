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

//! The thin capability surface consumed by the replicated state machine and
//! by read paths, independent of any particular index implementation.

use crate::errors::IndexResult;
use crate::leaf::{DataMap, LeafRecord};
use crate::tree::NearbyLocation;
use quadrille_geo::Position;

/// Everything a replicated state machine or a read handler needs from the
/// geospatial index. [`crate::QuadTree`] is the only implementation today;
/// the trait exists so the state machine can be built and tested against a
/// substitute index without pulling in the whole tree.
pub trait Quadrille: Send + Sync {
    fn insert(&self, id: &str, pos: Position, data: DataMap);
    fn delete(&self, id: &str) -> IndexResult<()>;
    fn update(&self, id: &str, pos: Position, data: DataMap) -> IndexResult<()>;
    fn update_location(&self, id: &str, pos: Position) -> IndexResult<()>;
    fn update_data(&self, id: &str, data: DataMap) -> IndexResult<()>;
    fn get(&self, id: &str) -> IndexResult<LeafRecord>;
    fn get_nearby_locations(&self, pos: Position, radius_m: f64, limit: usize) -> Vec<NearbyLocation>;
    fn get_all_locations(&self) -> Vec<LeafRecord>;
}

impl Quadrille for crate::tree::QuadTree {
    fn insert(&self, id: &str, pos: Position, data: DataMap) {
        crate::tree::QuadTree::insert(self, id, pos, data)
    }

    fn delete(&self, id: &str) -> IndexResult<()> {
        crate::tree::QuadTree::delete(self, id)
    }

    fn update(&self, id: &str, pos: Position, data: DataMap) -> IndexResult<()> {
        crate::tree::QuadTree::update(self, id, pos, data)
    }

    fn update_location(&self, id: &str, pos: Position) -> IndexResult<()> {
        crate::tree::QuadTree::update_location(self, id, pos)
    }

    fn update_data(&self, id: &str, data: DataMap) -> IndexResult<()> {
        crate::tree::QuadTree::update_data(self, id, data)
    }

    fn get(&self, id: &str) -> IndexResult<LeafRecord> {
        crate::tree::QuadTree::get(self, id)
    }

    fn get_nearby_locations(&self, pos: Position, radius_m: f64, limit: usize) -> Vec<NearbyLocation> {
        crate::tree::QuadTree::get_nearby_locations(self, pos, radius_m, limit)
    }

    fn get_all_locations(&self) -> Vec<LeafRecord> {
        crate::tree::QuadTree::get_all_locations(self)
    }
}
