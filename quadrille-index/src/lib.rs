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

//! A fixed-depth, concurrently readable/writable region quadtree over the
//! lat/lon plane, plus the sharded reverse index that lets lookups by
//! location-id avoid a descent.
//!
//! Node identity is a plain arena index rather than a reference-counted
//! pointer: a quadtree node's parent and children would otherwise hold
//! strong references to each other, a cycle neither side can break.

pub mod errors;
mod facade;
mod leaf;
mod node;
mod shard_map;
mod tree;

pub use errors::{IndexError, IndexResult};
pub use facade::Quadrille;
pub use leaf::{DataMap, LeafRecord};
pub use shard_map::SHARD_COUNT;
pub use tree::{NearbyLocation, QuadTree, DEFAULT_HEIGHT};
