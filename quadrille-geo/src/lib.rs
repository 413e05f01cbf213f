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

//! # Quadrille Geo
//!
//! Lat/lon geometry primitives shared by the quadtree and its range queries:
//! a validated [`Position`], an axis-aligned [`Rectangle`] on the lat/lon plane,
//! and the great-circle/Euclidean distance functions used to partition and
//! search the tree.
//!
//! Nothing in this crate is geodesic-exact: distances use a spherical-earth
//! (haversine) approximation, which is the precision the rest of the system
//! is built against. See [`distance::intersects_rectangle`] for the one place
//! this approximation is a documented, intentional outer bound rather than a
//! true nearest-point test.

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

mod distance;
mod errors;
mod position;
mod rectangle;

pub use distance::{euclidean_degree_distance, great_circle_distance_m, intersects_rectangle};
pub use errors::{GeoError, GeoResult};
pub use position::Position;
pub use rectangle::Rectangle;
