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

use crate::distance::euclidean_degree_distance;
use crate::position::Position;
use std::fmt;

/// An axis-aligned rectangle on the lat/lon plane, stored as two opposing
/// corners. The corners are not normalized on construction: `contains` and
/// `quadrants` both tolerate `corner1`/`corner2` being given in either order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    corner1: Position,
    corner2: Position,
}

impl Rectangle {
    /// Builds a rectangle from two opposing corners, in any order.
    pub fn new(corner1: Position, corner2: Position) -> Rectangle {
        Rectangle { corner1, corner2 }
    }

    /// The first corner, as given at construction.
    #[inline]
    pub fn corner1(&self) -> Position {
        self.corner1
    }

    /// The second corner, as given at construction.
    #[inline]
    pub fn corner2(&self) -> Position {
        self.corner2
    }

    fn bounds(&self) -> (f64, f64, f64, f64) {
        let (mut min_lat, mut max_lat) = (self.corner1.lat(), self.corner2.lat());
        if min_lat > max_lat {
            std::mem::swap(&mut min_lat, &mut max_lat);
        }
        let (mut min_lon, mut max_lon) = (self.corner1.lon(), self.corner2.lon());
        if min_lon > max_lon {
            std::mem::swap(&mut min_lon, &mut max_lon);
        }
        (min_lat, max_lat, min_lon, max_lon)
    }

    /// All four corners of the rectangle, in a fixed order: `corner1`,
    /// `corner2`, `(corner1.lat, corner2.lon)`, `(corner2.lat, corner1.lon)`.
    ///
    /// This order matters: it is the tie-break order used by
    /// [`Rectangle::nearest_corner`].
    pub fn corners(&self) -> [Position; 4] {
        // Both corner1/corner2 came from a previously validated Position, and
        // recombining their lat/lon components can't produce an out-of-range
        // coordinate, so these two constructions cannot fail.
        let corner3 = Position::new(self.corner1.lat(), self.corner2.lon())
            .expect("recombined in-range coordinates");
        let corner4 = Position::new(self.corner2.lat(), self.corner1.lon())
            .expect("recombined in-range coordinates");
        [self.corner1, self.corner2, corner3, corner4]
    }

    /// The corner nearest `p` by raw Euclidean degree distance. Ties are
    /// broken by the iteration order of [`Rectangle::corners`].
    pub fn nearest_corner(&self, p: Position) -> Position {
        self.corners()
            .into_iter()
            .min_by(|a, b| {
                euclidean_degree_distance(*a, p)
                    .partial_cmp(&euclidean_degree_distance(*b, p))
                    .expect("coordinates are always finite")
            })
            .expect("corners() always yields exactly four positions")
    }

    /// True iff `p` falls within the rectangle's bounds, inclusive on both
    /// ends, regardless of which corner was given first.
    pub fn contains(&self, p: Position) -> bool {
        let (min_lat, max_lat, min_lon, max_lon) = self.bounds();
        p.lat() >= min_lat && p.lat() <= max_lat && p.lon() >= min_lon && p.lon() <= max_lon
    }

    /// Splits the rectangle into four equal quadrants around its midpoint,
    /// in a fixed order (each paired with one original corner and the
    /// midpoint on the other axis).
    pub fn quadrants(&self) -> [Rectangle; 4] {
        let (lat1, lon1) = (self.corner1.lat(), self.corner1.lon());
        let (lat2, lon2) = (self.corner2.lat(), self.corner2.lon());
        let mid = Position::new((lat1 + lat2) / 2.0, (lon1 + lon2) / 2.0)
            .expect("midpoint of two in-range coordinates is in range");

        let quad1 = Rectangle::new(Position::new(lat1, lon1).unwrap(), mid);
        let quad2 = Rectangle::new(Position::new(lat2, lon1).unwrap(), mid);
        let quad3 = Rectangle::new(Position::new(lat1, lon2).unwrap(), mid);
        let quad4 = Rectangle::new(Position::new(lat2, lon2).unwrap(), mid);
        [quad1, quad2, quad3, quad4]
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.corner1, self.corner2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    #[test]
    fn contains_normalizes_swapped_corners() {
        let r = Rectangle::new(p(-10.0, 10.0), p(10.0, -10.0));
        assert!(r.contains(p(0.0, 0.0)));
        assert!(r.contains(p(10.0, 10.0)));
        assert!(r.contains(p(-10.0, -10.0)));
        assert!(!r.contains(p(11.0, 0.0)));
    }

    #[test]
    fn quadrants_partition_the_rectangle() {
        let root = Rectangle::new(p(90.0, -180.0), p(-90.0, 180.0));
        let quads = root.quadrants();
        // Every quadrant midpoint falls within exactly that quadrant and
        // the root.
        for q in &quads {
            let mid = q.nearest_corner(p(0.0, 0.0));
            assert!(root.contains(mid));
        }
    }

    #[test]
    fn nearest_corner_tie_break_order() {
        // A square centered on the origin: all four corners are equidistant
        // from the center, so the tie-break order (corner1 first) applies.
        let r = Rectangle::new(p(1.0, -1.0), p(-1.0, 1.0));
        assert_eq!(r.nearest_corner(p(0.0, 0.0)), r.corner1());
    }
}
