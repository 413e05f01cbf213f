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

use crate::position::Position;
use crate::rectangle::Rectangle;

/// Mean Earth radius, in metres, used by [`great_circle_distance_m`].
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle (haversine) distance between two points, in metres.
///
/// Symmetric and non-negative; zero iff `p` and `q` are equal to float
/// precision. This is a spherical-earth approximation, not a geodesic
/// (ellipsoidal) distance -- adequate for the radii this system deals in,
/// per the stated non-goal of geodesic precision.
pub fn great_circle_distance_m(p: Position, q: Position) -> f64 {
    let lat1 = p.lat().to_radians();
    let lat2 = q.lat().to_radians();
    let dlat = (q.lat() - p.lat()).to_radians();
    let dlon = (q.lon() - p.lon()).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Euclidean distance between two points' raw lat/lon degrees.
///
/// Not a metric on the sphere -- it is used only as a cheap heuristic for
/// picking the "nearest" of a rectangle's four corners, where all that
/// matters is a consistent ranking among the four candidates, not an
/// accurate absolute distance.
pub fn euclidean_degree_distance(p: Position, q: Position) -> f64 {
    let dlat = p.lat() - q.lat();
    let dlon = p.lon() - q.lon();
    (dlat * dlat + dlon * dlon).sqrt()
}

/// True iff the great-circle distance from `p` to `rect`'s nearest corner is
/// strictly less than `radius_m`.
///
/// This is an outer approximation of "could this rectangle hold a point
/// within `radius_m` of `p`": testing only the nearest corner can miss
/// true positives when `p` lies inside `rect` but closer to no single
/// corner than `radius_m` (see the crate-level docs). The upward walk in
/// the quadtree's range query tolerates this because the seed node -- the
/// one actually containing the query point -- is always scanned directly,
/// corner heuristic notwithstanding.
pub fn intersects_rectangle(p: Position, rect: Rectangle, radius_m: f64) -> bool {
    great_circle_distance_m(p, rect.nearest_corner(p)) < radius_m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let a = p(12.9660637, 77.7157481);
        assert_approx_eq!(great_circle_distance_m(a, a), 0.0, 1e-6);
    }

    #[test]
    fn symmetric() {
        let a = p(12.9660637, 77.7157481);
        let b = p(12.9649603, 77.7164898);
        assert_approx_eq!(
            great_circle_distance_m(a, b),
            great_circle_distance_m(b, a),
            1e-9
        );
    }

    #[test]
    fn known_distance_bangalore_points() {
        // Two points roughly 140m apart in Bangalore; allow generous slack
        // since this is a sanity check on the formula, not a golden value.
        let a = p(12.9660637, 77.7157481);
        let b = p(12.9649603, 77.7164898);
        let d = great_circle_distance_m(a, b);
        assert!(d > 100.0 && d < 200.0, "unexpected distance {}", d);
    }

    #[test]
    fn intersects_rectangle_is_strict() {
        let rect = Rectangle::new(p(1.0, -1.0), p(-1.0, 1.0));
        let far = p(50.0, 50.0);
        assert!(!intersects_rectangle(far, rect, 1.0));
    }
}
