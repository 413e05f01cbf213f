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

use crate::errors::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the WGS84 lat/lon plane.
///
/// Latitude and longitude are double-precision degrees. Construction is the
/// only place bounds are enforced; once built, a `Position` is known-valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    lat: f64,
    lon: f64,
}

impl Position {
    /// Builds a `Position`, rejecting out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> GeoResult<Position> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(GeoError::InvalidLongitude(lon));
        }
        Ok(Position { lat, lon })
    }

    /// Latitude, in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude, in degrees.
    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(Position::new(91.0, 0.0).is_err());
        assert!(Position::new(-91.0, 0.0).is_err());
        assert!(Position::new(0.0, 181.0).is_err());
        assert!(Position::new(0.0, -181.0).is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(Position::new(90.0, 180.0).is_ok());
        assert!(Position::new(-90.0, -180.0).is_ok());
    }
}
