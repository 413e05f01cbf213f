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

use std::error::Error;
use std::fmt;

/// Helper type for a call that could go wrong inside `quadrille-geo`.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors raised while constructing or validating geometry primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// Latitude outside of `[-90, 90]`.
    InvalidLatitude(f64),
    /// Longitude outside of `[-180, 180]`.
    InvalidLongitude(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GeoError::InvalidLatitude(lat) => {
                write!(f, "latitude {} is outside of the valid range [-90, 90]", lat)
            }
            GeoError::InvalidLongitude(lon) => write!(
                f,
                "longitude {} is outside of the valid range [-180, 180]",
                lon
            ),
        }
    }
}

impl Error for GeoError {}
