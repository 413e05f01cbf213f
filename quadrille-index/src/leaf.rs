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

use quadrille_geo::Position;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Caller-supplied metadata attached to a location, as an arbitrary bag of
/// JSON values. Opaque to the index: it is stored and returned as-is, never
/// interpreted.
pub type DataMap = HashMap<String, Value>;

/// One leaf of the quadtree: a located id plus its data, as stored inside a
/// node's leaf dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafRecord {
    pub id: String,
    pub position: Position,
    pub data: DataMap,
}

impl LeafRecord {
    pub fn new(id: impl Into<String>, position: Position, data: DataMap) -> LeafRecord {
        LeafRecord {
            id: id.into(),
            position,
            data,
        }
    }
}
