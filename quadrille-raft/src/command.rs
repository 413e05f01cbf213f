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

//! Log command encoding: every write submitted to Raft becomes one of
//! these, keyed rather than positional, so a future field addition can be
//! distinguished from log corruption by readers still on an older binary.

use quadrille_index::DataMap;
use serde::{Deserialize, Serialize};

/// The current (and, so far, only) command wire version.
pub const COMMAND_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Insert {
        version: u8,
        location_id: String,
        lat: f64,
        long: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<DataMap>,
    },
    Delete {
        version: u8,
        location_id: String,
    },
    Update {
        version: u8,
        location_id: String,
        lat: f64,
        long: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<DataMap>,
    },
    UpdateLocation {
        version: u8,
        location_id: String,
        lat: f64,
        long: f64,
    },
    UpdateData {
        version: u8,
        location_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<DataMap>,
    },
}

impl Command {
    pub fn insert(location_id: impl Into<String>, lat: f64, long: f64, data: DataMap) -> Command {
        Command::Insert {
            version: COMMAND_VERSION,
            location_id: location_id.into(),
            lat,
            long,
            data: Some(data),
        }
    }

    pub fn delete(location_id: impl Into<String>) -> Command {
        Command::Delete {
            version: COMMAND_VERSION,
            location_id: location_id.into(),
        }
    }

    pub fn update(location_id: impl Into<String>, lat: f64, long: f64, data: DataMap) -> Command {
        Command::Update {
            version: COMMAND_VERSION,
            location_id: location_id.into(),
            lat,
            long,
            data: Some(data),
        }
    }

    pub fn update_location(location_id: impl Into<String>, lat: f64, long: f64) -> Command {
        Command::UpdateLocation {
            version: COMMAND_VERSION,
            location_id: location_id.into(),
            lat,
            long,
        }
    }

    pub fn update_data(location_id: impl Into<String>, data: DataMap) -> Command {
        Command::UpdateData {
            version: COMMAND_VERSION,
            location_id: location_id.into(),
            data: Some(data),
        }
    }

    pub fn version(&self) -> u8 {
        match self {
            Command::Insert { version, .. }
            | Command::Delete { version, .. }
            | Command::Update { version, .. }
            | Command::UpdateLocation { version, .. }
            | Command::UpdateData { version, .. } => *version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_round_trips_through_json() {
        let cmd = Command::insert("a", 12.9, 77.7, DataMap::new());
        let encoded = serde_json::to_vec(&cmd).unwrap();
        let decoded: Command = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded.version(), COMMAND_VERSION);
        match decoded {
            Command::Insert { location_id, lat, long, .. } => {
                assert_eq!(location_id, "a");
                assert_eq!(lat, 12.9);
                assert_eq!(long, 77.7);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn delete_omits_absent_fields() {
        let cmd = Command::delete("a");
        let encoded = serde_json::to_string(&cmd).unwrap();
        assert!(!encoded.contains("\"data\""));
        assert!(!encoded.contains("\"lat\""));
    }
}
