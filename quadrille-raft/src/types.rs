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

//! Raft type wiring: the node id/address types and the command/response
//! types that flow through the log.

use crate::command::Command;
use openraft::BasicNode;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// The response an applied [`Command`] yields back to its submitter. `Ok`
/// unless the quadtree itself rejected the operation (e.g. deleting an id a
/// concurrent, earlier-indexed command already removed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn ok() -> Self {
        CommandResponse { error: None }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        CommandResponse { error: Some(msg.into()) }
    }
}

openraft::declare_raft_types!(
    /// The concrete Raft type parameterization for this replica.
    pub TypeConfig:
        D = Command,
        R = CommandResponse,
        NodeId = u64,
        Node = BasicNode,
        Entry = openraft::Entry<TypeConfig>,
        SnapshotData = Cursor<Vec<u8>>,
);

pub type Raft = openraft::Raft<TypeConfig>;
