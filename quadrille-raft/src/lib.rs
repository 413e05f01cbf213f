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

//! The Raft-replicated state machine wrapping `quadrille-index`'s quadtree:
//! command log, snapshotting, membership, and the consensus transport.
//!
//! Writes are serialized through Raft and applied deterministically on
//! every replica; reads are served from local state without involving
//! consensus at all.

pub mod command;
pub mod config;
pub mod errors;
mod log_store;
mod network;
mod port_probe;
mod state_machine;
mod store;
mod types;

pub use command::Command;
pub use config::{StoreConfig, RAFT_TIMEOUT, RETAIN_SNAPSHOT_COUNT};
pub use errors::{StoreError, StoreResult};
pub use network::serve as serve_raft_transport;
pub use port_probe::is_service_available;
pub use store::{ClusterNode, ReplicatedStore};
pub use types::{CommandResponse, Raft, TypeConfig};
