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

use quadrille_index::IndexError;
use std::error::Error;
use std::fmt;
use std::io;

/// Helper type for a call that could go wrong inside `quadrille-raft`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the replicated store, above and beyond what the
/// underlying quadtree raises on its own.
#[derive(Debug)]
pub enum StoreError {
    /// A write, Join, or Remove was attempted against a non-leader node.
    NotLeader,
    /// `Join`'s reachability probe could not open a socket to the address.
    AddressNotReachable(String),
    /// The quadtree rejected an operation dispatched from `Apply`.
    Index(IndexError),
    /// `Apply` could not decode a log entry into a known command.
    MalformedCommand(String),
    /// Consensus itself failed or timed out.
    Raft(String),
    /// Persistence I/O (redb, snapshot encode/decode) failed.
    Io(io::Error),
    /// A command or snapshot payload failed to (de)serialize.
    Codec(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::NotLeader => write!(f, "this node is not the current raft leader"),
            StoreError::AddressNotReachable(addr) => {
                write!(f, "address '{}' did not respond to the reachability probe", addr)
            }
            StoreError::Index(e) => write!(f, "{}", e),
            StoreError::MalformedCommand(msg) => write!(f, "malformed command: {}", msg),
            StoreError::Raft(msg) => write!(f, "raft error: {}", msg),
            StoreError::Io(e) => write!(f, "i/o error: {}", e),
            StoreError::Codec(msg) => write!(f, "codec error: {}", msg),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Index(e) => Some(e),
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IndexError> for StoreError {
    fn from(e: IndexError) -> Self {
        StoreError::Index(e)
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}
