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

//! Process-wide configuration for one replica.

use quadrille_index::DEFAULT_HEIGHT;
use std::path::PathBuf;
use std::time::Duration;

/// Number of snapshots the Raft log store retains before truncating older
/// ones.
pub const RETAIN_SNAPSHOT_COUNT: usize = 2;

/// How long a leader-submitted write waits for `client_write` to commit
/// before giving up.
pub const RAFT_TIMEOUT: Duration = Duration::from_secs(10);

/// A construction object for one replica. See the field docs below for what
/// each setting controls; [`StoreConfig::build_defaults`] seeds the
/// not-yet-set fields that most callers leave alone.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub(crate) node_id: String,
    pub(crate) raft_dir: PathBuf,
    pub(crate) raft_bind: String,
    pub(crate) http_bind: Option<String>,
    pub(crate) tcp_bind: Option<String>,
    pub(crate) join_addr: Option<String>,
    pub(crate) quadtree_height: usize,
    pub(crate) enable_single: bool,
}

impl StoreConfig {
    /// Creates a builder with the required identity fields; everything else
    /// defaults (quadtree height 16, no gateway addresses stored, single-node
    /// bootstrap off).
    pub fn new(node_id: impl Into<String>, raft_dir: impl Into<PathBuf>, raft_bind: impl Into<String>) -> Self {
        StoreConfig {
            node_id: node_id.into(),
            raft_dir: raft_dir.into(),
            raft_bind: raft_bind.into(),
            http_bind: None,
            tcp_bind: None,
            join_addr: None,
            quadtree_height: DEFAULT_HEIGHT,
            enable_single: false,
        }
    }

    /// Stores the HTTP gateway's bind address. Unused by the core itself;
    /// carried only so the out-of-scope gateway can read it back.
    pub fn set_http_bind(&mut self, addr: impl Into<String>) -> &mut Self {
        self.http_bind = Some(addr.into());
        self
    }

    /// Stores the line-oriented TCP gateway's bind address. Same caveat as
    /// `set_http_bind`.
    pub fn set_tcp_bind(&mut self, addr: impl Into<String>) -> &mut Self {
        self.tcp_bind = Some(addr.into());
        self
    }

    /// Address of an existing cluster member to join on startup.
    pub fn set_join_addr(&mut self, addr: impl Into<String>) -> &mut Self {
        self.join_addr = Some(addr.into());
        self
    }

    /// Overrides the quadtree height. Defaults to
    /// [`quadrille_index::DEFAULT_HEIGHT`]; mainly useful for tests that
    /// want a shallow tree.
    pub fn set_quadtree_height(&mut self, height: usize) -> &mut Self {
        self.quadtree_height = height;
        self
    }

    /// Marks this node as the sole bootstrap member of a new cluster: it
    /// becomes leader of a one-member cluster with no join required.
    pub fn set_enable_single(&mut self, enable: bool) -> &mut Self {
        self.enable_single = enable;
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn raft_dir(&self) -> &PathBuf {
        &self.raft_dir
    }

    pub fn raft_bind(&self) -> &str {
        &self.raft_bind
    }

    pub fn join_addr(&self) -> Option<&str> {
        self.join_addr.as_deref()
    }

    pub fn quadtree_height(&self) -> usize {
        self.quadtree_height
    }

    pub fn enable_single(&self) -> bool {
        self.enable_single
    }
}
