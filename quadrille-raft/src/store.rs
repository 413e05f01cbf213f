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

//! The top-level replicated store: the capability surface the out-of-scope
//! gateways are built on. Writes are submitted to Raft and only succeed
//! once committed and locally applied; reads bypass Raft entirely.

use crate::command::Command;
use crate::config::StoreConfig;
use crate::errors::{StoreError, StoreResult};
use crate::log_store::LogStore;
use crate::network::NetworkFactory;
use crate::port_probe::is_service_available;
use crate::state_machine::StateMachine;
use crate::types::{Raft, TypeConfig};
use openraft::{BasicNode, Config};
use quadrille_geo::Position;
use quadrille_index::{DataMap, LeafRecord, NearbyLocation};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// One member of the cluster, as reported by [`ReplicatedStore::nodes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    pub id: u64,
    pub addr: String,
}

pub struct ReplicatedStore {
    raft: Raft,
    tree: Arc<RwLock<quadrille_index::QuadTree>>,
    node_id: u64,
}

impl ReplicatedStore {
    /// Opens a replica: wires up the log store, state machine, network
    /// factory, and `openraft::Raft` core, then (if `enable_single`) bootstraps
    /// a fresh one-member cluster with this node as its sole, and therefore
    /// leading, member.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let node_id: u64 = fxhash::hash64(config.node_id().as_bytes());

        let log_store = LogStore::open(config.raft_dir().join("raft.redb"))
            .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        let mut state_machine = StateMachine::new(config.quadtree_height());
        let tree = state_machine.tree_handle();

        let raft_config = Arc::new(
            Config {
                heartbeat_interval: 250,
                election_timeout_min: 1000,
                election_timeout_max: 2000,
                ..Default::default()
            }
            .validate()
            .map_err(|e| StoreError::Raft(e.to_string()))?,
        );

        let raft = Raft::new(node_id, raft_config, NetworkFactory, log_store, state_machine)
            .await
            .map_err(|e| StoreError::Raft(e.to_string()))?;

        if config.enable_single() {
            let mut members = BTreeMap::new();
            members.insert(node_id, BasicNode { addr: config.raft_bind().to_string() });
            raft.initialize(members).await.map_err(|e| StoreError::Raft(e.to_string()))?;
        }

        spawn_leader_change_logger(raft.metrics());

        Ok(ReplicatedStore { raft, tree, node_id })
    }

    async fn require_leader(&self) -> StoreResult<()> {
        if self.raft.current_leader().await == Some(self.node_id) {
            Ok(())
        } else {
            Err(StoreError::NotLeader)
        }
    }

    async fn submit(&self, command: Command) -> StoreResult<()> {
        self.require_leader().await?;
        let response = tokio::time::timeout(crate::config::RAFT_TIMEOUT, self.raft.client_write(command))
            .await
            .map_err(|_| StoreError::Raft("client_write timed out".to_string()))?
            .map_err(|e| StoreError::Raft(e.to_string()))?;
        match response.response().error.clone() {
            None => Ok(()),
            Some(msg) => Err(StoreError::Index(quadrille_index::IndexError::LocationNotFound(msg))),
        }
    }

    pub async fn insert(&self, location_id: &str, pos: Position, data: DataMap) -> StoreResult<()> {
        self.submit(Command::insert(location_id, pos.lat(), pos.lon(), data)).await
    }

    pub async fn update(&self, location_id: &str, pos: Position, data: DataMap) -> StoreResult<()> {
        self.submit(Command::update(location_id, pos.lat(), pos.lon(), data)).await
    }

    pub async fn update_location(&self, location_id: &str, pos: Position) -> StoreResult<()> {
        self.submit(Command::update_location(location_id, pos.lat(), pos.lon())).await
    }

    pub async fn update_data(&self, location_id: &str, data: DataMap) -> StoreResult<()> {
        self.submit(Command::update_data(location_id, data)).await
    }

    /// Pre-checks existence locally before submitting, so a delete of an
    /// id nobody holds never burdens the log with a no-op write.
    pub async fn delete(&self, location_id: &str) -> StoreResult<()> {
        self.require_leader().await?;
        {
            let tree = self.tree.read().unwrap_or_else(|poison| poison.into_inner());
            if tree.get(location_id).is_err() {
                return Err(StoreError::Index(quadrille_index::IndexError::NonExistentLocationDelete(
                    location_id.to_string(),
                )));
            }
        }
        self.submit(Command::delete(location_id)).await
    }

    /// Served directly from the local quadtree, bypassing Raft -- stale
    /// reads are expected and acceptable.
    pub fn get(&self, location_id: &str) -> StoreResult<LeafRecord> {
        let tree = self.tree.read().unwrap_or_else(|poison| poison.into_inner());
        Ok(tree.get(location_id)?)
    }

    pub fn get_nearby_locations(&self, pos: Position, radius_m: f64, limit: usize) -> Vec<NearbyLocation> {
        let tree = self.tree.read().unwrap_or_else(|poison| poison.into_inner());
        tree.get_nearby_locations(pos, radius_m, limit)
    }

    /// Leader-only. Probes the joining node's address before admitting it;
    /// if an existing voter collides on id or address, removes it first.
    pub async fn join(&self, node_id: u64, addr: &str) -> StoreResult<()> {
        self.require_leader().await?;
        if !is_service_available(addr) {
            log::warn!("rejecting join of node {} at {}: address not reachable", node_id, addr);
            return Err(StoreError::AddressNotReachable(addr.to_string()));
        }

        let mut membership = self.raft.metrics().borrow().membership_config.clone();
        for (id, node) in membership.nodes() {
            let same_id = *id == node_id;
            let same_addr = node.addr == addr;
            if same_id && same_addr {
                log::info!("join of node {} at {} is a no-op, already a member", node_id, addr);
                return Ok(());
            }
            if same_id || same_addr {
                let mut remaining: BTreeMap<u64, BasicNode> =
                    membership.nodes().map(|(id, n)| (*id, n.clone())).collect();
                remaining.remove(id);
                self.raft
                    .change_membership(remaining.keys().copied().collect::<Vec<_>>(), false)
                    .await
                    .map_err(|e| StoreError::Raft(e.to_string()))?;
                log::info!("removed colliding voter {} before admitting node {} at {}", id, node_id, addr);
                membership = self.raft.metrics().borrow().membership_config.clone();
                break;
            }
        }

        let mut voters: Vec<u64> = membership.nodes().map(|(id, _)| *id).collect();
        voters.push(node_id);
        self.raft
            .change_membership(voters, false)
            .await
            .map_err(|e| StoreError::Raft(e.to_string()))?;
        log::info!("admitted node {} at {} as a voter", node_id, addr);
        Ok(())
    }

    pub async fn remove(&self, node_id: u64) -> StoreResult<()> {
        self.require_leader().await?;
        let membership = self.raft.metrics().borrow().membership_config.clone();
        let voters: Vec<u64> = membership.nodes().map(|(id, _)| *id).filter(|id| *id != node_id).collect();
        self.raft
            .change_membership(voters, false)
            .await
            .map_err(|e| StoreError::Raft(e.to_string()))?;
        log::info!("removed node {} from the voter set", node_id);
        Ok(())
    }

    /// The cluster's members, sorted by id ascending.
    pub fn nodes(&self) -> Vec<ClusterNode> {
        let membership = self.raft.metrics().borrow().membership_config.clone();
        let mut nodes: Vec<ClusterNode> = membership
            .nodes()
            .map(|(id, node)| ClusterNode { id: *id, addr: node.addr.clone() })
            .collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    pub fn is_leader(&self) -> bool {
        self.raft.metrics().borrow().current_leader == Some(self.node_id)
    }

    /// The current leader's address, looked up from the membership table --
    /// not its raw node id, since the contract hands callers something they
    /// can dial.
    pub fn leader(&self) -> Option<String> {
        let metrics = self.raft.metrics();
        let guard = metrics.borrow();
        let leader_id = guard.current_leader?;
        guard.membership_config.nodes().find(|(id, _)| **id == leader_id).map(|(_, node)| node.addr.clone())
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }
}

/// Watches the metrics channel for the life of the process and logs every
/// leader transition, including the loss of a leader entirely.
fn spawn_leader_change_logger(mut metrics: tokio::sync::watch::Receiver<openraft::RaftMetrics<TypeConfig>>) {
    tokio::spawn(async move {
        let mut last_leader = metrics.borrow().current_leader;
        while metrics.changed().await.is_ok() {
            let current_leader = metrics.borrow().current_leader;
            if current_leader != last_leader {
                log::info!("leader changed from {:?} to {:?}", last_leader, current_leader);
                last_leader = current_leader;
            }
        }
    });
}
