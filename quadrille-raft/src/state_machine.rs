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

//! The deterministic state machine: applies committed commands to the
//! quadtree, and produces/consumes snapshots for log compaction.
//!
//! Apply must never panic on a well-formed command -- a quadtree error
//! (e.g. deleting an id a concurrent, earlier-indexed command already
//! removed) is a normal at-most-once outcome and is folded into the
//! response, not propagated as a storage error.

use crate::command::Command;
use crate::types::{CommandResponse, TypeConfig};
use openraft::storage::{RaftStateMachine, Snapshot};
use openraft::{
    EntryPayload, LogId, OptionalSend, RaftSnapshotBuilder, SnapshotMeta, StorageError, StoredMembership,
};
use quadrille_geo::Position;
use quadrille_index::{DataMap, LeafRecord, QuadTree};
use std::io::Cursor;
use std::sync::{Arc, RwLock};

/// A `(position, data)` record keyed by location-id -- the snapshot wire
/// format, self-describing like the command log.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SnapshotRecord {
    lat: f64,
    long: f64,
    data: DataMap,
}

fn snapshot_bytes(tree: &QuadTree) -> Result<Vec<u8>, serde_json::Error> {
    let snapshot: std::collections::HashMap<String, SnapshotRecord> = tree
        .get_all_locations()
        .into_iter()
        .map(|leaf: LeafRecord| {
            (
                leaf.id,
                SnapshotRecord {
                    lat: leaf.position.lat(),
                    long: leaf.position.lon(),
                    data: leaf.data,
                },
            )
        })
        .collect();
    serde_json::to_vec(&snapshot)
}

fn apply_command(tree: &QuadTree, command: Command) -> CommandResponse {
    let result = match command {
        Command::Insert { location_id, lat, long, data, .. } => {
            let pos = match Position::new(lat, long) {
                Ok(pos) => pos,
                Err(e) => return CommandResponse::failed(e.to_string()),
            };
            tree.insert(&location_id, pos, data.unwrap_or_default());
            Ok(())
        }
        Command::Delete { location_id, .. } => tree.delete(&location_id),
        Command::Update { location_id, lat, long, data, .. } => match Position::new(lat, long) {
            Ok(pos) => tree.update(&location_id, pos, data.unwrap_or_default()),
            Err(e) => return CommandResponse::failed(e.to_string()),
        },
        Command::UpdateLocation { location_id, lat, long, .. } => match Position::new(lat, long) {
            Ok(pos) => tree.update_location(&location_id, pos),
            Err(e) => return CommandResponse::failed(e.to_string()),
        },
        Command::UpdateData { location_id, data, .. } => tree.update_data(&location_id, data.unwrap_or_default()),
    };

    match result {
        Ok(()) => CommandResponse::ok(),
        Err(e) => {
            log::error!("apply failed: {}", e);
            CommandResponse::failed(e.to_string())
        }
    }
}

/// Holds the live quadtree plus the bookkeeping `openraft` needs to resume
/// applying after a restart: the last applied log id and the last known
/// membership configuration.
pub struct StateMachine {
    tree: Arc<RwLock<QuadTree>>,
    quadtree_height: usize,
    last_applied: Option<LogId<TypeConfig>>,
    last_membership: StoredMembership<TypeConfig>,
}

impl StateMachine {
    pub fn new(quadtree_height: usize) -> Self {
        StateMachine {
            tree: Arc::new(RwLock::new(QuadTree::new(quadtree_height))),
            quadtree_height,
            last_applied: None,
            last_membership: StoredMembership::default(),
        }
    }

    /// A handle read paths (`Get`, `GetNearbyLocations`) can clone cheaply
    /// and query without going through Raft.
    pub fn tree_handle(&self) -> Arc<RwLock<QuadTree>> {
        Arc::clone(&self.tree)
    }
}

impl RaftSnapshotBuilder<TypeConfig> for StateMachine {
    async fn build_snapshot(&mut self) -> Result<Snapshot<TypeConfig>, StorageError<TypeConfig>> {
        log::info!("snapshot build starting at last_applied={:?}", self.last_applied);
        let bytes = {
            let tree = self.tree.read().unwrap_or_else(|poison| poison.into_inner());
            snapshot_bytes(&tree).map_err(|e| StorageError::read_state_machine(&e))?
        };

        let meta = SnapshotMeta {
            last_log_id: self.last_applied,
            last_membership: self.last_membership.clone(),
            snapshot_id: format!("{}-{}", self.last_applied.map(|l| l.index).unwrap_or(0), bytes.len()),
        };

        log::info!("snapshot build finished, {} bytes, id={}", bytes.len(), meta.snapshot_id);
        Ok(Snapshot {
            meta,
            snapshot: Box::new(Cursor::new(bytes)),
        })
    }
}

impl RaftStateMachine<TypeConfig> for StateMachine {
    type SnapshotBuilder = Self;

    async fn applied_state(
        &mut self,
    ) -> Result<(Option<LogId<TypeConfig>>, StoredMembership<TypeConfig>), StorageError<TypeConfig>> {
        Ok((self.last_applied, self.last_membership.clone()))
    }

    async fn apply<I>(&mut self, entries: I) -> Result<Vec<CommandResponse>, StorageError<TypeConfig>>
    where
        I: IntoIterator<Item = openraft::Entry<TypeConfig>> + OptionalSend,
    {
        let tree = Arc::clone(&self.tree);
        let guard = tree.read().unwrap_or_else(|poison| poison.into_inner());
        let mut responses = Vec::new();
        for entry in entries {
            self.last_applied = Some(entry.log_id);
            match entry.payload {
                EntryPayload::Blank => responses.push(CommandResponse::ok()),
                EntryPayload::Normal(command) => responses.push(apply_command(&guard, command)),
                EntryPayload::Membership(membership) => {
                    self.last_membership = StoredMembership::new(Some(entry.log_id), membership);
                    responses.push(CommandResponse::ok());
                }
            }
        }
        Ok(responses)
    }

    async fn begin_receiving_snapshot(
        &mut self,
    ) -> Result<Box<Cursor<Vec<u8>>>, StorageError<TypeConfig>> {
        Ok(Box::new(Cursor::new(Vec::new())))
    }

    async fn install_snapshot(
        &mut self,
        meta: &SnapshotMeta<TypeConfig>,
        snapshot: Box<Cursor<Vec<u8>>>,
    ) -> Result<(), StorageError<TypeConfig>> {
        log::info!("snapshot install starting, id={}", meta.snapshot_id);
        let records: std::collections::HashMap<String, SnapshotRecord> =
            serde_json::from_slice(snapshot.get_ref()).map_err(|e| StorageError::read_snapshot(Some(meta.signature()), &e))?;

        let fresh = QuadTree::new(self.quadtree_height);
        for (id, record) in records {
            if let Ok(pos) = Position::new(record.lat, record.long) {
                fresh.insert(&id, pos, record.data);
            }
        }

        *self.tree.write().unwrap_or_else(|poison| poison.into_inner()) = fresh;
        self.last_applied = meta.last_log_id;
        self.last_membership = meta.last_membership.clone();
        log::info!("snapshot install finished, id={}", meta.snapshot_id);
        Ok(())
    }

    async fn get_current_snapshot(&mut self) -> Result<Option<Snapshot<TypeConfig>>, StorageError<TypeConfig>> {
        Ok(Some(self.build_snapshot().await?))
    }

    async fn get_snapshot_builder(&mut self) -> Self::SnapshotBuilder {
        StateMachine {
            tree: Arc::clone(&self.tree),
            quadtree_height: self.quadtree_height,
            last_applied: self.last_applied,
            last_membership: self.last_membership.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_insert_then_snapshot_round_trips() {
        let tree = QuadTree::new(4);
        let response = apply_command(&tree, Command::insert("a", 12.9, 77.7, DataMap::new()));
        assert!(response.error.is_none());
        assert!(tree.get("a").is_ok());

        let bytes = snapshot_bytes(&tree).unwrap();
        let decoded: std::collections::HashMap<String, SnapshotRecord> = serde_json::from_slice(&bytes).unwrap();
        assert!(decoded.contains_key("a"));
    }

    #[test]
    fn apply_delete_of_unknown_id_is_not_fatal() {
        let tree = QuadTree::new(4);
        let response = apply_command(&tree, Command::delete("nope"));
        assert!(response.error.is_some());
    }
}
