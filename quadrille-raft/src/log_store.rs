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

//! Raft log and hard-state (vote) persistence, backed by a `redb`
//! embedded database file -- the concrete stand-in for the "assumed
//! available" log store the source gets from `raft-badger`.

use crate::types::TypeConfig;
use openraft::storage::{LogFlushed, LogState, RaftLogReader, RaftLogStorage};
use openraft::{Entry, LogId, OptionalSend, StorageError, StorageIOError, Vote};
use redb::{Database, ReadableTable, TableDefinition};
use std::ops::RangeBounds;
use std::path::Path;
use std::sync::Arc;

const LOG_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("raft_log");
const VOTE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("raft_vote");
const VOTE_KEY: &str = "vote";

fn io_err(e: impl std::error::Error + 'static) -> StorageError<TypeConfig> {
    StorageIOError::write(&e).into()
}

/// A `redb`-backed log store. Cheap to clone: the `Database` handle is
/// wrapped in an `Arc` and `redb` itself serializes concurrent writers.
#[derive(Clone)]
pub struct LogStore {
    db: Arc<Database>,
}

impl LogStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, redb::Error> {
        let db = Database::create(path)?;
        {
            let txn = db.begin_write()?;
            {
                txn.open_table(LOG_TABLE)?;
                txn.open_table(VOTE_TABLE)?;
            }
            txn.commit()?;
        }
        Ok(LogStore { db: Arc::new(db) })
    }
}

impl RaftLogReader<TypeConfig> for LogStore {
    async fn try_get_log_entries<RB: RangeBounds<u64> + Clone + OptionalSend>(
        &mut self,
        range: RB,
    ) -> Result<Vec<Entry<TypeConfig>>, StorageError<TypeConfig>> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(LOG_TABLE).map_err(io_err)?;
        let mut entries = Vec::new();
        for row in table.range(range).map_err(io_err)? {
            let (_, value) = row.map_err(io_err)?;
            let entry: Entry<TypeConfig> = bincode::deserialize(value.value()).map_err(|e| io_err(*e))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl RaftLogStorage<TypeConfig> for LogStore {
    type LogReader = Self;

    async fn get_log_state(&mut self) -> Result<LogState<TypeConfig>, StorageError<TypeConfig>> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(LOG_TABLE).map_err(io_err)?;

        let last = table
            .iter()
            .map_err(io_err)?
            .next_back()
            .transpose()
            .map_err(io_err)?
            .map(|(_, value)| bincode::deserialize::<Entry<TypeConfig>>(value.value()).map(|e| e.log_id))
            .transpose()
            .map_err(|e| io_err(*e))?;

        Ok(LogState {
            last_purged_log_id: None,
            last_log_id: last,
        })
    }

    async fn save_vote(&mut self, vote: &Vote<u64>) -> Result<(), StorageError<TypeConfig>> {
        let bytes = bincode::serialize(vote).map_err(|e| io_err(*e))?;
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(VOTE_TABLE).map_err(io_err)?;
            table.insert(VOTE_KEY, bytes.as_slice()).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    async fn read_vote(&mut self) -> Result<Option<Vote<u64>>, StorageError<TypeConfig>> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(VOTE_TABLE).map_err(io_err)?;
        match table.get(VOTE_KEY).map_err(io_err)? {
            Some(value) => Ok(Some(bincode::deserialize(value.value()).map_err(|e| io_err(*e))?)),
            None => Ok(None),
        }
    }

    async fn append<I>(&mut self, entries: I, callback: LogFlushed<TypeConfig>) -> Result<(), StorageError<TypeConfig>>
    where
        I: IntoIterator<Item = Entry<TypeConfig>> + OptionalSend,
    {
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(LOG_TABLE).map_err(io_err)?;
            for entry in entries {
                let index = entry.log_id.index;
                let bytes = bincode::serialize(&entry).map_err(|e| io_err(*e))?;
                table.insert(index, bytes.as_slice()).map_err(io_err)?;
            }
        }
        txn.commit().map_err(io_err)?;
        callback.log_io_completed(Ok(()));
        Ok(())
    }

    async fn truncate(&mut self, log_id: LogId<u64>) -> Result<(), StorageError<TypeConfig>> {
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(LOG_TABLE).map_err(io_err)?;
            let keys: Vec<u64> = table
                .range(log_id.index..)
                .map_err(io_err)?
                .filter_map(|row| row.ok().map(|(k, _)| k.value()))
                .collect();
            for key in keys {
                table.remove(key).map_err(io_err)?;
            }
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    async fn purge(&mut self, log_id: LogId<u64>) -> Result<(), StorageError<TypeConfig>> {
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(LOG_TABLE).map_err(io_err)?;
            let keys: Vec<u64> = table
                .range(..=log_id.index)
                .map_err(io_err)?
                .filter_map(|row| row.ok().map(|(k, _)| k.value()))
                .collect();
            for key in keys {
                table.remove(key).map_err(io_err)?;
            }
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    async fn get_log_reader(&mut self) -> Self::LogReader {
        self.clone()
    }
}
