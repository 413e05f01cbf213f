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

//! End-to-end exercise of a single-member, self-bootstrapped cluster: the
//! configuration every standalone deployment starts from.

use quadrille_geo::Position;
use quadrille_index::DataMap;
use quadrille_raft::{ReplicatedStore, StoreConfig};

#[tokio::test]
async fn bootstrap_leader_accepts_writes_and_serves_reads() {
    let _ = pretty_env_logger::try_init();

    let dir = tempfile::tempdir().unwrap();
    let mut config = StoreConfig::new("n1", dir.path(), "127.0.0.1:0");
    config.set_enable_single(true).set_quadtree_height(4);

    let store = ReplicatedStore::open(&config).await.unwrap();

    // Single-member clusters elect themselves leader almost immediately;
    // give the core a moment to run its election timer.
    for _ in 0..50 {
        if store.is_leader() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(store.is_leader());

    let pos = Position::new(12.9660637, 77.7157481).unwrap();
    store.insert("a", pos, DataMap::new()).await.unwrap();

    let record = store.get("a").unwrap();
    assert_eq!(record.position, pos);

    let err = store.delete("nope").await.unwrap_err();
    assert!(matches!(
        err,
        quadrille_raft::StoreError::Index(quadrille_index::IndexError::NonExistentLocationDelete(_))
    ));
}
