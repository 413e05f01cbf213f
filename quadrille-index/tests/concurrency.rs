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

//! Exercises the invariants that only show up under concurrent access:
//! every id lands in exactly one node, moves never duplicate or lose an
//! id, and repeated deletes of the same id are rejected exactly once.

use quadrille_geo::Position;
use quadrille_index::{DataMap, QuadTree};
use std::sync::Arc;
use std::thread;

fn p(lat: f64, lon: f64) -> Position {
    Position::new(lat, lon).unwrap()
}

#[test]
fn concurrent_inserts_of_distinct_ids_are_all_observable() {
    let tree = Arc::new(QuadTree::new(6));
    let mut handles = Vec::new();
    for worker in 0..8 {
        let tree = Arc::clone(&tree);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let id = format!("w{worker}-{i}");
                let lat = -80.0 + ((worker * 50 + i) as f64) % 160.0;
                let lon = -170.0 + ((worker * 37 + i) as f64) % 340.0;
                tree.insert(&id, p(lat, lon), DataMap::new());
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(tree.get_all_locations().len(), 400);
}

#[test]
fn concurrent_moves_of_the_same_id_never_duplicate_it() {
    let tree = Arc::new(QuadTree::new(6));
    tree.insert("mover", p(0.0, 0.0), DataMap::new());

    let mut handles = Vec::new();
    for worker in 0..4 {
        let tree = Arc::clone(&tree);
        handles.push(thread::spawn(move || {
            for step in 0..25 {
                let lat = -80.0 + ((worker * 25 + step) as f64) % 160.0;
                let lon = -170.0 + ((worker * 41 + step) as f64) % 340.0;
                let _ = tree.update_location("mover", p(lat, lon));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let all = tree.get_all_locations();
    let count = all.iter().filter(|r| r.id == "mover").count();
    assert_eq!(count, 1, "id must appear in exactly one node after concurrent moves");
    assert!(tree.get("mover").is_ok());
}

#[test]
fn concurrent_deletes_of_the_same_id_only_one_wins() {
    let tree = Arc::new(QuadTree::new(5));
    tree.insert("target", p(10.0, 10.0), DataMap::new());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tree = Arc::clone(&tree);
        handles.push(thread::spawn(move || tree.delete("target").is_ok()));
    }
    let successes: usize = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(successes, 1);
    assert!(tree.get("target").is_err());
}
