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

use quadrille_raft::StoreConfig;

#[test]
fn defaults_bootstrap_off_and_default_height() {
    let config = StoreConfig::new("n1", "/tmp/quadrille-n1", "127.0.0.1:9001");
    assert!(!config.enable_single());
    assert_eq!(config.quadtree_height(), quadrille_index::DEFAULT_HEIGHT);
    assert_eq!(config.node_id(), "n1");
    assert!(config.join_addr().is_none());
}

#[test]
fn builder_setters_are_chainable() {
    let mut config = StoreConfig::new("n1", "/tmp/quadrille-n1", "127.0.0.1:9001");
    config
        .set_enable_single(true)
        .set_quadtree_height(8)
        .set_join_addr("127.0.0.1:9002");
    assert!(config.enable_single());
    assert_eq!(config.quadtree_height(), 8);
    assert_eq!(config.join_addr(), Some("127.0.0.1:9002"));
}
