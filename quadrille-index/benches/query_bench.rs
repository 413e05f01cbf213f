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

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quadrille_geo::Position;
use quadrille_index::{DataMap, QuadTree, DEFAULT_HEIGHT};

fn build_tree(count: usize) -> QuadTree {
    let tree = QuadTree::new(DEFAULT_HEIGHT);
    for i in 0..count {
        let lat = -80.0 + ((i * 7) % 160) as f64;
        let lon = -170.0 + ((i * 11) % 340) as f64;
        let pos = Position::new(lat, lon).unwrap();
        tree.insert(&format!("id-{i}"), pos, DataMap::new());
    }
    tree
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let tree = build_tree(50_000);
    let query = Position::new(12.9660637, 77.7157481).unwrap();

    c.bench_function("insert", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let pos = Position::new(
                -80.0 + ((i * 13) % 160) as f64,
                -170.0 + ((i * 17) % 340) as f64,
            )
            .unwrap();
            tree.insert(&format!("bench-{i}"), black_box(pos), DataMap::new());
            i += 1;
        });
    });

    c.bench_function("get nearby locations, 5km radius", |b| {
        b.iter(|| tree.get_nearby_locations(black_box(query), black_box(5_000.0), black_box(20)));
    });

    c.bench_function("get by id", |b| {
        b.iter(|| tree.get(black_box("id-42")));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
