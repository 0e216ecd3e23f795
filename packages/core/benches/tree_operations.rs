//! Performance benchmarks for concept tree operations
//!
//! Run with: `cargo bench -p concept-tree-core`
//!
//! These benchmarks measure the hot paths of interactive editing on large
//! trees:
//! - View projection (runs on every render)
//! - Reparent with its ancestor-chain cycle check
//! - Subtree delete through the children index
//! - Clipboard encode/decode of a large subtree

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use concept_tree_core::codec::clipboard;
use concept_tree_core::services::HierarchyStore;

/// Build a tree with `fanout` children per node until `count` nodes exist
///
/// Returns the store and the ids in creation order.
fn build_tree(count: usize, fanout: usize) -> (HierarchyStore, Vec<String>) {
    let mut store = HierarchyStore::with_root("Root", "");
    let mut ids = vec![store.root_id().unwrap().to_string()];

    let mut parent_cursor = 0;
    while ids.len() < count {
        let parent = ids[parent_cursor].clone();
        for _ in 0..fanout {
            if ids.len() >= count {
                break;
            }
            let name = format!("Concept {}", ids.len());
            let node = store.add_child(&parent, &name, "Some **notes**").unwrap();
            ids.push(node.id);
        }
        parent_cursor += 1;
    }

    (store, ids)
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("project");
    for count in [100, 1_000, 10_000] {
        let (store, _) = build_tree(count, 4);
        group.bench_with_input(BenchmarkId::from_parameter(count), &store, |b, store| {
            b.iter(|| black_box(store.project().len()));
        });
    }
    group.finish();
}

fn bench_reparent(c: &mut Criterion) {
    let (mut store, ids) = build_tree(5_000, 4);
    let root = ids[0].clone();
    let deep_leaf = ids[ids.len() - 1].clone();
    let first_branch = ids[1].clone();
    let second_branch = ids[2].clone();

    c.bench_function("reparent_rejected_cycle_5000", |b| {
        b.iter(|| black_box(store.reparent(&root, &deep_leaf).is_err()));
    });

    c.bench_function("reparent_back_and_forth_5000", |b| {
        b.iter(|| {
            store.reparent(&deep_leaf, &second_branch).unwrap();
            store.reparent(&deep_leaf, &first_branch).unwrap();
        });
    });
}

fn bench_delete_subtree(c: &mut Criterion) {
    c.bench_function("delete_subtree_2000", |b| {
        b.iter_batched(
            || build_tree(2_000, 4),
            |(mut store, ids)| black_box(store.delete_subtree(&ids[1]).unwrap().len()),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_clipboard(c: &mut Criterion) {
    let (store, ids) = build_tree(2_000, 4);
    let encoded = clipboard::encode(store.nodes(), &ids[0]).unwrap();

    c.bench_function("clipboard_encode_2000", |b| {
        b.iter(|| black_box(clipboard::encode(store.nodes(), &ids[0]).unwrap().len()));
    });

    c.bench_function("clipboard_decode_2000", |b| {
        b.iter(|| black_box(clipboard::decode(&encoded).unwrap().len()));
    });
}

criterion_group!(
    benches,
    bench_projection,
    bench_reparent,
    bench_delete_subtree,
    bench_clipboard
);
criterion_main!(benches);
