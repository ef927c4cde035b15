//! Benchmarks for the two load-bearing subsystems: the slab storage
//! runtime's append/scan path, and the control-flow IR's build+optimize
//! pipeline.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use datalog_ir::{Column, ColumnType, InsertView, QueryBuilder, SelectView, StreamView, UnionView, View, ViewKind};
use std::sync::Arc;
use stratalog::cfg;
use stratalog::storage::slab::{SlabManager, SlabStoreKind, SlabStoreSize, TypedSlabVector};

fn make_manager() -> Arc<SlabManager> {
    Arc::new(SlabManager::create(SlabStoreKind::InMemory, SlabStoreSize::Tiny, 1).expect("manager"))
}

fn bench_slab_vector_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("slab_vector_append");
    for &size in &[100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
            b.iter(|| {
                let manager = make_manager();
                let mut vector: TypedSlabVector<i64, i64> = TypedSlabVector::new(manager).expect("vector");
                for i in 0..n as i64 {
                    vector.push(&i).expect("push");
                }
                vector.len()
            });
        });
    }
    group.finish();
}

fn bench_slab_vector_scan(c: &mut Criterion) {
    let manager = make_manager();
    let mut vector: TypedSlabVector<i64, i64> = TypedSlabVector::new(manager).expect("vector");
    for i in 0..10_000i64 {
        vector.push(&i).expect("push");
    }

    c.bench_function("slab_vector_scan_10000", |b| {
        b.iter(|| vector.iter().sum::<i64>());
    });
}

/// Builds a query with `n` relations chained `r0 :- stream`, `r1 :- r0`,
/// ..., `rn :- r_{n-1}`, joined pairwise into a final union, to give the
/// CFG builder and optimizer a nontrivial region tree to chew on.
fn build_chain_query(n: u32) -> datalog_ir::Query {
    let mut qb = QueryBuilder::new();
    let col = |id: u32| Column::new(id, 0, ColumnType::I64);

    let stream_id = qb.alloc_id();
    qb.insert(View::new(
        stream_id,
        vec![col(0)],
        ViewKind::Stream(StreamView { message: "seed".into() }),
    ));

    let mut prev_select = stream_id;
    let mut prev_relation = "seed".to_string();
    for i in 0..n {
        let insert_id = qb.alloc_id();
        let relation = format!("r{i}");
        qb.insert(View::new(
            insert_id,
            vec![col(i + 1)],
            ViewKind::Insert(InsertView { input: prev_select, relation: relation.clone(), is_stream: false }),
        ));

        let select_id = qb.alloc_id();
        qb.insert(View::new(
            select_id,
            vec![col(i + 1)],
            ViewKind::Select(SelectView { relation: relation.clone() }),
        ));

        prev_select = select_id;
        prev_relation = relation;
    }
    let _ = prev_relation;

    let union_id = qb.alloc_id();
    qb.insert(View::new(
        union_id,
        vec![col(n + 2)],
        ViewKind::Union(UnionView { inputs: vec![prev_select] }),
    ));
    let final_insert = qb.alloc_id();
    qb.insert(View::new(
        final_insert,
        vec![col(n + 2)],
        ViewKind::Insert(InsertView { input: union_id, relation: "out".into(), is_stream: false }),
    ));

    qb.build()
}

fn bench_cfg_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("cfg_compile");
    for &n in &[5u32, 25, 100] {
        let query = build_chain_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, q| {
            b.iter(|| cfg::compile(q).expect("compiles"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_slab_vector_append, bench_slab_vector_scan, bench_cfg_compile);
criterion_main!(benches);
