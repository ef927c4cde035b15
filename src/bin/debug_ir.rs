//! Builds a small sample `Query` (a stream of `e(x)` facts re-inserted as
//! `r(x) :- e(x)`), compiles it through the control-flow IR, and prints the
//! resulting region-tree shape. Useful for inspecting what the builder and
//! optimizer produce for a given graph without a surrounding test harness.

use datalog_ir::{Column, ColumnType, InsertView, QueryBuilder, SelectView, StreamView, View, ViewKind};
use stratalog::cfg::{self, RegionCounts};

fn main() {
    tracing_subscriber::fmt::init();

    let mut qb = QueryBuilder::new();
    let mut next_col = 0u32;
    let mut alloc_col = |ty: ColumnType| {
        let id = next_col;
        next_col += 1;
        Column::new(id, 0, ty)
    };

    let stream_id = qb.alloc_id();
    let e_insert_id = qb.alloc_id();
    let e_select_id = qb.alloc_id();
    let r_insert_id = qb.alloc_id();

    let stream_col = alloc_col(ColumnType::I64);
    qb.insert(View::new(
        stream_id,
        vec![stream_col.clone()],
        ViewKind::Stream(StreamView { message: "e".into() }),
    ));

    qb.insert(View::new(
        e_insert_id,
        vec![Column::new(stream_col.id(), 0, ColumnType::I64)],
        ViewKind::Insert(InsertView { input: stream_id, relation: "e".into(), is_stream: false }),
    ));

    let select_col = alloc_col(ColumnType::I64);
    qb.insert(View::new(
        e_select_id,
        vec![select_col.clone()],
        ViewKind::Select(SelectView { relation: "e".into() }),
    ));

    qb.insert(View::new(
        r_insert_id,
        vec![Column::new(select_col.id(), 0, ColumnType::I64)],
        ViewKind::Insert(InsertView { input: e_select_id, relation: "r".into(), is_stream: false }),
    ));

    let query = qb.build();
    let program = cfg::compile(&query).expect("sample query compiles");

    let mut counts = RegionCounts::default();
    program.accept(&mut counts);

    println!("procedures:  {}", program.procedures().len());
    println!("tables:      {}", program.tables().len());
    println!("region counts: {counts:?}");
}
