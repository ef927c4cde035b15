//! The top-down checker builder (SPEC_FULL §4.4): for every view reachable
//! as the `negated` side of a `NegateView`, synthesizes a `TupleChecker`
//! procedure that decides whether a given tuple is currently provable,
//! without re-running the forward dataflow.
//!
//! Recursion follows the view's own predecessor structure: a materialized
//! view (one the builder gave a backing table, per `NodePool::get_or_create_
//! table`) answers directly from its `StateCheck`; a pass-through view
//! (tuple/compare/map) defers to its single input's checker; a join defers
//! to the conjunction of its inputs' checkers; a union is provable iff any
//! one of its inputs is.

use crate::cfg::error::{BuildError, BuildResult};
use crate::cfg::ids::{RegionId, TableId};
use crate::cfg::node_pool::{
    set_operation_alt_body, set_operation_body, set_operation_unknown_body, NodePool,
};
use crate::cfg::operation::OperationKind;
use crate::cfg::region::{AltBodyKind, ProcedureKind, RegionData};
use crate::cfg::variable::{VariableOrigin, VariableRole};
use datalog_ir::{Query, ViewId};
use std::collections::BTreeMap;

pub struct CheckerBuilder<'q> {
    query: &'q Query,
    relation_inserters: &'q BTreeMap<String, Vec<ViewId>>,
    checkers: BTreeMap<ViewId, RegionId>,
}

impl<'q> CheckerBuilder<'q> {
    pub fn new(query: &'q Query, relation_inserters: &'q BTreeMap<String, Vec<ViewId>>) -> Self {
        CheckerBuilder { query, relation_inserters, checkers: BTreeMap::new() }
    }

    /// Builds (or reuses) the checker procedure for `view_id`. Idempotent:
    /// a view negated more than once gets exactly one checker procedure.
    pub fn build_checker(&mut self, pool: &mut NodePool, view_id: ViewId) -> BuildResult<RegionId> {
        if let Some(&proc) = self.checkers.get(&view_id) {
            return Ok(proc);
        }

        let proc = pool.create_procedure(ProcedureKind::TupleChecker);
        // Reserve the slot before recursing so a cycle through this exact
        // view (a checker calling back into itself via an inductive union)
        // resolves to a `Call` rather than infinite recursion.
        self.checkers.insert(view_id, proc);

        let view = self
            .query
            .view(view_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view_id}")))?;

        let mut params = Vec::with_capacity(view.columns().len());
        for col in view.columns() {
            let var = pool.create_variable(VariableRole::Parameter, Some(col.ty()), Some(VariableOrigin::Column(col.id())));
            params.push(var);
        }
        if let RegionData::Procedure(p) = pool.region_mut(proc).data_mut() {
            p.scalar_params = params.clone();
        }

        let body = pool.create_series(proc);
        pool.set_procedure_body(proc, body);
        for (col, &var) in view.columns().iter().zip(&params) {
            pool.region_mut(body).bind_local(col.id(), var);
        }

        self.build_body(pool, body, view_id)?;
        Ok(proc)
    }

    fn build_body(&mut self, pool: &mut NodePool, body: RegionId, view_id: ViewId) -> BuildResult<()> {
        let view = self
            .query
            .view(view_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view_id}")))?
            .clone();

        match view.kind() {
            datalog_ir::ViewKind::Select(_) | datalog_ir::ViewKind::Insert(_) => {
                self.emit_table_check(pool, body, view_id)
            }
            datalog_ir::ViewKind::Stream(_) => {
                // A message is never provable after the fact; it is
                // consumed, not stored.
                self.emit_return_false(pool, body)
            }
            datalog_ir::ViewKind::Tuple(t) => self.defer_to(pool, body, view_id, t.input),
            datalog_ir::ViewKind::Compare(c) => self.defer_to(pool, body, view_id, c.input),
            datalog_ir::ViewKind::Map(m) => self.defer_to(pool, body, view_id, m.input),
            datalog_ir::ViewKind::Negate(n) => {
                // Provable iff the positive side holds and the negated side
                // does not; both are themselves checked recursively.
                let target = self.build_checker(pool, n.negated)?;
                let call = pool.create_operation(body, OperationKind::CheckerCall);
                pool.append_child(body, call);
                self.wire_call(pool, call, view_id, n.negated)?;
                if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
                    o.data.procedure = Some(target);
                }

                let absent_body = pool.create_series(call);
                let present_body = pool.create_series(call);
                set_operation_body(pool, call, absent_body);
                set_operation_alt_body(pool, call, AltBodyKind::Unknown, present_body);
                self.emit_return_false(pool, present_body)?;
                self.defer_to(pool, absent_body, view_id, n.input)
            }
            datalog_ir::ViewKind::Join(j) => self.emit_all_of(pool, body, view_id, &j.inputs),
            datalog_ir::ViewKind::Product(p) => self.emit_all_of(pool, body, view_id, &p.inputs),
            datalog_ir::ViewKind::Union(u) => self.emit_any_of(pool, body, view_id, &u.inputs),
        }
    }

    /// A materialized view answers from its own table state. `Present` and
    /// `Absent` answer directly; `Unknown` (SPEC_FULL §4.4) marks the tuple
    /// absent and re-derives it by checking each relation that writes the
    /// table, falling back to `Absent` if none of them can re-derive it.
    fn emit_table_check(&mut self, pool: &mut NodePool, body: RegionId, view_id: ViewId) -> BuildResult<()> {
        let view = self
            .query
            .view(view_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view_id}")))?
            .clone();
        let relation = match view.kind() {
            datalog_ir::ViewKind::Select(s) => s.relation.clone(),
            datalog_ir::ViewKind::Insert(i) => i.relation.clone(),
            _ => return Err(BuildError::Other(format!("emit_table_check on non-table view {view_id}"))),
        };

        let table = pool.get_or_create_table(self.query, view_id)?;
        let check = pool.create_operation(body, OperationKind::StateCheck);
        pool.append_child(body, check);
        if let RegionData::Operation(o) = pool.region_mut(check).data_mut() {
            o.data.tables.push(table);
        }
        let present_body = pool.create_series(check);
        let absent_body = pool.create_series(check);
        set_operation_body(pool, check, absent_body);
        set_operation_alt_body(pool, check, AltBodyKind::Absent, present_body);
        self.emit_return_false(pool, absent_body)?;
        self.emit_return_true(pool, present_body)?;

        let rederivable: Vec<ViewId> = self
            .relation_inserters
            .get(&relation)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|&inserter| inserter != view_id)
            .collect();
        if rederivable.is_empty() {
            return Ok(());
        }

        let unknown_body = pool.create_series(check);
        set_operation_unknown_body(pool, check, unknown_body);

        let mark_absent = pool.create_operation(unknown_body, OperationKind::StateChange);
        pool.append_child(unknown_body, mark_absent);
        if let RegionData::Operation(o) = pool.region_mut(mark_absent).data_mut() {
            o.data.tables.push(table);
        }

        self.emit_rederive_chain(pool, unknown_body, view_id, table, &rederivable)
    }

    /// Tries each of `inserters` in turn: invokes the checker for the
    /// inserter's own input (the derivation that feeds it), and on success
    /// marks the table present and returns true. Falls through to the next
    /// inserter on failure, and to a plain `Absent` answer once all are
    /// exhausted.
    fn emit_rederive_chain(
        &mut self,
        pool: &mut NodePool,
        region: RegionId,
        view_id: ViewId,
        table: TableId,
        inserters: &[ViewId],
    ) -> BuildResult<()> {
        let mut cursor = region;
        for &inserter in inserters {
            let insert_view = self
                .query
                .view(inserter)
                .ok_or_else(|| BuildError::Other(format!("unknown view {inserter}")))?
                .clone();
            let input = match insert_view.kind() {
                datalog_ir::ViewKind::Insert(i) => i.input,
                _ => {
                    return Err(BuildError::Other(format!(
                        "relation inserter {inserter} is not an InsertView"
                    )))
                }
            };

            let target = self.build_checker(pool, input)?;
            let call = pool.create_operation(cursor, OperationKind::CheckerCall);
            pool.append_child(cursor, call);
            self.wire_call_by_position(pool, call, view_id, input)?;
            if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
                o.data.procedure = Some(target);
            }

            let present_body = pool.create_series(call);
            let absent_body = pool.create_series(call);
            set_operation_body(pool, call, present_body);
            set_operation_alt_body(pool, call, AltBodyKind::Unknown, absent_body);

            let mark_present = pool.create_operation(present_body, OperationKind::StateChange);
            pool.append_child(present_body, mark_present);
            if let RegionData::Operation(o) = pool.region_mut(mark_present).data_mut() {
                o.data.tables.push(table);
            }
            self.emit_return_true(pool, present_body)?;
            cursor = absent_body;
        }
        self.emit_return_false(pool, cursor)
    }

    /// Pass-through view: same provability answer as its single input.
    fn defer_to(&mut self, pool: &mut NodePool, body: RegionId, view_id: ViewId, input: ViewId) -> BuildResult<()> {
        let target = self.build_checker(pool, input)?;
        let call = pool.create_operation(body, OperationKind::CheckerCall);
        pool.append_child(body, call);
        self.wire_call(pool, call, view_id, input)?;
        if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
            o.data.procedure = Some(target);
        }

        let present_body = pool.create_series(call);
        let absent_body = pool.create_series(call);
        set_operation_body(pool, call, present_body);
        set_operation_alt_body(pool, call, AltBodyKind::Unknown, absent_body);
        self.emit_return_true(pool, present_body)?;
        self.emit_return_false(pool, absent_body)
    }

    /// A conjunctive view (join/product) is provable iff every input is.
    fn emit_all_of(&mut self, pool: &mut NodePool, body: RegionId, view_id: ViewId, inputs: &[ViewId]) -> BuildResult<()> {
        let mut cursor = body;
        for &input in inputs {
            let target = self.build_checker(pool, input)?;
            let call = pool.create_operation(cursor, OperationKind::CheckerCall);
            pool.append_child(cursor, call);
            self.wire_call(pool, call, view_id, input)?;
            if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
                o.data.procedure = Some(target);
            }

            let present_body = pool.create_series(call);
            let absent_body = pool.create_series(call);
            set_operation_body(pool, call, present_body);
            set_operation_alt_body(pool, call, AltBodyKind::Unknown, absent_body);
            self.emit_return_false(pool, absent_body)?;
            cursor = present_body;
        }
        self.emit_return_true(pool, cursor)
    }

    /// A disjunctive view (union) is provable iff any input is.
    fn emit_any_of(&mut self, pool: &mut NodePool, body: RegionId, view_id: ViewId, inputs: &[ViewId]) -> BuildResult<()> {
        let mut cursor = body;
        for &input in inputs {
            let target = self.build_checker(pool, input)?;
            let call = pool.create_operation(cursor, OperationKind::CheckerCall);
            pool.append_child(cursor, call);
            self.wire_call(pool, call, view_id, input)?;
            if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
                o.data.procedure = Some(target);
            }

            let present_body = pool.create_series(call);
            let absent_body = pool.create_series(call);
            set_operation_body(pool, call, present_body);
            set_operation_alt_body(pool, call, AltBodyKind::Unknown, absent_body);
            self.emit_return_true(pool, present_body)?;
            cursor = absent_body;
        }
        self.emit_return_false(pool, cursor)
    }

    /// Binds `call`'s arguments from `caller_view`'s own local variables,
    /// following the same predecessor→successor column correspondence
    /// `Query::for_each_use` establishes for ordinary forward dispatch, just
    /// walked from `input` (the callee) toward `caller_view` instead of
    /// toward a forward successor.
    fn wire_call(&mut self, pool: &mut NodePool, call: RegionId, caller_view: ViewId, input: ViewId) -> BuildResult<()> {
        let mut out_col_for_in: BTreeMap<u32, u32> = BTreeMap::new();
        self.query.for_each_use(input, |in_col, succ, out_col| {
            if succ == caller_view {
                out_col_for_in.insert(in_col, out_col);
            }
        });

        let caller = self
            .query
            .view(caller_view)
            .ok_or_else(|| BuildError::Other(format!("unknown view {caller_view}")))?
            .clone();
        let input_view = self
            .query
            .view(input)
            .ok_or_else(|| BuildError::Other(format!("unknown view {input}")))?
            .clone();

        let mut vars = Vec::with_capacity(input_view.columns().len());
        for in_col in input_view.columns() {
            let out_col = *out_col_for_in
                .get(&in_col.id())
                .ok_or(BuildError::UnresolvedColumn { view: input, column: in_col.id() })?;
            let out_col_struct = caller
                .columns()
                .iter()
                .find(|c| c.id() == out_col)
                .ok_or(BuildError::UnresolvedColumn { view: caller_view, column: out_col })?
                .clone();
            vars.push(pool.variable_for(call, caller_view, &out_col_struct)?);
        }
        if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
            o.data.variables = vars;
        }
        Ok(())
    }

    /// Binds `call`'s arguments from `caller_view`'s own local variables by
    /// column position rather than by dataflow edge. Used to wire a
    /// `CheckerCall` into an `InsertView`'s `input`: the two views are not
    /// connected by a forward dataflow edge (`Query::for_each_use` has
    /// nothing to walk), but they share a relation's positional schema, the
    /// same correspondence `CfgBuilder::rebind_and_dispatch` relies on for
    /// forward select/insert rebinding.
    fn wire_call_by_position(&mut self, pool: &mut NodePool, call: RegionId, caller_view: ViewId, input: ViewId) -> BuildResult<()> {
        let caller = self
            .query
            .view(caller_view)
            .ok_or_else(|| BuildError::Other(format!("unknown view {caller_view}")))?
            .clone();
        let input_view = self
            .query
            .view(input)
            .ok_or_else(|| BuildError::Other(format!("unknown view {input}")))?
            .clone();

        let mut vars = Vec::with_capacity(input_view.columns().len());
        for in_col in input_view.columns() {
            let caller_col = caller
                .columns()
                .iter()
                .find(|c| c.index() == in_col.index())
                .ok_or(BuildError::UnresolvedColumn { view: caller_view, column: in_col.id() })?
                .clone();
            vars.push(pool.variable_for(call, caller_view, &caller_col)?);
        }
        if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
            o.data.variables = vars;
        }
        Ok(())
    }

    fn emit_return_true(&mut self, pool: &mut NodePool, region: RegionId) -> BuildResult<()> {
        self.emit_return(pool, region, true)
    }

    fn emit_return_false(&mut self, pool: &mut NodePool, region: RegionId) -> BuildResult<()> {
        self.emit_return(pool, region, false)
    }

    fn emit_return(&mut self, pool: &mut NodePool, region: RegionId, value: bool) -> BuildResult<()> {
        let role = if value { VariableRole::ConstantTrue } else { VariableRole::ConstantFalse };
        let literal = datalog_ir::Literal::Bool(value);
        let var = pool.create_variable(role, Some(datalog_ir::ColumnType::Bool), Some(VariableOrigin::Literal(literal)));
        let ret = pool.create_operation(region, OperationKind::Return);
        pool.append_child(region, ret);
        if let RegionData::Operation(o) = pool.region_mut(ret).data_mut() {
            o.data.variables.push(var);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ir::{Column, ColumnType, InsertView, QueryBuilder, SelectView, TupleView, View, ViewKind};

    fn col(id: u32) -> Column {
        Column::new(id, id as usize, ColumnType::I64)
    }

    fn chain_query() -> (Query, ViewId) {
        let mut b = QueryBuilder::new();
        let e = b.alloc_id();
        let t = b.alloc_id();
        let r = b.alloc_id();
        b.insert(View::new(e, vec![col(0)], ViewKind::Select(SelectView { relation: "e".into() })));
        b.insert(View::new(t, vec![col(1)], ViewKind::Tuple(TupleView { input: e })));
        b.insert(View::new(r, vec![col(2)], ViewKind::Insert(InsertView { input: t, relation: "r".into(), is_stream: false })));
        (b.build(), r)
    }

    #[test]
    fn builds_one_checker_procedure_per_view() {
        let (query, r) = chain_query();
        let inserters = BTreeMap::new();
        let mut builder = CheckerBuilder::new(&query, &inserters);
        let mut pool = NodePool::new();
        let first = builder.build_checker(&mut pool, r).unwrap();
        let second = builder.build_checker(&mut pool, r).unwrap();
        assert_eq!(first, second);
        // r's checker, plus a deferred checker for t, plus a table check
        // for e: three procedures total.
        assert_eq!(pool.procedure_roots().len(), 3);
    }

    /// A relation read through a `SelectView` and written by a separate
    /// `InsertView` must grow an `Unknown` branch that re-derives from the
    /// inserter's own input, rather than just reporting the tuple absent.
    fn rederive_query() -> (Query, ViewId, BTreeMap<String, Vec<ViewId>>) {
        let mut b = QueryBuilder::new();
        let src = b.alloc_id();
        let mid = b.alloc_id();
        let ins = b.alloc_id();
        let sel_r = b.alloc_id();
        b.insert(View::new(src, vec![col(0)], ViewKind::Select(SelectView { relation: "src".into() })));
        b.insert(View::new(mid, vec![col(1)], ViewKind::Tuple(TupleView { input: src })));
        b.insert(View::new(ins, vec![col(1)], ViewKind::Insert(InsertView { input: mid, relation: "r".into(), is_stream: false })));
        b.insert(View::new(sel_r, vec![col(1)], ViewKind::Select(SelectView { relation: "r".into() })));
        let mut inserters = BTreeMap::new();
        inserters.insert("r".to_string(), vec![ins]);
        (b.build(), sel_r, inserters)
    }

    #[test]
    fn unknown_tuple_is_rederived_through_its_inserting_relation() {
        let (query, sel_r, inserters) = rederive_query();
        let mut builder = CheckerBuilder::new(&query, &inserters);
        let mut pool = NodePool::new();
        let proc = builder.build_checker(&mut pool, sel_r).unwrap();

        let body = match pool.region(proc).data() {
            RegionData::Procedure(p) => p.body.unwrap(),
            other => panic!("expected a procedure, got {other:?}"),
        };
        let check = pool.region(body).children()[0];
        match pool.region(check).data() {
            RegionData::Operation(o) => {
                assert_eq!(o.kind, OperationKind::StateCheck);
                assert!(o.data.unknown_body.is_some());
            }
            other => panic!("expected an operation, got {other:?}"),
        }
    }

    #[test]
    fn a_relation_with_no_inserters_gets_no_unknown_branch() {
        let (query, r) = chain_query();
        let inserters = BTreeMap::new();
        let mut builder = CheckerBuilder::new(&query, &inserters);
        let mut pool = NodePool::new();
        let proc = builder.build_checker(&mut pool, r).unwrap();

        let body = match pool.region(proc).data() {
            RegionData::Procedure(p) => p.body.unwrap(),
            other => panic!("expected a procedure, got {other:?}"),
        };
        let check = pool.region(body).children()[0];
        match pool.region(check).data() {
            RegionData::Operation(o) => {
                assert_eq!(o.kind, OperationKind::StateCheck);
                assert!(o.data.unknown_body.is_none());
            }
            other => panic!("expected an operation, got {other:?}"),
        }
    }
}
