//! The CFG builder (SPEC_FULL §4.2): lowers an optimized `Query` into a
//! `Program` of regions.
//!
//! Dispatch is a straightforward recursive descent over the dataflow graph,
//! driven by message arrival: each `StreamView` gets a message-handler
//! procedure whose body loops over the message's input vector, binds one
//! variable per column, and recurses into successors. A relation select is
//! re-triggered the same way whenever something inserts into that named
//! relation — `relation_selects` records which selects read which named
//! relation so an insert can re-enter dispatch on them.

use crate::cfg::checker::CheckerBuilder;
use crate::cfg::error::{BuildError, BuildResult};
use crate::cfg::ids::{RegionId, VariableId};
use crate::cfg::induction::InductionBuilder;
use crate::cfg::node_pool::{set_operation_alt_body, set_operation_body, NodePool};
use crate::cfg::operation::OperationKind;
use crate::cfg::program::Program;
use crate::cfg::region::{AltBodyKind, InductionPhase, ProcedureKind, RegionData};
use crate::cfg::variable::{VariableOrigin, VariableRole};
use crate::cfg::vector::VectorKind;
use datalog_ir::{CompareOp, InductionGroupId, Operand, Query, View, ViewId};
use std::collections::BTreeMap;

pub struct CfgBuilder<'q> {
    query: &'q Query,
    pool: NodePool,
    /// Relation name -> select views reading it, so an insert into that
    /// relation can re-enter dispatch on every reader (only `InsertView`
    /// carries a relation name in this IR; a union that defines a named
    /// relation is always itself wrapped by an `InsertView`).
    relation_selects: BTreeMap<String, Vec<ViewId>>,
    /// Relation name -> views that insert into it (used by the top-down
    /// checker builder, SPEC_FULL §4.4, to find a view's inserters).
    relation_inserters: BTreeMap<String, Vec<ViewId>>,
    induction: InductionBuilder,
}

impl<'q> CfgBuilder<'q> {
    pub fn new(query: &'q Query) -> Self {
        let mut relation_selects: BTreeMap<String, Vec<ViewId>> = BTreeMap::new();
        let mut relation_inserters: BTreeMap<String, Vec<ViewId>> = BTreeMap::new();
        for view in query.views() {
            if let Some(select) = view.as_select() {
                relation_selects.entry(select.relation.clone()).or_default().push(view.id());
            }
            if let Some(insert) = view.as_insert() {
                if !insert.is_stream {
                    relation_inserters.entry(insert.relation.clone()).or_default().push(view.id());
                }
            }
        }
        CfgBuilder {
            query,
            pool: NodePool::new(),
            relation_selects,
            relation_inserters,
            induction: InductionBuilder::new(),
        }
    }

    /// Builds the whole program: one message-handler procedure per stream
    /// view, then finalizes every induction group discovered along the way
    /// (SPEC_FULL §4.2, §4.3), then synthesizes top-down checkers for every
    /// negated view (§4.4).
    pub fn build(query: &Query) -> BuildResult<Program> {
        let mut builder = CfgBuilder::new(query);

        let stream_views: Vec<ViewId> =
            query.views().filter(|v| v.is_stream()).map(View::id).collect();
        for stream_id in stream_views {
            builder.build_message_procedure(stream_id)?;
        }

        builder.finalize_inductions()?;

        let negated: Vec<ViewId> =
            query.views().filter_map(|v| v.as_negate().map(|n| n.negated)).collect();
        let mut checker_builder = CheckerBuilder::new(query, &builder.relation_inserters);
        for view in negated {
            checker_builder.build_checker(&mut builder.pool, view)?;
        }

        tracing::debug!(
            procedures = builder.pool.procedure_roots().len(),
            regions = builder.pool.region_count(),
            "cfg builder finished"
        );

        Ok(Program::new(builder.pool))
    }

    fn build_message_procedure(&mut self, stream_id: ViewId) -> BuildResult<()> {
        let view = self
            .query
            .view(stream_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {stream_id}")))?;
        let stream = view.as_stream().expect("filtered to stream views");
        tracing::debug!(message = %stream.message, "emitting message-handler procedure");

        let proc = self.pool.create_procedure(ProcedureKind::MessageHandler);
        let param_types = view.columns().iter().map(|c| c.ty()).collect();
        let input_vector = self.pool.create_vector(VectorKind::InputParameter, param_types);
        if let RegionData::Procedure(p) = self.pool.region_mut(proc).data_mut() {
            p.vector_params.push(input_vector);
        }

        let loop_op = self.pool.create_operation(proc, OperationKind::VectorLoop);
        if let RegionData::Operation(o) = self.pool.region_mut(loop_op).data_mut() {
            o.data.vectors.push(input_vector);
        }
        self.pool.set_procedure_body(proc, loop_op);

        let body = self.pool.create_series(loop_op);
        set_operation_body(&mut self.pool, loop_op, body);

        self.bind_own_columns(body, view)?;
        self.dispatch_successors(body, stream_id)?;
        Ok(())
    }

    /// Binds one fresh loop-induction variable per column of `view` into
    /// `region`'s local scope.
    fn bind_own_columns(&mut self, region: RegionId, view: &View) -> BuildResult<()> {
        for col in view.columns() {
            let var = self.pool.create_variable(
                VariableRole::LoopInduction,
                Some(col.ty()),
                Some(VariableOrigin::Column(col.id())),
            );
            self.pool.region_mut(region).bind_local(col.id(), var);
        }
        Ok(())
    }

    /// Forwards `from`'s column bindings into each successor's own column
    /// ids (per `Query::for_each_use`) and recurses into `dispatch_view`.
    fn dispatch_successors(&mut self, region: RegionId, from: ViewId) -> BuildResult<()> {
        for succ in self.query.successors(from) {
            self.dispatch_into_successor(region, from, succ)?;
        }
        Ok(())
    }

    /// Binds just the columns `from` forwards into one specific successor,
    /// then dispatches into it. Used both by `dispatch_successors` (every
    /// successor) and by the induction engine's cyclic/output loop bodies
    /// (one specific inductive or non-inductive successor at a time).
    fn dispatch_into_successor(&mut self, region: RegionId, from: ViewId, succ: ViewId) -> BuildResult<()> {
        let mut pairs = Vec::new();
        self.query.for_each_use(from, |in_col, s, out_col| {
            if s == succ {
                pairs.push((in_col, out_col));
            }
        });
        for (in_col, out_col) in pairs {
            let var = self.lookup_var(region, from, in_col)?;
            self.pool.region_mut(region).bind_local(out_col, var);
        }
        self.dispatch_view(region, succ)
    }

    fn lookup_var(&mut self, region: RegionId, view: ViewId, column: u32) -> BuildResult<VariableId> {
        let v = self
            .query
            .view(view)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view}")))?;
        let col = v
            .columns()
            .iter()
            .find(|c| c.id() == column)
            .ok_or(BuildError::UnresolvedColumn { view, column })?
            .clone();
        self.pool.variable_for(region, view, &col)
    }

    /// The main per-view-kind dispatch (SPEC_FULL §4.2).
    fn dispatch_view(&mut self, region: RegionId, view_id: ViewId) -> BuildResult<()> {
        let view = self
            .query
            .view(view_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view_id}")))?
            .clone();

        match view.kind() {
            datalog_ir::ViewKind::Select(_) | datalog_ir::ViewKind::Stream(_) => {
                // Sources are never themselves dispatch targets in forward
                // flow; a select is re-entered via `relation_selects` from
                // whatever inserts into its relation.
                Ok(())
            }
            datalog_ir::ViewKind::Tuple(_) => self.dispatch_successors(region, view_id),
            datalog_ir::ViewKind::Compare(cmp) => {
                let cmp = cmp.clone();
                self.dispatch_compare(region, view_id, &cmp)
            }
            datalog_ir::ViewKind::Join(join) => {
                let join = join.clone();
                self.dispatch_join(region, view_id, &join)
            }
            datalog_ir::ViewKind::Product(product) => {
                let inputs = product.inputs.clone();
                self.dispatch_product_like(region, view_id, &inputs)
            }
            datalog_ir::ViewKind::Map(map) => {
                let map = map.clone();
                self.dispatch_map(region, view_id, &map)
            }
            datalog_ir::ViewKind::Negate(neg) => {
                let neg = neg.clone();
                self.dispatch_negate(region, view_id, &neg)
            }
            datalog_ir::ViewKind::Union(_) => self.dispatch_union(region, view_id),
            datalog_ir::ViewKind::Insert(insert) => {
                let insert = insert.clone();
                self.dispatch_insert(region, view_id, &insert)
            }
        }
    }

    fn push_operand(&mut self, op: RegionId, var: VariableId) {
        if let RegionData::Operation(o) = self.pool.region_mut(op).data_mut() {
            o.data.variables.push(var);
        }
    }

    /// Equality canonicalizes to the smaller variable id (or the constant
    /// operand); inequality is represented as equality with body/false-body
    /// swapped (SPEC_FULL §4.2).
    fn dispatch_compare(
        &mut self,
        region: RegionId,
        view_id: ViewId,
        cmp: &datalog_ir::CompareView,
    ) -> BuildResult<()> {
        let op = self.pool.create_operation(region, OperationKind::TupleCompare);
        self.pool.append_child(region, op);

        if let Operand::Column(lhs) = &cmp.lhs {
            let var = self.lookup_var(region, cmp.input, *lhs)?;
            self.push_operand(op, var);
        }
        if let Operand::Column(rhs) = &cmp.rhs {
            let var = self.lookup_var(region, cmp.input, *rhs)?;
            self.push_operand(op, var);
        }

        let true_body = self.pool.create_series(op);
        let false_body = self.pool.create_series(op);
        let (pass_body, fail_body) = if cmp.op.is_equality_shaped() && matches!(cmp.op, CompareOp::Neq)
        {
            (false_body, true_body)
        } else {
            (true_body, false_body)
        };
        set_operation_body(&mut self.pool, op, pass_body);
        set_operation_alt_body(&mut self.pool, op, AltBodyKind::False, fail_body);

        self.dispatch_successors(pass_body, view_id)
    }

    /// Join with N pivots: scan each non-originating table through its
    /// pivot index; join with zero pivots (every input's pivot list empty)
    /// degenerates to a cross-product (SPEC_FULL §4.2).
    fn dispatch_join(&mut self, region: RegionId, view_id: ViewId, join: &datalog_ir::JoinView) -> BuildResult<()> {
        if join.is_cross_product() {
            return self.dispatch_product_like(region, view_id, &join.inputs);
        }

        let op = self.pool.create_operation(region, OperationKind::TableJoin);
        self.pool.append_child(region, op);

        for (input, pivot_cols) in join.inputs.iter().zip(&join.pivots) {
            let table = self.pool.get_or_create_table(self.query, *input)?;
            let input_view = self
                .query
                .view(*input)
                .ok_or_else(|| BuildError::Other(format!("unknown view {input}")))?;
            let mut key_indices = Vec::with_capacity(pivot_cols.len());
            for pivot_col in pivot_cols {
                let idx = input_view
                    .columns()
                    .iter()
                    .find(|c| c.id() == *pivot_col)
                    .map(|c| c.index())
                    .ok_or(BuildError::UnresolvedColumn { view: *input, column: *pivot_col })?;
                key_indices.push(idx);
            }
            let index = self.pool.get_or_create_index(table, key_indices);
            if let RegionData::Operation(o) = self.pool.region_mut(op).data_mut() {
                o.data.tables.push(table);
                o.data.indices.push(index);
            }
        }

        let body = self.pool.create_series(op);
        set_operation_body(&mut self.pool, op, body);
        self.dispatch_successors(body, view_id)
    }

    fn dispatch_product_like(&mut self, region: RegionId, view_id: ViewId, inputs: &[ViewId]) -> BuildResult<()> {
        let op = self.pool.create_operation(region, OperationKind::TableProduct);
        self.pool.append_child(region, op);
        for input in inputs {
            let table = self.pool.get_or_create_table(self.query, *input)?;
            if let RegionData::Operation(o) = self.pool.region_mut(op).data_mut() {
                o.data.tables.push(table);
            }
        }
        let body = self.pool.create_series(op);
        set_operation_body(&mut self.pool, op, body);
        self.dispatch_successors(body, view_id)
    }

    /// Pure filter: body runs when the functor returns true, empty-body
    /// when false. Generative: body runs per generated output. Impure
    /// functors get a backing table so their output is recorded rather than
    /// re-derived by re-invoking the functor (SPEC_FULL §4.2, §9, Open
    /// Question "impure functors", decided in DESIGN.md).
    fn dispatch_map(&mut self, region: RegionId, view_id: ViewId, map: &datalog_ir::MapView) -> BuildResult<()> {
        if !map.is_pure {
            let _ = self.pool.get_or_create_table(self.query, view_id)?;
        }

        let op = self.pool.create_operation(region, OperationKind::Generator);
        self.pool.append_child(region, op);

        let body = self.pool.create_series(op);
        set_operation_body(&mut self.pool, op, body);
        if map.is_filter {
            let empty_body = self.pool.create_series(op);
            set_operation_alt_body(&mut self.pool, op, AltBodyKind::Empty, empty_body);
        }

        self.dispatch_successors(body, view_id)
    }

    /// Calls the negated view's top-down checker; descends into successors
    /// only when it reports the tuple absent (SPEC_FULL §4.2).
    fn dispatch_negate(&mut self, region: RegionId, view_id: ViewId, neg: &datalog_ir::NegateView) -> BuildResult<()> {
        let op = self.pool.create_operation(region, OperationKind::CheckerCall);
        self.pool.append_child(region, op);
        let negated_table = self.pool.get_or_create_table(self.query, neg.negated)?;
        if let RegionData::Operation(o) = self.pool.region_mut(op).data_mut() {
            o.data.tables.push(negated_table);
        }

        let absent_body = self.pool.create_series(op);
        let present_body = self.pool.create_series(op);
        set_operation_body(&mut self.pool, op, absent_body);
        set_operation_alt_body(&mut self.pool, op, AltBodyKind::Unknown, present_body);
        self.dispatch_successors(absent_body, view_id)
    }

    /// Inductive unions append to their group's add-vector instead of
    /// descending (SPEC_FULL §4.3); non-inductive unions dedup-insert into
    /// the shared table, then descend like any other relation insert.
    fn dispatch_union(&mut self, region: RegionId, view_id: ViewId) -> BuildResult<()> {
        if let Some(group) = self.query.induction_group_id(view_id) {
            self.induction.record_append(&mut self.pool, self.query, group, region, view_id)?;
            return Ok(());
        }
        self.dispatch_relation_insert(region, view_id, None)
    }

    /// Insert into a relation transitions absent/unknown → present and
    /// descends on first-time insertion, re-triggering any select reading
    /// the same relation; insert into a stream publishes (SPEC_FULL §4.2).
    fn dispatch_insert(&mut self, region: RegionId, view_id: ViewId, insert: &datalog_ir::InsertView) -> BuildResult<()> {
        if insert.is_stream {
            let op = self.pool.create_operation(region, OperationKind::Publish);
            self.pool.append_child(region, op);
            return Ok(());
        }
        self.dispatch_relation_insert(region, view_id, Some(insert.relation.clone()))
    }

    /// Shared by non-inductive unions and relation inserts: check/insert
    /// state, descend into the view's own successors on first insertion,
    /// and (when `relation` is known) re-trigger every select reading it.
    fn dispatch_relation_insert(
        &mut self,
        region: RegionId,
        view_id: ViewId,
        relation: Option<String>,
    ) -> BuildResult<()> {
        let table = self.pool.get_or_create_table(self.query, view_id)?;

        let check = self.pool.create_operation(region, OperationKind::StateCheck);
        self.pool.append_child(region, check);
        if let RegionData::Operation(o) = self.pool.region_mut(check).data_mut() {
            o.data.tables.push(table);
        }

        let absent_body = self.pool.create_series(check);
        let present_body = self.pool.create_series(check);
        set_operation_body(&mut self.pool, check, absent_body);
        set_operation_alt_body(&mut self.pool, check, AltBodyKind::Absent, present_body);

        let insert_op = self.pool.create_operation(absent_body, OperationKind::TableInsert);
        self.pool.append_child(absent_body, insert_op);
        if let RegionData::Operation(o) = self.pool.region_mut(insert_op).data_mut() {
            o.data.tables.push(table);
        }

        self.dispatch_successors(absent_body, view_id)?;

        if let Some(relation) = relation {
            if let Some(selects) = self.relation_selects.get(&relation).cloned() {
                for select_view in selects {
                    self.rebind_and_dispatch(absent_body, view_id, select_view)?;
                }
            }
        }
        Ok(())
    }

    /// A relation's `InsertView` and a `SelectView` reading the same
    /// relation are separate graph nodes with separate column ids but an
    /// identical positional schema; this binds the select's columns to the
    /// already-resolved insert-side variables (matched by column index)
    /// before dispatching into the select's successors.
    fn rebind_and_dispatch(&mut self, region: RegionId, from_view: ViewId, target_view: ViewId) -> BuildResult<()> {
        let from_cols: Vec<(u32, usize)> = self
            .query
            .view(from_view)
            .ok_or_else(|| BuildError::Other(format!("unknown view {from_view}")))?
            .columns()
            .iter()
            .map(|c| (c.id(), c.index()))
            .collect();
        let target_cols: Vec<(u32, usize)> = self
            .query
            .view(target_view)
            .ok_or_else(|| BuildError::Other(format!("unknown view {target_view}")))?
            .columns()
            .iter()
            .map(|c| (c.id(), c.index()))
            .collect();

        for (target_col, target_idx) in target_cols {
            if let Some((from_col, _)) = from_cols.iter().find(|(_, idx)| *idx == target_idx) {
                let var = self.lookup_var(region, from_view, *from_col)?;
                self.pool.region_mut(region).bind_local(target_col, var);
            }
        }
        self.dispatch_successors(region, target_view)
    }

    fn bind_own_columns_for(&mut self, region: RegionId, view_id: ViewId) -> BuildResult<()> {
        let view = self
            .query
            .view(view_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view_id}")))?
            .clone();
        self.bind_own_columns(region, &view)
    }

    // ----------------------------------------------------------------
    // Induction finalization (SPEC_FULL §4.3, Phase B/C)
    // ----------------------------------------------------------------

    /// Splices every induction group discovered during ordinary forward
    /// dispatch into the tree, in ascending-depth order, and builds its
    /// cyclic and output region bodies.
    fn finalize_inductions(&mut self) -> BuildResult<()> {
        for group in self.induction.groups_by_depth() {
            self.finalize_group(group)?;
        }
        Ok(())
    }

    fn finalize_group(&mut self, group: InductionGroupId) -> BuildResult<()> {
        let induction_region = self.induction.region_of(group);

        let sites = self.induction.append_sites_of(group).to_vec();
        let mut anchor = sites[0];
        for &site in &sites[1..] {
            anchor = self.pool.find_common_ancestor(anchor, site);
        }
        self.pool.execute_after(anchor, induction_region);

        let representative = self
            .query
            .views()
            .find(|v| self.query.induction_group_id(v.id()) == Some(group))
            .map(View::id)
            .expect("an induction group always has at least one member view");
        let members: Vec<ViewId> = self.query.inductive_set(representative).into_iter().collect();

        let (cyclic_region, output_region) = match self.pool.region(induction_region).data() {
            RegionData::Induction(i) => (i.cyclic_region, i.output_region),
            _ => unreachable!("create_induction always returns an Induction region"),
        };

        for &view_id in &members {
            self.build_cyclic_series(cyclic_region, group, view_id)?;
            self.build_output_series(output_region, group, view_id)?;
        }

        if let RegionData::Induction(i) = self.pool.region_mut(induction_region).data_mut() {
            i.phase = InductionPhase::Sealed;
        }
        Ok(())
    }

    /// One view's series in the cyclic parallel region: sort-unique the
    /// add-vector, swap it with the (just-cleared) swap-vector, then loop
    /// over the swap-vector dispatching into the view's inductive
    /// successors only (SPEC_FULL §4.3 Phase B step 2).
    fn build_cyclic_series(&mut self, cyclic_region: RegionId, group: InductionGroupId, view_id: ViewId) -> BuildResult<()> {
        let series = self.pool.create_series(cyclic_region);
        self.pool.append_child(cyclic_region, series);

        let (add, swap) = self.vector_pair(group, view_id);

        let clear = self.pool.create_operation(series, OperationKind::VectorClear);
        self.pool.append_child(series, clear);
        self.push_vector(clear, swap);

        let unique = self.pool.create_operation(series, OperationKind::VectorUnique);
        self.pool.append_child(series, unique);
        self.push_vector(unique, add);

        let swap_op = self.pool.create_operation(series, OperationKind::VectorSwap);
        self.pool.append_child(series, swap_op);
        self.push_vector(swap_op, add);
        self.push_vector(swap_op, swap);

        let loop_op = self.pool.create_operation(series, OperationKind::VectorLoop);
        self.pool.append_child(series, loop_op);
        self.push_vector(loop_op, swap);
        let loop_body = self.pool.create_series(loop_op);
        set_operation_body(&mut self.pool, loop_op, loop_body);

        self.bind_own_columns_for(loop_body, view_id)?;
        for succ in self.query.inductive_successors(view_id) {
            self.dispatch_into_successor(loop_body, view_id, succ)?;
        }
        Ok(())
    }

    /// One view's series in the output region: drains the settled
    /// swap-vector into a dedicated output vector, then loops the output
    /// vector dispatching into non-inductive successors, then clears every
    /// vector belonging to this view (SPEC_FULL §4.3 Phase C).
    fn build_output_series(&mut self, output_region: RegionId, group: InductionGroupId, view_id: ViewId) -> BuildResult<()> {
        let (add, swap) = self.vector_pair(group, view_id);
        let output = match self.pool.region(self.induction.region_of(group)).data() {
            RegionData::Induction(i) => i.output_vectors[&view_id],
            _ => unreachable!(),
        };

        let copy_loop = self.pool.create_operation(output_region, OperationKind::VectorLoop);
        self.pool.append_child(output_region, copy_loop);
        self.push_vector(copy_loop, swap);
        let copy_body = self.pool.create_series(copy_loop);
        set_operation_body(&mut self.pool, copy_loop, copy_body);
        self.bind_own_columns_for(copy_body, view_id)?;
        let copy_append = self.pool.create_operation(copy_body, OperationKind::VectorAppend);
        self.pool.append_child(copy_body, copy_append);
        self.push_vector(copy_append, output);
        let vars = self.column_vars(copy_body, view_id)?;
        if let RegionData::Operation(o) = self.pool.region_mut(copy_append).data_mut() {
            o.data.variables = vars;
        }

        let emit_loop = self.pool.create_operation(output_region, OperationKind::VectorLoop);
        self.pool.append_child(output_region, emit_loop);
        self.push_vector(emit_loop, output);
        let emit_body = self.pool.create_series(emit_loop);
        set_operation_body(&mut self.pool, emit_loop, emit_body);
        self.bind_own_columns_for(emit_body, view_id)?;
        for succ in self.query.non_inductive_successors(view_id) {
            self.dispatch_into_successor(emit_body, view_id, succ)?;
        }

        for v in [add, swap, output] {
            let clear = self.pool.create_operation(output_region, OperationKind::VectorClear);
            self.pool.append_child(output_region, clear);
            self.push_vector(clear, v);
        }
        Ok(())
    }

    fn vector_pair(&self, group: InductionGroupId, view_id: ViewId) -> (crate::cfg::ids::VectorId, crate::cfg::ids::VectorId) {
        match self.pool.region(self.induction.region_of(group)).data() {
            RegionData::Induction(i) => (i.add_vectors[&view_id], i.swap_vectors[&view_id]),
            _ => unreachable!(),
        }
    }

    fn push_vector(&mut self, op: RegionId, vector: crate::cfg::ids::VectorId) {
        if let RegionData::Operation(o) = self.pool.region_mut(op).data_mut() {
            o.data.vectors.push(vector);
        }
    }

    fn column_vars(&mut self, region: RegionId, view_id: ViewId) -> BuildResult<Vec<VariableId>> {
        let view = self
            .query
            .view(view_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view_id}")))?
            .clone();
        let mut vars = Vec::with_capacity(view.columns().len());
        for col in view.columns() {
            vars.push(self.pool.variable_for(region, view_id, col)?);
        }
        Ok(vars)
    }
}
