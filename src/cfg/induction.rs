//! The induction engine's bookkeeping (SPEC_FULL §4.3): tracks, per
//! induction group, where non-inductive and cyclic predecessors append
//! tuples, and the per-view add/swap/output vector triples.
//!
//! Building the cyclic and output region bodies needs to re-enter the CFG
//! builder's general view dispatch (an inductive successor can itself be a
//! join, a map, another union, ...), so that half of Phase B/C lives on
//! [`super::builder::CfgBuilder`] as `finalize_inductions`; this module only
//! owns the per-group state that accumulates while the builder's ordinary
//! forward dispatch runs.

use crate::cfg::error::BuildResult;
use crate::cfg::ids::{RegionId, VectorId};
use crate::cfg::node_pool::NodePool;
use crate::cfg::operation::OperationKind;
use crate::cfg::region::RegionData;
use crate::cfg::vector::VectorKind;
use datalog_ir::{Column, InductionGroupId, Query, ViewId};
use std::collections::BTreeMap;

#[derive(Default)]
pub struct InductionBuilder {
    regions: BTreeMap<InductionGroupId, RegionId>,
    append_sites: BTreeMap<InductionGroupId, Vec<RegionId>>,
    depths: BTreeMap<InductionGroupId, u32>,
}

impl InductionBuilder {
    pub fn new() -> Self {
        InductionBuilder::default()
    }

    /// Phase B step 1 (SPEC_FULL §4.3): record that `view_id` (a member of
    /// `group`) received a tuple at `region`, emitting the `VectorAppend`
    /// that writes it onto the group's per-view add-vector. Lazily creates
    /// the group's induction region, anchored under `region`'s enclosing
    /// procedure, the first time any of its views is reached.
    pub fn record_append(
        &mut self,
        pool: &mut NodePool,
        query: &Query,
        group: InductionGroupId,
        region: RegionId,
        view_id: ViewId,
    ) -> BuildResult<()> {
        self.depths.entry(group).or_insert_with(|| query.induction_depth(view_id));

        let induction_region = match self.regions.get(&group) {
            Some(&r) => r,
            None => {
                let proc_root = procedure_root_of(pool, region);
                let r = pool.create_induction(proc_root);
                self.regions.insert(group, r);
                r
            }
        };

        let add_vector = self.ensure_vectors(pool, induction_region, query, view_id);

        let view = query.view(view_id).expect("view_id came from the query");
        let mut vars = Vec::with_capacity(view.columns().len());
        for col in view.columns() {
            vars.push(pool.variable_for(region, view_id, col)?);
        }

        let append_op = pool.create_operation(region, OperationKind::VectorAppend);
        pool.append_child(region, append_op);
        if let RegionData::Operation(o) = pool.region_mut(append_op).data_mut() {
            o.data.vectors.push(add_vector);
            o.data.variables = vars;
        }

        self.append_sites.entry(group).or_default().push(region);
        Ok(())
    }

    /// Creates (once per view) the add/swap/output vector triple for
    /// `view_id` within its group's induction region.
    fn ensure_vectors(&mut self, pool: &mut NodePool, induction_region: RegionId, query: &Query, view_id: ViewId) -> VectorId {
        if let RegionData::Induction(i) = pool.region(induction_region).data() {
            if let Some(&existing) = i.add_vectors.get(&view_id) {
                return existing;
            }
        }
        let view = query.view(view_id).expect("view_id came from the query");
        let types: Vec<_> = view.columns().iter().map(Column::ty).collect();
        let add = pool.create_vector(VectorKind::InductionInput, types.clone());
        let swap = pool.create_vector(VectorKind::InductionSwap, types.clone());
        let output = pool.create_vector(VectorKind::InductionOutput, types);
        if let RegionData::Induction(i) = pool.region_mut(induction_region).data_mut() {
            i.add_vectors.insert(view_id, add);
            i.swap_vectors.insert(view_id, swap);
            i.output_vectors.insert(view_id, output);
            i.input_views.push(view_id);
        }
        add
    }

    /// Every group discovered so far, ordered by ascending depth (SPEC_FULL
    /// §4.3: "an induction's own cycle is fully populated before any
    /// downstream induction begins its finalization").
    pub fn groups_by_depth(&self) -> Vec<InductionGroupId> {
        let mut groups: Vec<InductionGroupId> = self.regions.keys().copied().collect();
        groups.sort_by_key(|g| (self.depths.get(g).copied().unwrap_or(0), *g));
        groups
    }

    pub fn region_of(&self, group: InductionGroupId) -> RegionId {
        self.regions[&group]
    }

    pub fn append_sites_of(&self, group: InductionGroupId) -> &[RegionId] {
        self.append_sites.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn procedure_root_of(pool: &NodePool, mut r: RegionId) -> RegionId {
    loop {
        let region = pool.region(r);
        if region.is_procedure_root() {
            return r;
        }
        r = region.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::region::ProcedureKind;
    use datalog_ir::{ColumnType, JoinView, QueryBuilder, SelectView, UnionView, View, ViewKind};

    fn col(id: u32) -> Column {
        Column::new(id, id as usize, ColumnType::I64)
    }

    fn cyclic_union_query() -> Query {
        let mut b = QueryBuilder::new();
        let u = b.alloc_id();
        let v = b.alloc_id();
        let s = b.alloc_id();
        let join_uv = b.alloc_id();
        b.insert(View::new(s, vec![col(0)], ViewKind::Select(SelectView { relation: "s".into() })));
        b.insert(View::new(u, vec![col(1)], ViewKind::Union(UnionView { inputs: vec![v] })));
        b.insert(View::new(
            join_uv,
            vec![col(2)],
            ViewKind::Join(JoinView { inputs: vec![u, s], pivots: vec![vec![1], vec![0]] }),
        ));
        b.insert(View::new(v, vec![col(3)], ViewKind::Union(UnionView { inputs: vec![join_uv] })));
        b.build()
    }

    #[test]
    fn record_append_creates_one_induction_region_per_group() {
        let query = cyclic_union_query();
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::MessageHandler);
        let body = pool.create_series(proc);
        pool.set_procedure_body(proc, body);
        // Bind union `u`'s (view 1) own column locally, as ordinary forward
        // dispatch would have before reaching it.
        let var = pool.create_variable(crate::cfg::variable::VariableRole::LoopInduction, Some(ColumnType::I64), None);
        pool.region_mut(body).bind_local(1, var);

        let mut induction = InductionBuilder::new();
        induction.record_append(&mut pool, &query, 0, body, 1).unwrap();

        assert_eq!(induction.groups_by_depth(), vec![0]);
        assert_eq!(induction.append_sites_of(0), &[body]);
    }
}
