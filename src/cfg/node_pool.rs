//! The pool owning every region, procedure, table, index, and variable
//! (SPEC_FULL §4.1).
//!
//! Ids are small integers drawn from the vector's own length, so a freshly
//! `Create`d node's id always matches its storage slot — there is no
//! separate counter to keep in sync. Regions are stored as `Option<Region>`
//! so `remove_unused` can tombstone a slot without invalidating every id
//! that comes after it.

use crate::cfg::error::{BuildError, BuildResult};
use crate::cfg::ids::{IndexId, RegionId, TableId, VariableId, VectorId};
use crate::cfg::operation::OperationKind;
use crate::cfg::region::{
    AltBodyKind, InductionRegion, OperationData, OperationRegion, ParallelRegion, Procedure,
    ProcedureKind, Region, RegionData, SeriesRegion,
};
use crate::cfg::table::{attach_index, column_spec, DataModel, Index, Table};
use crate::cfg::variable::{Variable, VariableOrigin, VariableRole};
use crate::cfg::vector::{Vector, VectorKind};
use datalog_ir::{Column, ColumnType, Literal, Query, ViewId};
use std::collections::BTreeMap;

pub struct NodePool {
    regions: Vec<Option<Region>>,
    variables: Vec<Variable>,
    vectors: Vec<Vector>,
    tables: Vec<Table>,
    indices: Vec<Index>,
    data_model: DataModel,
    index_by_spec: BTreeMap<(TableId, String), IndexId>,
    /// Cache for `VariableFor`'s constant fallback, keyed by a debug
    /// rendering of the literal (or the referenced column id for a
    /// constant-ref). Collisions would only cost a duplicate variable, not
    /// correctness, since the debug rendering of `Literal` is injective for
    /// the variants actually constructed by `datalog_ir`.
    constant_variables: BTreeMap<String, VariableId>,
    procedure_roots: Vec<RegionId>,
}

impl Default for NodePool {
    fn default() -> Self {
        NodePool::new()
    }
}

impl NodePool {
    pub fn new() -> Self {
        NodePool {
            regions: Vec::new(),
            variables: Vec::new(),
            vectors: Vec::new(),
            tables: Vec::new(),
            indices: Vec::new(),
            data_model: DataModel::new(),
            index_by_spec: BTreeMap::new(),
            constant_variables: BTreeMap::new(),
            procedure_roots: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Region accessors
    // ------------------------------------------------------------------

    pub fn region(&self, id: RegionId) -> &Region {
        self.regions[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("region {id:?} has been removed"))
    }

    pub fn region_mut(&mut self, id: RegionId) -> &mut Region {
        self.regions[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("region {id:?} has been removed"))
    }

    pub fn procedure_roots(&self) -> &[RegionId] {
        &self.procedure_roots
    }

    /// Whether `id` still refers to a live slot (not tombstoned by
    /// `remove_unused`).
    pub fn is_live(&self, id: RegionId) -> bool {
        self.regions[id.index()].is_some()
    }

    /// Every currently-live region id, ordered by allocation order (not
    /// depth). Callers that need a bottom-up traversal should sort by
    /// `region(id).depth()` themselves.
    pub fn region_ids(&self) -> Vec<RegionId> {
        self.regions
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| RegionId(i as u32)))
            .collect()
    }

    fn alloc_region(&mut self, parent: RegionId, depth: u32, data: RegionData) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Some(Region::new(id, parent, depth, data)));
        id
    }

    // ------------------------------------------------------------------
    // Create* (SPEC_FULL §4.1)
    // ------------------------------------------------------------------

    pub fn create_procedure(&mut self, kind: ProcedureKind) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Some(Region::new(id, id, 0, RegionData::Procedure(Procedure::new(kind)))));
        self.procedure_roots.push(id);
        id
    }

    pub fn create_series(&mut self, parent: RegionId) -> RegionId {
        let depth = self.region(parent).depth() + 1;
        self.alloc_region(parent, depth, RegionData::Series(SeriesRegion::default()))
    }

    pub fn create_parallel(&mut self, parent: RegionId) -> RegionId {
        let depth = self.region(parent).depth() + 1;
        self.alloc_region(parent, depth, RegionData::Parallel(ParallelRegion::default()))
    }

    /// Creates the induction region and its three named sub-regions
    /// (init/cyclic/output) in one call, per SPEC_FULL §3.
    pub fn create_induction(&mut self, parent: RegionId) -> RegionId {
        let depth = self.region(parent).depth() + 1;
        // Reserve the induction region's id before its children so the
        // children's `parent` pointer is correct from the start.
        let induction_id = RegionId(self.regions.len() as u32);
        self.regions.push(None);
        let init = self.create_series(induction_id);
        let cyclic = self.create_parallel(induction_id);
        let output = self.create_series(induction_id);
        self.regions[induction_id.index()] = Some(Region::new(
            induction_id,
            parent,
            depth,
            RegionData::Induction(InductionRegion::new(init, cyclic, output)),
        ));
        induction_id
    }

    pub fn create_operation(&mut self, parent: RegionId, kind: OperationKind) -> RegionId {
        let depth = self.region(parent).depth() + 1;
        self.alloc_region(
            parent,
            depth,
            RegionData::Operation(OperationRegion { kind, data: OperationData::default() }),
        )
    }

    pub fn set_procedure_body(&mut self, procedure: RegionId, body: RegionId) {
        if let RegionData::Procedure(p) = self.region_mut(procedure).data_mut() {
            p.body = Some(body);
        }
    }

    // ------------------------------------------------------------------
    // Variables, vectors
    // ------------------------------------------------------------------

    pub fn create_variable(
        &mut self,
        role: VariableRole,
        ty: Option<ColumnType>,
        origin: Option<VariableOrigin>,
    ) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        let mut var = Variable::new(id, role, ty);
        if let Some(origin) = origin {
            var = var.with_origin(origin);
        }
        self.variables.push(var);
        id
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn create_vector(&mut self, kind: VectorKind, column_types: Vec<ColumnType>) -> VectorId {
        let id = VectorId(self.vectors.len() as u32);
        self.vectors.push(Vector::new(id, kind, column_types));
        id
    }

    pub fn vector(&self, id: VectorId) -> &Vector {
        &self.vectors[id.index()]
    }

    /// `VariableFor(region, column)` (SPEC_FULL §4.1): consults the local
    /// map, then recurses up through parents, then falls back to the
    /// constant-variable table; fails if the column has no resolvable
    /// binding.
    pub fn variable_for(
        &mut self,
        region: RegionId,
        view: ViewId,
        column: &Column,
    ) -> BuildResult<VariableId> {
        let mut cur = region;
        loop {
            if let Some(v) = self.region(cur).local_binding(column.id()) {
                return Ok(v);
            }
            let parent = self.region(cur).parent();
            if parent == cur {
                break;
            }
            cur = parent;
        }
        if column.is_constant_or_constant_ref() {
            return Ok(self.constant_variable_for(column));
        }
        Err(BuildError::UnresolvedColumn { view, column: column.id() })
    }

    fn constant_variable_for(&mut self, column: &Column) -> VariableId {
        let (key, role, origin) = if let Some(lit) = column.literal() {
            let role = match lit {
                Literal::Int(0) => VariableRole::ConstantZero,
                Literal::Int(1) => VariableRole::ConstantOne,
                Literal::Bool(true) => VariableRole::ConstantTrue,
                Literal::Bool(false) => VariableRole::ConstantFalse,
                _ => VariableRole::Constant,
            };
            (format!("lit:{lit:?}"), role, VariableOrigin::Literal(lit.clone()))
        } else {
            let target = column.constant_ref_target().expect("checked by caller");
            (format!("ref:{target}"), VariableRole::Constant, VariableOrigin::Column(target))
        };
        if let Some(&id) = self.constant_variables.get(&key) {
            return id;
        }
        let id = self.create_variable(role, Some(column.ty()), Some(origin));
        self.constant_variables.insert(key, id);
        id
    }

    // ------------------------------------------------------------------
    // Tables and indices (SPEC_FULL §4.1, invariants 4-5)
    // ------------------------------------------------------------------

    /// Unions `view`'s data model with its predecessors' (per invariant 4,
    /// only when `view` itself carries no conditions/map/compare semantics
    /// that would forbid sharing) and materializes one table per model.
    pub fn get_or_create_table(&mut self, query: &Query, view_id: ViewId) -> BuildResult<TableId> {
        let view = query
            .view(view_id)
            .ok_or_else(|| BuildError::Other(format!("unknown view {view_id}")))?;

        let may_share_with_predecessor = view.positive_conditions().is_empty()
            && view.negative_conditions().is_empty()
            && !view.is_map()
            && !view.is_compare();

        if may_share_with_predecessor {
            for pred in view.direct_predecessors() {
                self.data_model.union(view_id, pred);
            }
        }

        if let Some(table) = self.data_model.table_for(view_id) {
            return Ok(table);
        }

        let id = TableId(self.tables.len() as u32);
        let columns: Vec<ColumnType> = view.columns().iter().map(Column::ty).collect();
        self.tables.push(Table::new(id, columns));
        self.data_model.bind_table(view_id, id);
        Ok(id)
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.index()]
    }

    /// Returns the existing index on `table` whose key columns match, or
    /// creates one (SPEC_FULL invariant 5: dedup key is the sorted
    /// column-spec string).
    pub fn get_or_create_index(&mut self, table: TableId, key_columns: Vec<usize>) -> IndexId {
        let spec = column_spec(&key_columns);
        if let Some(&id) = self.index_by_spec.get(&(table, spec.clone())) {
            return id;
        }
        let id = IndexId(self.indices.len() as u32);
        let mut sorted_keys = key_columns;
        sorted_keys.sort_unstable();
        let num_columns = self.tables[table.index()].columns().len();
        let mapped: Vec<usize> =
            (0..num_columns).filter(|c| !sorted_keys.contains(c)).collect();
        let index = Index::new(id, table, sorted_keys, mapped);
        attach_index(&mut self.tables[table.index()], &index);
        self.indices.push(index);
        self.index_by_spec.insert((table, spec), id);
        id
    }

    pub fn index(&self, id: IndexId) -> &Index {
        &self.indices[id.index()]
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    // ------------------------------------------------------------------
    // Region-tree surgery (SPEC_FULL §4.1)
    // ------------------------------------------------------------------

    /// Appends `child` as the next child of `parent`, which must already be
    /// a `Series` or `Parallel` (from `create_series`/`create_parallel`).
    /// Used while building a region's body top-down, one statement at a
    /// time; `execute_after` is for splicing a region in next to an
    /// existing sibling, which doesn't fit incremental construction where
    /// there may be no prior sibling yet.
    pub fn append_child(&mut self, parent: RegionId, child: RegionId) {
        self.region_mut(child).set_parent(parent);
        match self.region_mut(parent).data_mut() {
            RegionData::Series(s) => s.children.push(child),
            RegionData::Parallel(p) => p.children.push(child),
            _ => panic!("append_child called on a non-series/parallel region"),
        }
    }

    /// Drops `id` from the procedure-root set without touching its body;
    /// used by the optimizer's procedure-level dedup pass to retire a
    /// procedure whose call sites have all been redirected to a structurally
    /// equal survivor. The now-unreferenced body is reclaimed by the next
    /// `remove_unused`.
    pub fn retire_procedure(&mut self, id: RegionId) {
        self.procedure_roots.retain(|&r| r != id);
    }

    pub fn set_children(&mut self, region: RegionId, new_children: Vec<RegionId>) {
        for &child in &new_children {
            self.region_mut(child).set_parent(region);
        }
        match self.region_mut(region).data_mut() {
            RegionData::Series(s) => s.children = new_children,
            RegionData::Parallel(p) => p.children = new_children,
            _ => panic!("set_children called on a non-series/parallel region"),
        }
    }

    /// Splice `new_region` so it runs immediately before `site` within
    /// `site`'s parent, creating a `Series` container if `site`'s parent
    /// isn't already one.
    pub fn execute_before(&mut self, site: RegionId, new_region: RegionId) -> RegionId {
        self.splice(site, new_region, true, false)
    }

    pub fn execute_after(&mut self, site: RegionId, new_region: RegionId) -> RegionId {
        self.splice(site, new_region, false, false)
    }

    /// Splice `new_region` so it runs alongside `site` (order-independent),
    /// creating a `Parallel` container if `site`'s parent isn't already one.
    pub fn execute_alongside(&mut self, site: RegionId, new_region: RegionId) -> RegionId {
        self.splice(site, new_region, false, true)
    }

    fn splice(&mut self, site: RegionId, new_region: RegionId, before: bool, parallel: bool) -> RegionId {
        let parent = self.region(site).parent();
        let fits_existing = if parallel {
            self.region(parent).is_parallel()
        } else {
            self.region(parent).is_series()
        };

        if fits_existing {
            let mut children = match self.region(parent).data() {
                RegionData::Series(s) => s.children.clone(),
                RegionData::Parallel(p) => p.children.clone(),
                _ => unreachable!(),
            };
            let pos = children.iter().position(|&c| c == site).expect("site must be a child of its parent");
            let insert_at = if before { pos } else { pos + 1 };
            children.insert(insert_at, new_region);
            self.set_children(parent, children);
            parent
        } else {
            let depth = self.region(site).depth();
            let container = if parallel {
                self.create_parallel(parent)
            } else {
                self.create_series(parent)
            };
            self.region_mut(container).set_depth(depth);
            let children = if before { vec![new_region, site] } else { vec![site, new_region] };
            self.replace_all_uses_with(site, container);
            self.region_mut(container).set_parent(parent);
            self.set_children(container, children);
            container
        }
    }

    /// Rewalks every region's child references, redirecting `old` to `new`
    /// wherever `old` appears as a child (series/parallel member, procedure
    /// body, induction sub-region, operation body/alt-body), and updates
    /// procedure-root bookkeeping when `old` was itself a root.
    pub fn replace_all_uses_with(&mut self, old: RegionId, new: RegionId) {
        for slot in 0..self.regions.len() {
            let Some(region) = self.regions[slot].take() else { continue };
            let id = region.id();
            let mut region = region;
            match region.data_mut() {
                RegionData::Procedure(p) => {
                    if p.body == Some(old) {
                        p.body = Some(new);
                    }
                }
                RegionData::Series(s) => {
                    for c in s.children.iter_mut() {
                        if *c == old {
                            *c = new;
                        }
                    }
                }
                RegionData::Parallel(p) => {
                    for c in p.children.iter_mut() {
                        if *c == old {
                            *c = new;
                        }
                    }
                }
                RegionData::Induction(i) => {
                    for r in [&mut i.init_region, &mut i.cyclic_region, &mut i.output_region] {
                        if *r == old {
                            *r = new;
                        }
                    }
                }
                RegionData::Operation(o) => {
                    if o.data.body == Some(old) {
                        o.data.body = Some(new);
                    }
                    if let Some((kind, r)) = o.data.alt_body {
                        if r == old {
                            o.data.alt_body = Some((kind, new));
                        }
                    }
                }
            }
            self.regions[id.index()] = Some(region);
        }
        if let Some(pos) = self.procedure_roots.iter().position(|&r| r == old) {
            self.procedure_roots[pos] = new;
        }
    }

    /// Walks `a` and `b` up to equal lexical depth, then together, until a
    /// shared ancestor is found. Fails safe by returning the enclosing
    /// procedure's body when no proper common ancestor exists (SPEC_FULL
    /// §4.1).
    pub fn find_common_ancestor(&self, mut a: RegionId, mut b: RegionId) -> RegionId {
        while self.region(a).depth() > self.region(b).depth() {
            a = self.region(a).parent();
        }
        while self.region(b).depth() > self.region(a).depth() {
            b = self.region(b).parent();
        }
        while a != b {
            let pa = self.region(a).parent();
            let pb = self.region(b).parent();
            if pa == a || pb == b {
                // Hit a procedure root on one side without converging;
                // fail safe to that root rather than looping forever.
                return a;
            }
            a = pa;
            b = pb;
        }
        a
    }

    /// Drops any non-root region unreachable from a procedure root,
    /// following `children()` edges (SPEC_FULL §4.1, "destroyed when no
    /// user references it after optimization"). Returns the number of
    /// regions removed.
    pub fn remove_unused(&mut self) -> usize {
        let mut reachable = vec![false; self.regions.len()];
        let mut stack: Vec<RegionId> = self.procedure_roots.clone();
        while let Some(id) = stack.pop() {
            if reachable[id.index()] {
                continue;
            }
            reachable[id.index()] = true;
            if self.regions[id.index()].is_some() {
                stack.extend(self.region(id).children());
            }
        }
        let mut removed = 0;
        for (idx, slot) in self.regions.iter_mut().enumerate() {
            if !reachable[idx] && slot.is_some() {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    pub fn region_count(&self) -> usize {
        self.regions.iter().filter(|r| r.is_some()).count()
    }
}

/// Adds a false/empty/absent/unknown alternative body to an operation
/// region already created with [`NodePool::create_operation`]. Kept
/// separate from `create_operation` since not every operation kind takes
/// one.
pub fn set_operation_body(pool: &mut NodePool, op: RegionId, body: RegionId) {
    if let RegionData::Operation(o) = pool.region_mut(op).data_mut() {
        o.data.body = Some(body);
    }
}

pub fn set_operation_alt_body(pool: &mut NodePool, op: RegionId, kind: AltBodyKind, body: RegionId) {
    if let RegionData::Operation(o) = pool.region_mut(op).data_mut() {
        o.data.alt_body = Some((kind, body));
    }
}

/// Sets `StateCheck`'s third branch, taken on `TupleState::Unknown`
/// (SPEC_FULL §4.4); every other conditional kind has no use for it.
pub fn set_operation_unknown_body(pool: &mut NodePool, op: RegionId, body: RegionId) {
    if let RegionData::Operation(o) = pool.region_mut(op).data_mut() {
        o.data.unknown_body = Some(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::region::ProcedureKind;

    #[test]
    fn create_induction_wires_three_sub_regions() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::MessageHandler);
        let induction = pool.create_induction(proc);
        let children = pool.region(induction).children();
        assert_eq!(children.len(), 3);
        for c in children {
            assert_eq!(pool.region(c).parent(), induction);
        }
    }

    #[test]
    fn execute_after_wraps_bare_operation_in_a_series() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let first = pool.create_operation(proc, OperationKind::Return);
        pool.set_procedure_body(proc, first);
        let second = pool.create_operation(proc, OperationKind::Publish);
        let container = pool.execute_after(first, second);
        assert!(pool.region(container).is_series());
        assert_eq!(pool.region(container).children(), vec![first, second]);
    }

    #[test]
    fn find_common_ancestor_of_siblings_is_their_parent() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let series = pool.create_series(proc);
        let a = pool.create_operation(series, OperationKind::Return);
        let b = pool.create_operation(series, OperationKind::Publish);
        pool.set_children(series, vec![a, b]);
        assert_eq!(pool.find_common_ancestor(a, b), series);
    }

    #[test]
    fn remove_unused_drops_unreferenced_regions() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let orphan = pool.create_operation(proc, OperationKind::Return);
        let _ = orphan;
        // proc's body was never set, so `orphan` is unreachable.
        let removed = pool.remove_unused();
        assert_eq!(removed, 1);
    }

    #[test]
    fn get_or_create_index_dedups_by_column_spec() {
        let mut pool = NodePool::new();
        let table = TableId(0);
        pool.tables.push(Table::new(table, vec![ColumnType::I64, ColumnType::I64]));
        let a = pool.get_or_create_index(table, vec![0]);
        let b = pool.get_or_create_index(table, vec![0]);
        assert_eq!(a, b);
        let c = pool.get_or_create_index(table, vec![1]);
        assert_ne!(a, c);
    }
}
