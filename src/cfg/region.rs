//! The region tree (SPEC_FULL §3, §4.1).
//!
//! A `Region` is one of {procedure, series, parallel, induction, operation}.
//! Every region carries a parent pointer (itself, for a procedure root), a
//! lexical depth, and a scoped column→variable map (invariant 3: a region
//! inherits its parent's bindings but writes only into its own).

use crate::cfg::ids::{IndexId, RegionId, TableId, VariableId, VectorId};
use crate::cfg::operation::OperationKind;
use datalog_ir::{ColumnId, ViewId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Entry,
    Primary,
    MessageHandler,
    TupleFinder,
    TupleChecker,
    TupleRemover,
    Initializer,
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub kind: ProcedureKind,
    pub vector_params: Vec<VectorId>,
    pub scalar_params: Vec<VariableId>,
    pub local_vectors: Vec<VectorId>,
    pub body: Option<RegionId>,
}

impl Procedure {
    pub fn new(kind: ProcedureKind) -> Self {
        Procedure {
            kind,
            vector_params: Vec::new(),
            scalar_params: Vec::new(),
            local_vectors: Vec::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeriesRegion {
    pub children: Vec<RegionId>,
}

#[derive(Debug, Clone, Default)]
pub struct ParallelRegion {
    pub children: Vec<RegionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InductionPhase {
    AccumulatingInputs,
    AccumulatingCycle,
    BuildingOutputs,
    Sealed,
}

/// An induction region's three sub-regions plus the per-view vector triples
/// that carry tuples across the add → swap → output rotation (SPEC_FULL
/// §3, §4.3).
#[derive(Debug, Clone)]
pub struct InductionRegion {
    pub init_region: RegionId,
    /// Always a `Parallel` region: one series per participating view.
    pub cyclic_region: RegionId,
    pub output_region: RegionId,
    pub input_views: Vec<ViewId>,
    pub add_vectors: BTreeMap<ViewId, VectorId>,
    pub swap_vectors: BTreeMap<ViewId, VectorId>,
    pub output_vectors: BTreeMap<ViewId, VectorId>,
    pub phase: InductionPhase,
}

impl InductionRegion {
    pub fn new(init_region: RegionId, cyclic_region: RegionId, output_region: RegionId) -> Self {
        InductionRegion {
            init_region,
            cyclic_region,
            output_region,
            input_views: Vec::new(),
            add_vectors: BTreeMap::new(),
            swap_vectors: BTreeMap::new(),
            output_vectors: BTreeMap::new(),
            phase: InductionPhase::AccumulatingInputs,
        }
    }
}

/// The second alternative body a conditional operation kind may carry,
/// named per the kind of condition it guards (SPEC_FULL §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltBodyKind {
    False,
    Empty,
    Absent,
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct OperationData {
    pub variables: Vec<VariableId>,
    pub vectors: Vec<VectorId>,
    pub tables: Vec<TableId>,
    pub indices: Vec<IndexId>,
    pub body: Option<RegionId>,
    pub alt_body: Option<(AltBodyKind, RegionId)>,
    /// `StateCheck`'s third branch: `TupleState::Unknown` (SPEC_FULL §3,
    /// "up to three optional child regions"; §4.4, "if unknown mark absent,
    /// then call the inserter's predecessor checker"). Every other
    /// conditional kind is a two-way branch and leaves this `None`.
    pub unknown_body: Option<RegionId>,
    /// The callee procedure, for `Call`/`CheckerCall` operations.
    pub procedure: Option<RegionId>,
}

#[derive(Debug, Clone)]
pub struct OperationRegion {
    pub kind: OperationKind,
    pub data: OperationData,
}

/// The kind-specific payload of a `Region` (SPEC_FULL §3).
#[derive(Debug, Clone)]
pub enum RegionData {
    Procedure(Procedure),
    Series(SeriesRegion),
    Parallel(ParallelRegion),
    Induction(InductionRegion),
    Operation(OperationRegion),
}

/// One node of the control-flow tree.
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    parent: RegionId,
    depth: u32,
    bindings: BTreeMap<ColumnId, VariableId>,
    data: RegionData,
}

impl Region {
    pub fn new(id: RegionId, parent: RegionId, depth: u32, data: RegionData) -> Self {
        Region { id, parent, depth, bindings: BTreeMap::new(), data }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn parent(&self) -> RegionId {
        self.parent
    }

    pub fn set_parent(&mut self, parent: RegionId) {
        self.parent = parent;
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    pub fn is_procedure_root(&self) -> bool {
        self.parent == self.id
    }

    pub fn data(&self) -> &RegionData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut RegionData {
        &mut self.data
    }

    /// Bind `column` to `variable` in this region's own scope (invariant 3:
    /// writes only into this region's map, never a parent's).
    pub fn bind_local(&mut self, column: ColumnId, variable: VariableId) {
        self.bindings.insert(column, variable);
    }

    pub fn local_binding(&self, column: ColumnId) -> Option<VariableId> {
        self.bindings.get(&column).copied()
    }

    /// Children of this region, in order, regardless of kind. A procedure
    /// yields its body as a single-element list; a series/parallel yields
    /// its child list; an induction yields its three named sub-regions; an
    /// operation yields `body` then `alt_body` if present.
    pub fn children(&self) -> Vec<RegionId> {
        match &self.data {
            RegionData::Procedure(p) => p.body.into_iter().collect(),
            RegionData::Series(s) => s.children.clone(),
            RegionData::Parallel(p) => p.children.clone(),
            RegionData::Induction(i) => vec![i.init_region, i.cyclic_region, i.output_region],
            RegionData::Operation(o) => {
                let mut out: Vec<RegionId> = o.data.body.into_iter().collect();
                out.extend(o.data.alt_body.map(|(_, r)| r));
                out.extend(o.data.unknown_body);
                out
            }
        }
    }

    /// SPEC_FULL invariant 2: `EndsWithReturn` is transitive.
    pub fn ends_with_return(&self, pool: &super::node_pool::NodePool) -> bool {
        match &self.data {
            RegionData::Procedure(p) => {
                p.body.map(|b| pool.region(b).ends_with_return(pool)).unwrap_or(false)
            }
            RegionData::Series(s) => {
                s.children.iter().any(|c| pool.region(*c).ends_with_return(pool))
            }
            RegionData::Parallel(p) => {
                !p.children.is_empty()
                    && p.children.iter().all(|c| pool.region(*c).ends_with_return(pool))
            }
            RegionData::Induction(_) => false,
            RegionData::Operation(o) => {
                if o.kind == OperationKind::Return {
                    return true;
                }
                match (o.data.body, o.data.alt_body) {
                    (Some(body), Some((_, alt))) => {
                        pool.region(body).ends_with_return(pool)
                            && pool.region(alt).ends_with_return(pool)
                            && o.data
                                .unknown_body
                                .map(|u| pool.region(u).ends_with_return(pool))
                                .unwrap_or(true)
                    }
                    _ => false,
                }
            }
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self.data, RegionData::Series(_))
    }
    pub fn is_parallel(&self) -> bool {
        matches!(self.data, RegionData::Parallel(_))
    }
    pub fn is_induction(&self) -> bool {
        matches!(self.data, RegionData::Induction(_))
    }
    pub fn is_operation(&self) -> bool {
        matches!(self.data, RegionData::Operation(_))
    }
    pub fn is_procedure(&self) -> bool {
        matches!(self.data, RegionData::Procedure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_root_parents_itself() {
        let r = Region::new(RegionId(0), RegionId(0), 0, RegionData::Procedure(Procedure::new(ProcedureKind::Entry)));
        assert!(r.is_procedure_root());
    }

    #[test]
    fn non_root_children_report_themselves() {
        let r = Region::new(
            RegionId(1),
            RegionId(0),
            1,
            RegionData::Series(SeriesRegion { children: vec![RegionId(2), RegionId(3)] }),
        );
        assert_eq!(r.children(), vec![RegionId(2), RegionId(3)]);
    }

    #[test]
    fn local_bindings_do_not_leak_to_a_fresh_region() {
        let mut r = Region::new(RegionId(0), RegionId(0), 0, RegionData::Procedure(Procedure::new(ProcedureKind::Entry)));
        r.bind_local(5, VariableId(9));
        assert_eq!(r.local_binding(5), Some(VariableId(9)));
        assert_eq!(r.local_binding(6), None);
    }
}
