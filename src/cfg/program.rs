//! The `Program` output type and its region-tree visitor (SPEC_FULL §6).

use crate::cfg::ids::{RegionId, VariableId};
use crate::cfg::node_pool::NodePool;
use crate::cfg::region::{InductionRegion, OperationRegion, ParallelRegion, Procedure, RegionData, SeriesRegion};

/// The finished output of the CFG builder + optimizer: a pool of tables,
/// indices, vectors, variables, and procedures, plus the set of procedure
/// roots that make up the program's entry points (SPEC_FULL §6).
pub struct Program {
    pool: NodePool,
    procedures: Vec<RegionId>,
    constants: Vec<VariableId>,
    globals: Vec<VariableId>,
}

impl Program {
    /// Partitions every pool variable into the program's constants list or
    /// its globals list by role (SPEC_FULL §6: "constants list, global
    /// variables list").
    pub fn new(pool: NodePool) -> Self {
        let procedures = pool.procedure_roots().to_vec();
        let mut constants = Vec::new();
        let mut globals = Vec::new();
        for (idx, var) in pool.variables().iter().enumerate() {
            if var.is_constant() {
                constants.push(VariableId(idx as u32));
            } else if matches!(var.role(), crate::cfg::variable::VariableRole::Global) {
                globals.push(VariableId(idx as u32));
            }
        }
        Program { pool, procedures, constants, globals }
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut NodePool {
        &mut self.pool
    }

    pub fn procedures(&self) -> &[RegionId] {
        &self.procedures
    }

    pub fn constants(&self) -> &[VariableId] {
        &self.constants
    }

    pub fn globals(&self) -> &[VariableId] {
        &self.globals
    }

    pub fn tables(&self) -> &[crate::cfg::table::Table] {
        self.pool.tables()
    }

    /// Runs `visitor` over every region reachable from every procedure
    /// root, depth-first, parent before children.
    pub fn accept<V: RegionVisitor>(&self, visitor: &mut V) {
        for &root in &self.procedures {
            self.accept_region(root, visitor);
        }
    }

    fn accept_region<V: RegionVisitor>(&self, id: RegionId, visitor: &mut V) {
        let region = self.pool.region(id);
        match region.data() {
            RegionData::Procedure(p) => visitor.visit_procedure(id, p),
            RegionData::Series(s) => visitor.visit_series(id, s),
            RegionData::Parallel(p) => visitor.visit_parallel(id, p),
            RegionData::Induction(i) => visitor.visit_induction(id, i),
            RegionData::Operation(o) => visitor.visit_operation(id, o),
        }
        for child in region.children() {
            self.accept_region(child, visitor);
        }
    }
}

/// One `Visit` method per region kind (SPEC_FULL §6, "consumed by the code
/// generator via a visitor pattern"). Default implementations are no-ops so
/// a visitor interested in only one kind need not implement the rest.
pub trait RegionVisitor {
    fn visit_procedure(&mut self, _id: RegionId, _p: &Procedure) {}
    fn visit_series(&mut self, _id: RegionId, _s: &SeriesRegion) {}
    fn visit_parallel(&mut self, _id: RegionId, _p: &ParallelRegion) {}
    fn visit_induction(&mut self, _id: RegionId, _i: &InductionRegion) {}
    fn visit_operation(&mut self, _id: RegionId, _o: &OperationRegion) {}
}

/// A visitor that simply counts how many regions of each kind it saw;
/// useful as a smoke test for `accept` and as a template for real code
/// generators.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionCounts {
    pub procedures: usize,
    pub series: usize,
    pub parallel: usize,
    pub inductions: usize,
    pub operations: usize,
}

impl RegionVisitor for RegionCounts {
    fn visit_procedure(&mut self, _id: RegionId, _p: &Procedure) {
        self.procedures += 1;
    }
    fn visit_series(&mut self, _id: RegionId, _s: &SeriesRegion) {
        self.series += 1;
    }
    fn visit_parallel(&mut self, _id: RegionId, _p: &ParallelRegion) {
        self.parallel += 1;
    }
    fn visit_induction(&mut self, _id: RegionId, _i: &InductionRegion) {
        self.inductions += 1;
    }
    fn visit_operation(&mut self, _id: RegionId, _o: &OperationRegion) {
        self.operations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::operation::OperationKind;
    use crate::cfg::region::ProcedureKind;

    #[test]
    fn accept_visits_procedure_then_children() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let op = pool.create_operation(proc, OperationKind::Return);
        pool.set_procedure_body(proc, op);
        let program = Program::new(pool);

        let mut counts = RegionCounts::default();
        program.accept(&mut counts);
        assert_eq!(counts.procedures, 1);
        assert_eq!(counts.operations, 1);
    }
}
