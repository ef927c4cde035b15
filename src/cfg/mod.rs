//! The control-flow IR: a `Query` DAG lowered into a tree of regions, then
//! simplified, then handed to a code generator as a [`program::Program`]
//! (SPEC_FULL §3–§4.5).
//!
//! [`builder::CfgBuilder`] drives message-triggered dispatch through every
//! view once per `Query`; [`induction::InductionBuilder`] wires the
//! three-phase work-item discipline a cyclic union needs; [`checker::
//! CheckerBuilder`] synthesizes a recursive provability procedure for every
//! negated view; [`optimizer::optimize`] then simplifies the whole tree to a
//! fixed point before it's handed off.

pub mod builder;
pub mod checker;
pub mod error;
pub mod ids;
pub mod induction;
pub mod node_pool;
pub mod operation;
pub mod optimizer;
pub mod program;
pub mod region;
pub mod table;
pub mod variable;
pub mod vector;

pub use builder::CfgBuilder;
pub use checker::CheckerBuilder;
pub use error::{BuildError, BuildResult};
pub use ids::{IndexId, ProcedureId, RegionId, TableId, VariableId, VectorId};
pub use induction::InductionBuilder;
pub use node_pool::NodePool;
pub use operation::OperationKind;
pub use optimizer::optimize;
pub use program::{Program, RegionCounts, RegionVisitor};
pub use region::{
    AltBodyKind, InductionPhase, InductionRegion, OperationData, OperationRegion, ParallelRegion,
    Procedure, ProcedureKind, Region, RegionData, SeriesRegion,
};
pub use table::{DataModel, Index, Table};
pub use variable::{Variable, VariableOrigin, VariableRole};
pub use vector::{Vector, VectorKind};

/// Lowers `query` into a fully optimized [`Program`] (SPEC_FULL §4.2–§4.5):
/// builds the region tree, then runs the optimizer to a fixed point.
pub fn compile(query: &datalog_ir::Query) -> BuildResult<Program> {
    let mut program = CfgBuilder::build(query)?;
    let removed = optimizer::optimize(program.pool_mut());
    tracing::info!(regions_removed = removed, "cfg compiled");
    Ok(program)
}
