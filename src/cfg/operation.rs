//! The flattened operation-kind tag (SPEC_FULL §3, §9 "deep inheritance of
//! operation-region kinds").
//!
//! The original runtime models each operation as its own class in a deep
//! inheritance hierarchy; here that collapses to one tagged enum plus the
//! typed sub-lists (`variables`/`vectors`/`tables`/`indices`) and optional
//! child regions carried by [`super::region::OperationRegion`]. Downcasts
//! become `matches!`/pattern matches instead of `AsX()` methods.

/// One of the operation-region kinds an [`super::region::OperationRegion`]
/// may be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    /// Loop over a vector's tuples, binding one variable per column per
    /// iteration. Drives message dispatch, induction swap-vector iteration,
    /// and table-scan iteration.
    VectorLoop,
    /// Append the bound variables as one tuple onto a vector.
    VectorAppend,
    /// Clear a vector back to empty (induction swap rotation).
    VectorClear,
    /// Sort-and-deduplicate a vector in place (induction fixpoint prep,
    /// message-output drain).
    VectorUnique,
    /// Swap the identities of two vectors (induction add ↔ swap rotation).
    VectorSwap,
    /// Insert the bound tuple into a table, transitioning its state from
    /// absent-or-unknown to present.
    TableInsert,
    /// Remove a tuple from a table's live set without discarding its state
    /// cell (transition to absent; distinct from `TableInsert`'s reverse
    /// because removal must preserve the row for re-insertion bookkeeping).
    TableRemove,
    /// Three-way branch on a tuple's current `TupleState` (absent / present
    /// / unknown); the body the generated code takes depends on which.
    StateCheck,
    /// Mutate a tuple's `TupleState` cell in place.
    StateChange,
    /// Check whether a record (non-tuple-state auxiliary fact, e.g. a
    /// condition ref-count) is currently nonzero.
    RecordCheck,
    /// Mutate a record's ref-count.
    RecordChange,
    /// Scan a table through one of its indices, binding pivot-matched rows.
    TableScan,
    /// For each group of a pivot vector, scan every non-originating table
    /// through its pivot index (SPEC_FULL §4.2, "join with N pivots").
    TableJoin,
    /// Nested nested-loop join over one input vector per predecessor, used
    /// for zero-pivot (cross product) joins (SPEC_FULL §4.2).
    TableProduct,
    /// Compare two variables (or a variable and a constant) per `CompareOp`.
    TupleCompare,
    /// Invoke another procedure, binding its vector/scalar parameters.
    Call,
    /// Invoke a synthesized top-down checker procedure; unlike `Call`, the
    /// caller branches on the returned boolean rather than discarding it.
    CheckerCall,
    /// Return from the enclosing procedure (with a boolean result for
    /// checker procedures, none for message handlers).
    Return,
    /// Append the bound tuple to a message's output vector.
    Publish,
    /// Assert that a condition's ref-count is nonzero, failing the
    /// enclosing derivation if it is not.
    ExistenceAssert,
    /// Check a condition's ref-count without asserting; branches like
    /// `StateCheck` but over the record space.
    ExistenceCheck,
    /// Bind a new variable to an existing variable's value without copying
    /// storage (optimizer-eliminable pass-through).
    Let,
    /// Invoke a functor (map/filter); the body runs per generated output
    /// tuple, or once if the functor is a pure filter and returns true.
    Generator,
    /// Bind the current worker's id to a variable (induction per-worker
    /// sharding, SPEC_FULL §5).
    WorkerId,
    /// Branch on which structural mode a region is running in (e.g.
    /// insertion vs. deletion pass over the same loop body).
    ModeSwitch,
    /// Guard a procedure body so it runs exactly once across the program's
    /// lifetime (constant-only tuple scenario, SPEC_FULL §8).
    InitGuardCheck,
    /// Flip an init-guard variable to "already run" after its guarded body
    /// executes.
    InitGuardSet,
}

impl OperationKind {
    /// Kinds whose `body` is expected to be `None` after optimization — an
    /// operation region with a null body must be one of these, or the
    /// optimizer has left dead code behind (SPEC_FULL invariant 1).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationKind::VectorAppend
                | OperationKind::VectorClear
                | OperationKind::VectorUnique
                | OperationKind::VectorSwap
                | OperationKind::Publish
                | OperationKind::Return
                | OperationKind::StateChange
                | OperationKind::RecordChange
                | OperationKind::InitGuardSet
        )
    }

    /// Kinds that carry two alternative bodies rather than one `body` plus
    /// an optional one (SPEC_FULL §3, "up to three optional child
    /// regions... for conditional kinds one of `false_body`/`empty_body`/
    /// `absent_body`/`unknown_body`").
    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            OperationKind::StateCheck
                | OperationKind::RecordCheck
                | OperationKind::ExistenceCheck
                | OperationKind::TupleCompare
                | OperationKind::CheckerCall
                | OperationKind::Generator
                | OperationKind::InitGuardCheck
                | OperationKind::ModeSwitch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_is_terminal() {
        assert!(OperationKind::VectorAppend.is_terminal());
    }

    #[test]
    fn table_join_is_not_terminal() {
        assert!(!OperationKind::TableJoin.is_terminal());
    }

    #[test]
    fn state_check_is_conditional() {
        assert!(OperationKind::StateCheck.is_conditional());
    }
}
