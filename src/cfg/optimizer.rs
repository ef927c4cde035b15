//! The CFG optimizer (SPEC_FULL §4.5): a fixed-point pass over the region
//! tree that runs after the builder, the induction engine, and the top-down
//! checker builder have all finished.
//!
//! Four passes run each iteration — operation-level folding, parallel-region
//! simplification, series-region simplification, procedure-level dedup —
//! followed by `NodePool::remove_unused`. The loop repeats until a pass
//! reports no change and no region was collected, since collapsing one
//! region can expose another (an emptied `Parallel` makes its enclosing
//! `Series` a singleton, which elevates and may itself end with a `Return`
//! that truncates a further sibling, and so on).
//!
//! Two simplifications relative to a literal reading of the region algebra:
//! parallel-region dedup only merges *exact* duplicates (identical variable
//! ids, not merely renamed-equivalent ones) — merging renamed duplicates
//! would require rewriting every later use of the dropped copy's variables,
//! which the tree-scoped binding model here doesn't make cheap to do
//! safely. Procedure-level dedup does support renaming (via
//! [`EquivalenceSet`]), since a procedure's parameters are already the only
//! seam through which callers observe it.

use crate::cfg::ids::{RegionId, VariableId};
use crate::cfg::node_pool::NodePool;
use crate::cfg::operation::OperationKind;
use crate::cfg::region::{ProcedureKind, RegionData};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Runs every optimizer pass to a fixed point and returns the total number
/// of regions reclaimed.
pub fn optimize(pool: &mut NodePool) -> usize {
    let mut total_removed = 0;
    let mut iterations = 0;
    loop {
        iterations += 1;
        let mut changed = false;
        changed |= optimize_operations(pool);
        changed |= optimize_parallel_regions(pool);
        changed |= optimize_series_regions(pool);
        changed |= deduplicate_procedures(pool);
        let removed = pool.remove_unused();
        total_removed += removed;
        tracing::debug!(iterations, removed, changed, "optimizer pass");
        if !changed && removed == 0 {
            break;
        }
    }
    tracing::info!(iterations, regions_removed = total_removed, "cfg optimizer finished");
    total_removed
}

/// Re-parents `new` where `old` used to sit (SPEC_FULL §4.1's
/// `ReplaceAllUsesWith`, plus the parent/depth fixup `CfgBuilder::splice`
/// already performs by hand at its own call sites).
fn elevate(pool: &mut NodePool, old: RegionId, new: RegionId) {
    let parent = pool.region(old).parent();
    let depth = pool.region(old).depth();
    pool.replace_all_uses_with(old, new);
    pool.region_mut(new).set_parent(parent);
    pool.region_mut(new).set_depth(depth);
}

// ----------------------------------------------------------------------
// Operation-level pass: Let-elimination and TupleCompare folding
// ----------------------------------------------------------------------

/// Let-propagation substitutes a `Let`'s definition for its source
/// everywhere in its body and elevates the body in its place; TupleCompare
/// folding drops comparisons the builder's own constant-folding can already
/// decide (two occurrences of the same variable, or two distinct constants)
/// without waiting for a generated checker to evaluate them at runtime.
fn optimize_operations(pool: &mut NodePool) -> bool {
    let mut changed = false;
    let mut ids = pool.region_ids();
    ids.sort_by_key(|&id| std::cmp::Reverse(pool.region(id).depth()));

    for id in ids {
        if !pool.is_live(id) {
            continue;
        }
        let (kind, variables, body, alt_body) = match pool.region(id).data() {
            RegionData::Operation(o) => {
                (o.kind, o.data.variables.clone(), o.data.body, o.data.alt_body)
            }
            _ => continue,
        };

        match kind {
            OperationKind::Let => {
                if let (Some(body), [defined, source]) = (body, variables.as_slice()) {
                    rewrite_variable(pool, body, *defined, *source);
                    elevate(pool, id, body);
                    changed = true;
                }
            }
            OperationKind::TupleCompare if variables.len() == 2 => {
                let (a, b) = (variables[0], variables[1]);
                if a == b {
                    if let Some(body) = body {
                        elevate(pool, id, body);
                        changed = true;
                    }
                } else if pool.variable(a).is_constant() && pool.variable(b).is_constant() {
                    if let Some((_, alt_region)) = alt_body {
                        elevate(pool, id, alt_region);
                        changed = true;
                    }
                }
            }
            _ => {}
        }
    }
    changed
}

/// Replaces every occurrence of `from` with `to` in the variable lists of
/// `id`'s subtree, following `children()` regardless of region kind.
fn rewrite_variable(pool: &mut NodePool, id: RegionId, from: VariableId, to: VariableId) {
    if let RegionData::Operation(o) = pool.region_mut(id).data_mut() {
        for v in o.data.variables.iter_mut() {
            if *v == from {
                *v = to;
            }
        }
    }
    for child in pool.region(id).children() {
        rewrite_variable(pool, child, from, to);
    }
}

// ----------------------------------------------------------------------
// Parallel-region pass: flatten, exact-dedup, singleton-elevate
// ----------------------------------------------------------------------

fn optimize_parallel_regions(pool: &mut NodePool) -> bool {
    let mut changed = false;
    let mut ids = pool.region_ids();
    ids.sort_by_key(|&id| std::cmp::Reverse(pool.region(id).depth()));

    for id in ids {
        if !pool.is_live(id) {
            continue;
        }
        let original: Vec<RegionId> = match pool.region(id).data() {
            RegionData::Parallel(p) => p.children.clone(),
            _ => continue,
        };

        let mut flattened = Vec::new();
        for &c in &original {
            if !pool.is_live(c) {
                changed = true;
                continue;
            }
            if let RegionData::Parallel(inner) = pool.region(c).data() {
                flattened.extend(inner.children.iter().copied().filter(|&g| pool.is_live(g)));
                changed = true;
            } else {
                flattened.push(c);
            }
        }

        let mut deduped: Vec<RegionId> = Vec::new();
        for &c in &flattened {
            let is_dup = deduped.iter().any(|&k| structurally_equal_exact(pool, c, k));
            if is_dup {
                changed = true;
            } else {
                deduped.push(c);
            }
        }

        if deduped != original {
            pool.set_children(id, deduped.clone());
        }
        if deduped.len() == 1 {
            elevate(pool, id, deduped[0]);
            changed = true;
        }
    }
    changed
}

// ----------------------------------------------------------------------
// Series-region pass: flatten, drop no-ops, truncate after Return, elevate
// ----------------------------------------------------------------------

fn optimize_series_regions(pool: &mut NodePool) -> bool {
    let mut changed = false;
    let mut ids = pool.region_ids();
    ids.sort_by_key(|&id| std::cmp::Reverse(pool.region(id).depth()));

    for id in ids {
        if !pool.is_live(id) {
            continue;
        }
        let original: Vec<RegionId> = match pool.region(id).data() {
            RegionData::Series(s) => s.children.clone(),
            _ => continue,
        };

        let mut flattened = Vec::new();
        for &c in &original {
            if !pool.is_live(c) {
                changed = true;
                continue;
            }
            if is_noop_region(pool, c) {
                changed = true;
                continue;
            }
            if let RegionData::Series(inner) = pool.region(c).data() {
                flattened.extend(inner.children.iter().copied().filter(|&g| pool.is_live(g)));
                changed = true;
            } else {
                flattened.push(c);
            }
        }

        // Invariant 2: EndsWithReturn is transitive, so nothing lexically
        // after a region that already ends with Return is reachable.
        let mut truncated = Vec::new();
        for &c in &flattened {
            truncated.push(c);
            if pool.region(c).ends_with_return(pool) {
                break;
            }
        }
        if truncated.len() != flattened.len() {
            changed = true;
        }

        if truncated != original {
            pool.set_children(id, truncated.clone());
        }
        if truncated.len() == 1 {
            elevate(pool, id, truncated[0]);
            changed = true;
        }
    }
    changed
}

fn is_noop_region(pool: &NodePool, id: RegionId) -> bool {
    match pool.region(id).data() {
        RegionData::Series(s) => s.children.is_empty(),
        RegionData::Parallel(p) => p.children.is_empty(),
        _ => false,
    }
}

// ----------------------------------------------------------------------
// Structural equality, with or without variable renaming
// ----------------------------------------------------------------------

/// A flat, order-independent bijection between the left and right
/// subtree's variables, built incrementally while walking both trees in
/// lockstep. Unlike the builder's lexically scoped bindings, this is not a
/// stack of scopes: the optimizer only ever compares two whole subtrees at
/// once, never nested rename contexts, so one bijection for the entire
/// comparison suffices.
#[derive(Default)]
struct EquivalenceSet {
    forward: BTreeMap<VariableId, VariableId>,
    backward: BTreeMap<VariableId, VariableId>,
}

impl EquivalenceSet {
    fn new() -> Self {
        Self::default()
    }

    /// Asserts `a` (left) corresponds to `b` (right); fails if either side
    /// was already bound to something else.
    fn unify(&mut self, a: VariableId, b: VariableId) -> bool {
        if a == b {
            return true;
        }
        match (self.forward.get(&a).copied(), self.backward.get(&b).copied()) {
            (Some(existing), _) => existing == b,
            (_, Some(existing)) => existing == a,
            (None, None) => {
                self.forward.insert(a, b);
                self.backward.insert(b, a);
                true
            }
        }
    }
}

struct CompareCtx<'a> {
    eq: Option<&'a mut EquivalenceSet>,
    /// The two procedure roots under comparison, so a `CheckerCall` back
    /// into the procedure currently being compared (direct recursion) can
    /// be recognized as equivalent without first proving the two root
    /// procedures equal (which is exactly what this comparison is for).
    roots: Option<(RegionId, RegionId)>,
}

fn structurally_equal_exact(pool: &NodePool, a: RegionId, b: RegionId) -> bool {
    let mut ctx = CompareCtx { eq: None, roots: None };
    structurally_equal(pool, a, b, &mut ctx)
}

fn variables_match(ctx: &mut CompareCtx, a: VariableId, b: VariableId) -> bool {
    match ctx.eq.as_mut() {
        Some(set) => set.unify(a, b),
        None => a == b,
    }
}

fn procedures_match(ctx: &CompareCtx, a: Option<RegionId>, b: Option<RegionId>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(pa), Some(pb)) => pa == pb || ctx.roots == Some((pa, pb)),
        _ => false,
    }
}

fn structurally_equal(pool: &NodePool, a: RegionId, b: RegionId, ctx: &mut CompareCtx) -> bool {
    match (pool.region(a).data(), pool.region(b).data()) {
        (RegionData::Procedure(pa), RegionData::Procedure(pb)) => {
            if pa.kind != pb.kind
                || pa.scalar_params.len() != pb.scalar_params.len()
                || pa.vector_params.len() != pb.vector_params.len()
            {
                return false;
            }
            let params: Vec<(VariableId, VariableId)> =
                pa.scalar_params.iter().copied().zip(pb.scalar_params.iter().copied()).collect();
            for (x, y) in params {
                if !variables_match(ctx, x, y) {
                    return false;
                }
            }
            match (pa.body, pb.body) {
                (Some(ba), Some(bb)) => structurally_equal(pool, ba, bb, ctx),
                (None, None) => true,
                _ => false,
            }
        }
        (RegionData::Series(sa), RegionData::Series(sb)) => {
            sa.children.len() == sb.children.len()
                && sa
                    .children
                    .clone()
                    .iter()
                    .zip(sb.children.clone().iter())
                    .all(|(&x, &y)| structurally_equal(pool, x, y, ctx))
        }
        (RegionData::Parallel(pa), RegionData::Parallel(pb)) => {
            pa.children.len() == pb.children.len()
                && pa
                    .children
                    .clone()
                    .iter()
                    .zip(pb.children.clone().iter())
                    .all(|(&x, &y)| structurally_equal(pool, x, y, ctx))
        }
        // Two induction regions are never considered equal: each owns a
        // distinct set of add/swap/output vectors that the rest of the
        // program addresses by identity, so merging them would alias
        // unrelated accumulators.
        (RegionData::Induction(_), RegionData::Induction(_)) => false,
        (RegionData::Operation(oa), RegionData::Operation(ob)) => {
            if oa.kind != ob.kind
                || oa.data.variables.len() != ob.data.variables.len()
                || oa.data.tables != ob.data.tables
                || oa.data.indices != ob.data.indices
                || oa.data.vectors != ob.data.vectors
                || !procedures_match(ctx, oa.data.procedure, ob.data.procedure)
            {
                return false;
            }
            let vars: Vec<(VariableId, VariableId)> =
                oa.data.variables.iter().copied().zip(ob.data.variables.iter().copied()).collect();
            for (x, y) in vars {
                if !variables_match(ctx, x, y) {
                    return false;
                }
            }
            let body_eq = match (oa.data.body, ob.data.body) {
                (Some(x), Some(y)) => structurally_equal(pool, x, y, ctx),
                (None, None) => true,
                _ => false,
            };
            if !body_eq {
                return false;
            }
            let alt_eq = match (oa.data.alt_body, ob.data.alt_body) {
                (Some((ka, x)), Some((kb, y))) => ka == kb && structurally_equal(pool, x, y, ctx),
                (None, None) => true,
                _ => false,
            };
            if !alt_eq {
                return false;
            }
            match (oa.data.unknown_body, ob.data.unknown_body) {
                (Some(x), Some(y)) => structurally_equal(pool, x, y, ctx),
                (None, None) => true,
                _ => false,
            }
        }
        _ => false,
    }
}

/// A coarse shape fingerprint used to avoid attempting a full renamed
/// comparison between every pair of procedures. Deliberately omits variable
/// identity, since two renamed-equivalent procedures must hash equal
/// despite using different `VariableId`s.
fn shallow_hash(pool: &NodePool, id: RegionId) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_region(pool, id, &mut hasher);
    hasher.finish()
}

fn hash_region(pool: &NodePool, id: RegionId, hasher: &mut DefaultHasher) {
    match pool.region(id).data() {
        RegionData::Procedure(p) => {
            0u8.hash(hasher);
            procedure_kind_tag(p.kind).hash(hasher);
            p.scalar_params.len().hash(hasher);
            p.vector_params.len().hash(hasher);
            if let Some(b) = p.body {
                hash_region(pool, b, hasher);
            }
        }
        RegionData::Series(s) => {
            1u8.hash(hasher);
            s.children.len().hash(hasher);
            for &c in &s.children {
                hash_region(pool, c, hasher);
            }
        }
        RegionData::Parallel(p) => {
            2u8.hash(hasher);
            p.children.len().hash(hasher);
            for &c in &p.children {
                hash_region(pool, c, hasher);
            }
        }
        RegionData::Induction(i) => {
            3u8.hash(hasher);
            let (init, cyclic, output) = (i.init_region, i.cyclic_region, i.output_region);
            hash_region(pool, init, hasher);
            hash_region(pool, cyclic, hasher);
            hash_region(pool, output, hasher);
        }
        RegionData::Operation(o) => {
            4u8.hash(hasher);
            o.kind.hash(hasher);
            o.data.variables.len().hash(hasher);
            o.data.tables.hash(hasher);
            o.data.indices.hash(hasher);
            if let Some(b) = o.data.body {
                hash_region(pool, b, hasher);
            }
            if let Some((k, b)) = o.data.alt_body {
                (k as u8).hash(hasher);
                hash_region(pool, b, hasher);
            }
            if let Some(b) = o.data.unknown_body {
                hash_region(pool, b, hasher);
            }
        }
    }
}

fn procedure_kind_tag(kind: ProcedureKind) -> u8 {
    match kind {
        ProcedureKind::Entry => 0,
        ProcedureKind::Primary => 1,
        ProcedureKind::MessageHandler => 2,
        ProcedureKind::TupleFinder => 3,
        ProcedureKind::TupleChecker => 4,
        ProcedureKind::TupleRemover => 5,
        ProcedureKind::Initializer => 6,
    }
}

// ----------------------------------------------------------------------
// Procedure-level pass: renamed-equivalence dedup
// ----------------------------------------------------------------------

/// Merges procedures that are structurally equal up to a parameter
/// renaming: every `Call`/`CheckerCall` targeting the dropped duplicate is
/// redirected to the survivor, then the duplicate is retired so the next
/// `remove_unused` reclaims its body.
fn deduplicate_procedures(pool: &mut NodePool) -> bool {
    let mut changed = false;
    let roots: Vec<RegionId> = pool.procedure_roots().to_vec();
    let mut survivors: Vec<RegionId> = Vec::new();

    'roots: for root in roots {
        if !pool.is_live(root) {
            continue;
        }
        for &survivor in &survivors {
            let kind_matches = matches!(
                (pool.region(root).data(), pool.region(survivor).data()),
                (RegionData::Procedure(a), RegionData::Procedure(b)) if a.kind == b.kind
            );
            if !kind_matches || shallow_hash(pool, root) != shallow_hash(pool, survivor) {
                continue;
            }

            let mut eq = EquivalenceSet::new();
            let mut ctx = CompareCtx { eq: Some(&mut eq), roots: Some((root, survivor)) };
            if structurally_equal(pool, root, survivor, &mut ctx) {
                redirect_calls(pool, root, survivor);
                pool.retire_procedure(root);
                tracing::debug!(?root, ?survivor, "merged equivalent procedures");
                changed = true;
                continue 'roots;
            }
        }
        survivors.push(root);
    }
    changed
}

fn redirect_calls(pool: &mut NodePool, from: RegionId, to: RegionId) {
    for id in pool.region_ids() {
        if let RegionData::Operation(o) = pool.region_mut(id).data_mut() {
            if o.data.procedure == Some(from) {
                o.data.procedure = Some(to);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::node_pool::{set_operation_alt_body, set_operation_body};
    use crate::cfg::region::AltBodyKind;
    use crate::cfg::variable::VariableRole;
    use datalog_ir::ColumnType;

    fn bool_var(pool: &mut NodePool, role: VariableRole) -> VariableId {
        pool.create_variable(role, Some(ColumnType::Bool), None)
    }

    /// Walks a chain of singleton wrapper regions down to the first
    /// operation. Optimized output collapses eliminated wrappers in place,
    /// so a test built around one specific leaf operation can't assume any
    /// particular wrapper depth survives.
    fn first_operation(pool: &NodePool, mut id: RegionId) -> RegionId {
        loop {
            if matches!(pool.region(id).data(), RegionData::Operation(_)) {
                return id;
            }
            let children = pool.region(id).children();
            assert_eq!(children.len(), 1, "expected a singleton chain down to an operation");
            id = children[0];
        }
    }

    #[test]
    fn let_binding_is_eliminated_and_rewrites_its_uses() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let body = pool.create_series(proc);
        pool.set_procedure_body(proc, body);

        let source = pool.create_variable(VariableRole::Parameter, Some(ColumnType::I64), None);
        let defined = pool.create_variable(VariableRole::LetBinding, Some(ColumnType::I64), None);

        let let_op = pool.create_operation(body, OperationKind::Let);
        pool.append_child(body, let_op);
        let let_body = pool.create_series(let_op);
        set_operation_body(&mut pool, let_op, let_body);
        if let RegionData::Operation(o) = pool.region_mut(let_op).data_mut() {
            o.data.variables = vec![defined, source];
        }

        let ret = pool.create_operation(let_body, OperationKind::Return);
        pool.append_child(let_body, ret);
        if let RegionData::Operation(o) = pool.region_mut(ret).data_mut() {
            o.data.variables = vec![defined];
        }

        optimize(&mut pool);

        let surviving_return = first_operation(&pool, proc);
        if let RegionData::Operation(o) = pool.region(surviving_return).data() {
            assert_eq!(o.kind, OperationKind::Return);
            assert_eq!(o.data.variables, vec![source]);
        } else {
            panic!("expected an operation region");
        }
    }

    #[test]
    fn tuple_compare_of_the_same_variable_folds_to_its_pass_body() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let body = pool.create_series(proc);
        pool.set_procedure_body(proc, body);

        let v = pool.create_variable(VariableRole::Parameter, Some(ColumnType::I64), None);
        let cmp = pool.create_operation(body, OperationKind::TupleCompare);
        pool.append_child(body, cmp);
        if let RegionData::Operation(o) = pool.region_mut(cmp).data_mut() {
            o.data.variables = vec![v, v];
        }
        let pass = pool.create_series(cmp);
        let fail = pool.create_series(cmp);
        set_operation_body(&mut pool, cmp, pass);
        set_operation_alt_body(&mut pool, cmp, AltBodyKind::False, fail);
        let ret = pool.create_operation(pass, OperationKind::Return);
        pool.append_child(pass, ret);

        optimize(&mut pool);

        let surviving = first_operation(&pool, proc);
        assert!(matches!(pool.region(surviving).data(), RegionData::Operation(o) if o.kind == OperationKind::Return));
    }

    #[test]
    fn tuple_compare_of_distinct_constants_folds_to_its_fail_body() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let body = pool.create_series(proc);
        pool.set_procedure_body(proc, body);

        let a = bool_var(&mut pool, VariableRole::ConstantTrue);
        let b = bool_var(&mut pool, VariableRole::ConstantFalse);
        let cmp = pool.create_operation(body, OperationKind::TupleCompare);
        pool.append_child(body, cmp);
        if let RegionData::Operation(o) = pool.region_mut(cmp).data_mut() {
            o.data.variables = vec![a, b];
        }
        let pass = pool.create_series(cmp);
        let fail = pool.create_series(cmp);
        set_operation_body(&mut pool, cmp, pass);
        set_operation_alt_body(&mut pool, cmp, AltBodyKind::False, fail);
        pool.append_child(pass, pool.create_operation(pass, OperationKind::Publish));
        let ret = pool.create_operation(fail, OperationKind::Return);
        pool.append_child(fail, ret);

        optimize(&mut pool);

        let surviving = first_operation(&pool, proc);
        assert!(matches!(pool.region(surviving).data(), RegionData::Operation(o) if o.kind == OperationKind::Return));
    }

    #[test]
    fn duplicate_parallel_children_collapse_to_a_singleton() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let parallel = pool.create_parallel(proc);
        pool.set_procedure_body(proc, parallel);

        let first = pool.create_operation(parallel, OperationKind::VectorUnique);
        let second = pool.create_operation(parallel, OperationKind::VectorUnique);
        pool.append_child(parallel, first);
        pool.append_child(parallel, second);

        optimize(&mut pool);

        let children = pool.region(proc).children();
        assert_eq!(children.len(), 1);
        assert!(matches!(pool.region(children[0]).data(), RegionData::Operation(o) if o.kind == OperationKind::VectorUnique));
    }

    #[test]
    fn series_drops_unreachable_code_after_a_return() {
        let mut pool = NodePool::new();
        let proc = pool.create_procedure(ProcedureKind::Primary);
        let body = pool.create_series(proc);
        pool.set_procedure_body(proc, body);

        let ret = pool.create_operation(body, OperationKind::Return);
        let dead = pool.create_operation(body, OperationKind::Publish);
        pool.append_child(body, ret);
        pool.append_child(body, dead);

        optimize(&mut pool);

        let children = pool.region(proc).children();
        assert_eq!(children.len(), 1);
        assert!(matches!(pool.region(children[0]).data(), RegionData::Operation(o) if o.kind == OperationKind::Return));
    }

    #[test]
    fn renamed_equivalent_procedures_merge_and_redirect_checker_calls() {
        let mut pool = NodePool::new();

        let build_checker = |pool: &mut NodePool| -> RegionId {
            let proc = pool.create_procedure(ProcedureKind::TupleChecker);
            let param = pool.create_variable(VariableRole::Parameter, Some(ColumnType::I64), None);
            if let RegionData::Procedure(p) = pool.region_mut(proc).data_mut() {
                p.scalar_params = vec![param];
            }
            let body = pool.create_series(proc);
            pool.set_procedure_body(proc, body);
            let ret = pool.create_operation(body, OperationKind::Return);
            pool.append_child(body, ret);
            if let RegionData::Operation(o) = pool.region_mut(ret).data_mut() {
                o.data.variables = vec![param];
            }
            proc
        };

        let checker_a = build_checker(&mut pool);
        let checker_b = build_checker(&mut pool);

        let caller = pool.create_procedure(ProcedureKind::Primary);
        let caller_body = pool.create_series(caller);
        pool.set_procedure_body(caller, caller_body);
        let call = pool.create_operation(caller_body, OperationKind::CheckerCall);
        pool.append_child(caller_body, call);
        if let RegionData::Operation(o) = pool.region_mut(call).data_mut() {
            o.data.procedure = Some(checker_b);
        }

        optimize(&mut pool);

        assert!(!pool.procedure_roots().contains(&checker_b));
        assert!(pool.procedure_roots().contains(&checker_a));
        if let RegionData::Operation(o) = pool.region(call).data() {
            assert_eq!(o.data.procedure, Some(checker_a));
        } else {
            panic!("expected the call operation to still exist");
        }
    }
}
