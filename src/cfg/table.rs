//! Tables, indices, and the data-model disjoint-set (SPEC_FULL §3, invariant 4-5).

use crate::cfg::ids::{IndexId, TableId};
use datalog_ir::{ColumnType, ViewId};
use std::collections::BTreeMap;

/// One relation's backing storage: an ordered list of typed columns plus the
/// indices built over it.
#[derive(Debug, Clone)]
pub struct Table {
    id: TableId,
    columns: Vec<ColumnType>,
    indices: Vec<IndexId>,
}

impl Table {
    pub fn new(id: TableId, columns: Vec<ColumnType>) -> Self {
        Table { id, columns, indices: Vec::new() }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    pub fn indices(&self) -> &[IndexId] {
        &self.indices
    }

    fn add_index(&mut self, index: IndexId) {
        self.indices.push(index);
    }
}

/// An index over a subset of a table's columns.
#[derive(Debug, Clone)]
pub struct Index {
    id: IndexId,
    table: TableId,
    key_columns: Vec<usize>,
    mapped_columns: Vec<usize>,
}

impl Index {
    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn key_columns(&self) -> &[usize] {
        &self.key_columns
    }

    pub fn mapped_columns(&self) -> &[usize] {
        &self.mapped_columns
    }

    /// The column-spec string used for index deduplication (SPEC_FULL §3,
    /// invariant 5): sorted key-column indices joined by commas.
    pub fn column_spec(&self) -> String {
        column_spec(&self.key_columns)
    }
}

/// Derive the column-spec string from a set of key-column indices. Exposed
/// standalone so `GetOrCreateIndex` can check for an existing index before
/// allocating an `Index` value.
pub fn column_spec(key_columns: &[usize]) -> String {
    let mut sorted = key_columns.to_vec();
    sorted.sort_unstable();
    sorted.iter().map(usize::to_string).collect::<Vec<_>>().join(",")
}

/// The disjoint-set class naming which views share one backing table
/// (SPEC_FULL §3, "A data model is a disjoint-set class").
#[derive(Debug, Default)]
pub struct DataModel {
    parent: BTreeMap<ViewId, ViewId>,
    table_of_root: BTreeMap<ViewId, TableId>,
}

impl DataModel {
    pub fn new() -> Self {
        DataModel::default()
    }

    fn find(&mut self, view: ViewId) -> ViewId {
        let parent = *self.parent.entry(view).or_insert(view);
        if parent == view {
            view
        } else {
            let root = self.find(parent);
            self.parent.insert(view, root);
            root
        }
    }

    /// Union the storage classes of two views (SPEC_FULL §4.1,
    /// `GetOrCreateTable` "unions the view's model with its predecessors'
    /// models"). Per invariant 4, the caller must not union a view with a
    /// non-empty positive/negative-conditions set, a map, or a compare
    /// against its predecessor; this type does not itself enforce that —
    /// the CFG builder checks it before calling `union`.
    pub fn union(&mut self, a: ViewId, b: ViewId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }

    pub fn root(&mut self, view: ViewId) -> ViewId {
        self.find(view)
    }

    /// Record that `view`'s model (after resolving to its root) maps to
    /// `table`. Subsequent `table_for` calls on any view unioned into the
    /// same class return this table.
    pub fn bind_table(&mut self, view: ViewId, table: TableId) {
        let root = self.find(view);
        self.table_of_root.insert(root, table);
    }

    pub fn table_for(&mut self, view: ViewId) -> Option<TableId> {
        let root = self.find(view);
        self.table_of_root.get(&root).copied()
    }
}

/// Mutating helper used by the node pool when materializing an index: binds
/// the index into its owning table's index list.
pub(crate) fn attach_index(table: &mut Table, index: &Index) {
    table.add_index(index.id);
}

impl Index {
    pub(crate) fn new(id: IndexId, table: TableId, key_columns: Vec<usize>, mapped_columns: Vec<usize>) -> Self {
        Index { id, table, key_columns, mapped_columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_spec_is_sorted_and_joined() {
        assert_eq!(column_spec(&[2, 0, 1]), "0,1,2");
    }

    #[test]
    fn data_model_union_merges_roots() {
        let mut dm = DataModel::new();
        dm.union(1, 2);
        dm.bind_table(1, TableId(5));
        assert_eq!(dm.table_for(2), Some(TableId(5)));
    }

    #[test]
    fn unrelated_views_do_not_share_a_table() {
        let mut dm = DataModel::new();
        dm.bind_table(1, TableId(5));
        assert_eq!(dm.table_for(2), None);
    }
}
