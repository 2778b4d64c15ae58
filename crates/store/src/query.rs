//! Query descriptions backing live result sets.
//!
//! A query is a table name, a conjunction of predicates and an optional sort.
//! Evaluating it against the table yields the `(RowId, version)` snapshot a
//! result set indexes into and diffs against on commit.

use crate::table::RowStore;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use notekeep_core::schema::Table;
use notekeep_core::{Error, Result, Row, RowId, Value};

/// Sort order on a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortDescriptor {
    column: String,
    ascending: bool,
}

impl SortDescriptor {
    /// Sorts by `column`, smallest first.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    /// Sorts by `column`, largest first.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    /// Returns the column name.
    #[inline]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns true for ascending order.
    #[inline]
    pub fn is_ascending(&self) -> bool {
        self.ascending
    }
}

/// Row filter accepted by `Results::filtered`.
#[derive(Clone)]
pub enum Predicate {
    /// The named column equals the value.
    Eq(String, Value),
    /// The named column differs from the value.
    Ne(String, Value),
    /// Arbitrary row test.
    Func(Rc<dyn Fn(&Row) -> bool>),
}

impl Predicate {
    /// Matches rows whose `column` equals `value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq(column.into(), value.into())
    }

    /// Matches rows whose `column` differs from `value`.
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Ne(column.into(), value.into())
    }

    /// Matches rows for which `f` returns true.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Row) -> bool + 'static,
    {
        Predicate::Func(Rc::new(f))
    }

    fn resolve(self, schema: &Table) -> Result<Filter> {
        match self {
            Predicate::Eq(column, value) => {
                Ok(Filter::Eq(column_index(schema, &column)?, value))
            }
            Predicate::Ne(column, value) => {
                Ok(Filter::Ne(column_index(schema, &column)?, value))
            }
            Predicate::Func(f) => Ok(Filter::Func(f)),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(column, value) => write!(f, "{} == {:?}", column, value),
            Predicate::Ne(column, value) => write!(f, "{} != {:?}", column, value),
            Predicate::Func(_) => f.write_str("<fn>"),
        }
    }
}

fn column_index(schema: &Table, column: &str) -> Result<usize> {
    schema
        .column_index(column)
        .ok_or_else(|| Error::column_not_found(schema.name(), column))
}

/// A predicate with its column resolved against the schema.
#[derive(Clone)]
enum Filter {
    Eq(usize, Value),
    Ne(usize, Value),
    Func(Rc<dyn Fn(&Row) -> bool>),
}

impl Filter {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq(index, value) => row.get(*index) == Some(value),
            Filter::Ne(index, value) => row.get(*index) != Some(value),
            Filter::Func(f) => f(row),
        }
    }
}

/// Resolved query over one table.
#[derive(Clone)]
pub struct Query {
    table: String,
    filters: Vec<Filter>,
    /// Column index and direction
    sort: Option<(usize, bool)>,
}

impl Query {
    /// Returns the query for every row of `table`, in id order.
    pub fn all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            sort: None,
        }
    }

    /// Returns the table this query reads.
    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns a copy of this query ordered by `sort` instead.
    pub fn with_sort(&self, schema: &Table, sort: &SortDescriptor) -> Result<Self> {
        let index = column_index(schema, sort.column())?;
        let mut query = self.clone();
        query.sort = Some((index, sort.is_ascending()));
        Ok(query)
    }

    /// Returns a copy of this query further restricted by `predicate`.
    pub fn with_filter(&self, schema: &Table, predicate: Predicate) -> Result<Self> {
        let filter = predicate.resolve(schema)?;
        let mut query = self.clone();
        query.filters.push(filter);
        Ok(query)
    }

    /// Evaluates the query into a `(RowId, version)` snapshot.
    pub fn evaluate(&self, store: &RowStore) -> Vec<(RowId, u64)> {
        let mut rows: Vec<&Row> = store
            .scan()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some((index, ascending)) = self.sort {
            // stable sort keeps id order among equal keys
            rows.sort_by(|a, b| {
                let ordering = compare_column(a, b, index);
                if ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        rows.into_iter().map(|r| (r.id(), r.version())).collect()
    }
}

fn compare_column(a: &Row, b: &Row, index: usize) -> Ordering {
    match (a.get(index), b.get(index)) {
        (Some(x), Some(y)) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("filters", &self.filters.len())
            .field("sort", &self.sort)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use notekeep_core::schema::TableBuilder;
    use notekeep_core::DataType;

    fn store() -> RowStore {
        let schema = TableBuilder::new("notes")
            .unwrap()
            .add_column("title", DataType::String)
            .unwrap()
            .add_column("priority", DataType::Int64)
            .unwrap()
            .build()
            .unwrap();
        let mut store = RowStore::new(schema);
        for (id, title, priority) in [(1, "milk", 2), (2, "eggs", 1), (3, "bread", 2)] {
            store
                .insert(Row::new(id, vec![Value::from(title), Value::Int64(priority)]))
                .unwrap();
        }
        store
    }

    fn ids(snapshot: &[(RowId, u64)]) -> Vec<RowId> {
        snapshot.iter().map(|(id, _)| *id).collect()
    }

    #[test]
    fn test_all_in_id_order() {
        let store = store();
        let snapshot = Query::all("notes").evaluate(&store);
        assert_eq!(snapshot, vec![(1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_sort_asc_desc() {
        let store = store();
        let query = Query::all("notes");

        let asc = query.with_sort(store.schema(), &SortDescriptor::asc("title")).unwrap();
        assert_eq!(ids(&asc.evaluate(&store)), vec![3, 2, 1]);

        let desc = query.with_sort(store.schema(), &SortDescriptor::desc("title")).unwrap();
        assert_eq!(ids(&desc.evaluate(&store)), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_is_stable() {
        let store = store();
        let query = Query::all("notes")
            .with_sort(store.schema(), &SortDescriptor::asc("priority"))
            .unwrap();
        assert_eq!(ids(&query.evaluate(&store)), vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_unknown_column() {
        let store = store();
        let result = Query::all("notes").with_sort(store.schema(), &SortDescriptor::asc("body"));
        assert!(matches!(result, Err(Error::ColumnNotFound { .. })));
    }

    #[test]
    fn test_filters_conjoin() {
        let store = store();
        let query = Query::all("notes")
            .with_filter(store.schema(), Predicate::eq("priority", 2i64))
            .unwrap()
            .with_filter(store.schema(), Predicate::ne("title", "milk"))
            .unwrap();
        assert_eq!(ids(&query.evaluate(&store)), vec![3]);
    }

    #[test]
    fn test_func_predicate() {
        let store = store();
        let query = Query::all("notes")
            .with_filter(
                store.schema(),
                Predicate::func(|row| row.get(0).and_then(Value::as_str).map_or(false, |t| t.len() == 4)),
            )
            .unwrap();
        assert_eq!(ids(&query.evaluate(&store)), vec![1, 2]);
    }

    #[test]
    fn test_predicate_debug() {
        assert_eq!(
            alloc::format!("{:?}", Predicate::eq("title", "milk")),
            "title == String(\"milk\")"
        );
    }
}
