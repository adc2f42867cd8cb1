//! Filtered selects and updates

use super::table::Table;
use crate::filter::{Filter, FilterFragment, UpdateAssignment};
use crate::record::{normalize, Record};
use crate::types::{FieldDescriptor, Value};
use crate::{MapperError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Columns returned by an `UPDATE ... RETURNING`, keyed by storage key
pub type ReturnedValues = HashMap<String, Value>;

impl<R: Record> Table<R> {
    /// Rows matching `filter`, with its ordering and paging applied
    ///
    /// # Example
    /// ```ignore
    /// let filter = Filter::new()
    ///     .key_cmp(docs.field("title")?, SqlOperator::Like, "%even%")?
    ///     .order_by(docs.field("id")?, true)?;
    /// let even = docs.select_all_with_filter(&filter)?;
    /// ```
    pub fn select_all_with_filter(&self, filter: &Filter) -> Result<Vec<R>> {
        let fragment = filter.build()?;
        let statements = self.meta.statements();
        let sql = if fragment.is_empty() {
            statements.select_all.clone()
        } else {
            format!("{} {};", statements.select_all_prefix(), fragment.sql)
        };

        let rows = self
            .store
            .lock()
            .query(&sql, &fragment.args)
            .map_err(|e| MapperError::store(self.name(), "select with filter", e))?;

        rows.into_iter().map(|row| self.record_from_row(row)).collect()
    }

    /// Apply `assignments` to every row matching `filter` (all rows when
    /// `None`), returning the number of rows changed
    ///
    /// # Example
    /// ```ignore
    /// let money = accounts.field("money")?;
    /// let rich = Filter::new().key_cmp(money, SqlOperator::GreaterThanOrEqual, 50)?;
    /// accounts.update_with_filter(Some(&rich), &[UpdateAssignment::sub(money, 25)])?;
    /// ```
    pub fn update_with_filter(&self, filter: Option<&Filter>, assignments: &[UpdateAssignment]) -> Result<u64> {
        let (sql, args) = self.filtered_update_sql(filter, assignments, &[])?;
        let result = self
            .store
            .lock()
            .execute(&sql, &args)
            .map_err(|e| MapperError::store(self.name(), "update with filter", e))?;
        debug!(table = self.name(), rows = result.rows_affected, "filtered update");
        Ok(result.rows_affected)
    }

    /// Like [`update_with_filter`](Self::update_with_filter), returning the
    /// post-update values of `returning` for each changed row
    pub fn update_with_filter_returning(
        &self,
        filter: Option<&Filter>,
        returning: &[&FieldDescriptor],
        assignments: &[UpdateAssignment],
    ) -> Result<Vec<ReturnedValues>> {
        if returning.is_empty() {
            return Err(MapperError::InvalidArgument(format!(
                "update of {} requests no returned columns",
                self.name()
            )));
        }
        let columns = returning
            .iter()
            .map(|f| self.field(&f.storage_key))
            .collect::<Result<Vec<_>>>()?;

        let (sql, args) = self.filtered_update_sql(filter, assignments, &columns)?;
        let rows = self
            .store
            .lock()
            .query(&sql, &args)
            .map_err(|e| MapperError::store(self.name(), "update with filter returning", e))?;

        rows.into_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(field, value)| Ok((field.storage_key.clone(), normalize(field, value)?)))
                    .collect::<Result<ReturnedValues>>()
            })
            .collect()
    }

    /// `UPDATE T SET <assignments> <fragment>[ RETURNING ...];` with the
    /// assignment arguments ahead of the filter arguments
    fn filtered_update_sql(
        &self,
        filter: Option<&Filter>,
        assignments: &[UpdateAssignment],
        returning: &[&FieldDescriptor],
    ) -> Result<(String, Vec<Value>)> {
        if assignments.is_empty() {
            return Err(MapperError::InvalidArgument(format!(
                "update of {} has no assignments",
                self.name()
            )));
        }
        for assignment in assignments {
            self.field(assignment.column())?;
        }

        let fragment = match filter {
            Some(filter) => filter.build()?,
            None => FilterFragment::default(),
        };

        let set = assignments
            .iter()
            .map(UpdateAssignment::to_sql)
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {} SET {}", self.name(), set);
        if !fragment.is_empty() {
            sql.push(' ');
            sql.push_str(&fragment.sql);
        }
        if !returning.is_empty() {
            let keys: Vec<&str> = returning.iter().map(|f| f.storage_key.as_str()).collect();
            sql.push_str(" RETURNING ");
            sql.push_str(&keys.join(", "));
        }
        sql.push(';');

        let mut args: Vec<Value> = assignments.iter().flat_map(|a| a.args().iter().cloned()).collect();
        args.extend(fragment.args);
        Ok((sql, args))
    }
}

#[cfg(test)]
mod tests {
    use crate::database::Database;
    use crate::filter::{Filter, SqlOperator, UpdateAssignment};
    use crate::testing::{Account, Document};
    use crate::types::Value;
    use crate::MapperError;

    fn seeded_documents(db: &Database) -> crate::Table<Document> {
        let documents = db.register::<Document>().unwrap();
        for i in 1..=6 {
            let title = if i % 2 == 0 { format!("even {}", i) } else { format!("odd {}", i) };
            let mut doc = Document::titled(&title);
            documents.insert(&mut doc).unwrap();
        }
        documents
    }

    #[test]
    fn test_select_with_filter() {
        let db = Database::open_in_memory().unwrap();
        let documents = seeded_documents(&db);
        let title = documents.field("title").unwrap();
        let id = documents.field("id").unwrap();

        let filter = Filter::new()
            .key_cmp(title, SqlOperator::Like, "%even%").unwrap()
            .order_by(id, false).unwrap();
        let ids: Vec<i64> = documents
            .select_all_with_filter(&filter)
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![6, 4, 2]);
    }

    #[test]
    fn test_grouped_filter_with_paging() {
        let db = Database::open_in_memory().unwrap();
        let documents = seeded_documents(&db);
        let title = documents.field("title").unwrap();
        let id = documents.field("id").unwrap();

        let filter = Filter::new()
            .open_group().unwrap()
            .key_cmp(title, SqlOperator::Equal, "odd 1").unwrap()
            .or().unwrap()
            .key_cmp(title, SqlOperator::Like, "even%").unwrap()
            .close_group().unwrap()
            .and().unwrap()
            .key_in(id, SqlOperator::NotIn, [4]).unwrap()
            .order_by(id, true).unwrap()
            .limit(2).unwrap()
            .offset(1).unwrap();
        let ids: Vec<i64> = documents
            .select_all_with_filter(&filter)
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![2, 6]);
    }

    #[test]
    fn test_empty_filter_selects_everything() {
        let db = Database::open_in_memory().unwrap();
        let documents = seeded_documents(&db);
        assert_eq!(documents.select_all_with_filter(&Filter::new()).unwrap().len(), 6);
    }

    #[test]
    fn test_update_with_filter_returning() {
        let db = Database::open_in_memory().unwrap();
        let accounts = db.register::<Account>().unwrap();
        for (name, money) in [("rich", 80), ("edge", 50), ("poor", 10)] {
            accounts.insert(&mut Account::new(name, money)).unwrap();
        }

        let money = accounts.field("money").unwrap();
        let username = accounts.field("username").unwrap();
        let filter = Filter::new()
            .key_cmp(money, SqlOperator::GreaterThanOrEqual, 50)
            .unwrap();

        let mut returned = accounts
            .update_with_filter_returning(Some(&filter), &[username, money], &[UpdateAssignment::sub(money, 25)])
            .unwrap();
        returned.sort_by(|a, b| a["username"].as_str().cmp(&b["username"].as_str()));

        assert_eq!(returned.len(), 2);
        assert_eq!(returned[0]["username"], Value::from("edge"));
        assert_eq!(returned[0]["money"], Value::Integer(25));
        assert_eq!(returned[1]["username"], Value::from("rich"));
        assert_eq!(returned[1]["money"], Value::Integer(55));

        assert_eq!(accounts.select("poor").unwrap().unwrap().money, 10);
    }

    #[test]
    fn test_update_with_filter_counts_rows() {
        let db = Database::open_in_memory().unwrap();
        let accounts = db.register::<Account>().unwrap();
        for (name, money) in [("a", 1), ("b", 2), ("c", 3)] {
            accounts.insert(&mut Account::new(name, money)).unwrap();
        }
        let money = accounts.field("money").unwrap();

        let changed = accounts
            .update_with_filter(None, &[UpdateAssignment::mul(money, 10)])
            .unwrap();
        assert_eq!(changed, 3);

        let filter = Filter::new().key_cmp(money, SqlOperator::LessThan, 25).unwrap();
        let changed = accounts
            .update_with_filter(Some(&filter), &[UpdateAssignment::set(money, 0)])
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(accounts.select("c").unwrap().unwrap().money, 30);
    }

    #[test]
    fn test_update_argument_validation() {
        let db = Database::open_in_memory().unwrap();
        let accounts = db.register::<Account>().unwrap();
        let money = accounts.field("money").unwrap();

        assert!(matches!(
            accounts.update_with_filter(None, &[]),
            Err(MapperError::InvalidArgument(_))
        ));
        assert!(matches!(
            accounts.update_with_filter_returning(None, &[], &[UpdateAssignment::set(money, 1)]),
            Err(MapperError::InvalidArgument(_))
        ));

        let foreign = crate::types::FieldDescriptor::new("balance", crate::types::FieldKind::Int);
        assert!(matches!(
            accounts.update_with_filter(None, &[UpdateAssignment::set(&foreign, 1)]),
            Err(MapperError::UnknownField(_))
        ));

        let dangling = Filter::new().key_cmp(money, SqlOperator::Equal, 1).unwrap().and().unwrap();
        assert!(matches!(
            accounts.update_with_filter(Some(&dangling), &[UpdateAssignment::set(money, 1)]),
            Err(MapperError::Grammar(_))
        ));
    }
}
