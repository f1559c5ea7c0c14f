//! Row batches produced by scan engines.

use std::sync::Arc;

use crate::error::{Result, TabularError};
use crate::row::GenericRow;
use crate::types::StructType;

/// An ordered batch of rows sharing one schema.
#[derive(Debug, Clone)]
pub struct RowBatch {
    /// Schema for every row in the batch.
    pub schema: Arc<StructType>,
    rows: Vec<GenericRow>,
}

impl RowBatch {
    /// Create a batch, verifying every row carries the batch schema.
    pub fn new(schema: Arc<StructType>, rows: Vec<GenericRow>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.schema_ref().as_ref() != schema.as_ref() {
                return Err(TabularError::schema(format!(
                    "Row {} does not match the batch schema",
                    i
                )));
            }
        }
        Ok(Self { schema, rows })
    }

    /// Create an empty batch with the given schema.
    pub fn empty(schema: Arc<StructType>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow the rows.
    pub fn rows(&self) -> &[GenericRow] {
        &self.rows
    }

    /// Consume the batch, yielding its rows in order.
    pub fn into_rows(self) -> std::vec::IntoIter<GenericRow> {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, StructField};
    use crate::value::Value;

    fn schema() -> Arc<StructType> {
        Arc::new(StructType::new(vec![StructField::nullable(
            "id",
            DataType::LONG,
        )]))
    }

    #[test]
    fn test_batch_rows_in_order() {
        let rows = (0..3)
            .map(|i| GenericRow::try_new(schema(), vec![Value::Long(i)]).unwrap())
            .collect();
        let batch = RowBatch::new(schema(), rows).unwrap();
        assert_eq!(batch.num_rows(), 3);

        let ids: Vec<Value> = batch
            .into_rows()
            .map(|r| r.values()[0].clone())
            .collect();
        assert_eq!(ids, vec![Value::Long(0), Value::Long(1), Value::Long(2)]);
    }

    #[test]
    fn test_batch_rejects_foreign_rows() {
        let other = Arc::new(StructType::new(vec![StructField::nullable(
            "name",
            DataType::STRING,
        )]));
        let row = GenericRow::try_new(other, vec!["x".into()]).unwrap();
        assert!(RowBatch::new(schema(), vec![row]).is_err());
        assert!(RowBatch::empty(schema()).is_empty());
    }
}
