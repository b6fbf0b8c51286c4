//! Arrow handoff for presentation tables.

use crate::compose::PresentationTable;
use crate::error::PipelineResult;
use arrow::array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

impl PresentationTable {
    /// Convert to an Arrow batch: key columns as `Utf8`, value columns as `Float64`.
    pub fn to_record_batch(&self) -> PipelineResult<RecordBatch> {
        let mut fields: Vec<Field> = self
            .key_names
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, false))
            .collect();
        fields.extend(
            self.columns
                .iter()
                .map(|col| Field::new(&col.name, DataType::Float64, false)),
        );
        let schema = Arc::new(Schema::new(fields));

        let mut arrays: Vec<ArrayRef> = (0..self.key_names.len())
            .map(|k| {
                let keys: Vec<&str> = self
                    .rows
                    .iter()
                    .map(|row| row.keys.get(k).map_or("", String::as_str))
                    .collect();
                Arc::new(StringArray::from(keys)) as ArrayRef
            })
            .collect();
        arrays.extend((0..self.columns.len()).map(|c| {
            let values: Vec<f64> = self
                .rows
                .iter()
                .map(|row| row.values.get(c).copied().unwrap_or(0.0))
                .collect();
            Arc::new(Float64Array::from(values)) as ArrayRef
        }));

        Ok(RecordBatch::try_new(schema, arrays)?)
    }
}
