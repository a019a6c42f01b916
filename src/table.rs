//! Feature tables
//!
//! A [`FeatureTable`] keeps the raw rows collected from labeled images together with the column
//! schema. The example table handed to the learners is derived from it on demand with
//! [`FeatureTable::to_dataset`], so only the raw rows have to be persisted.
use std::collections::HashMap;
use std::path::Path;

use csv::WriterBuilder;
use linfa::{Dataset, DatasetBase};
use ndarray::{Array1, Array2, ArrayView1, Ix1};
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Name of the class column in exported tables
pub const CLASS_COLUMN: &str = "type";

/// Feature values of a single image followed by its class label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub values: Vec<f64>,
    pub class: String,
}

impl FeatureRow {
    pub fn new<S: Into<String>>(values: Vec<f64>, class: S) -> Self {
        FeatureRow {
            values,
            class: class.into(),
        }
    }
}

/// Ordered collection of feature rows sharing one schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureTable {
    field_names: Vec<String>,
    class_names: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(field_names: Vec<String>, class_names: Vec<String>) -> Self {
        FeatureTable {
            field_names,
            class_names,
            rows: Vec::new(),
        }
    }

    /// Append a row, its width has to match the number of fields and all values must be finite
    pub fn push(&mut self, row: FeatureRow) -> Result<()> {
        if row.values.len() != self.field_names.len() {
            return Err(ClassifierError::FieldCount {
                expected: self.field_names.len(),
                found: row.values.len(),
            });
        }
        if let Some((field, value)) = self
            .field_names
            .iter()
            .zip(&row.values)
            .find(|(_, v)| !v.is_finite())
        {
            return Err(ClassifierError::NonFinite {
                field: field.clone(),
                value: *value,
            });
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Position of a class in the class list
    pub fn class_index(&self, class: &str) -> Result<usize> {
        self.class_names
            .iter()
            .position(|c| c == class)
            .ok_or_else(|| ClassifierError::UnknownClass(class.to_string()))
    }

    /// Number of rows for each class
    pub fn class_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for row in &self.rows {
            *counts.entry(row.class.as_str()).or_insert(0) += 1;
        }

        counts
    }

    /// Feature values as a `(n_rows, n_fields)` matrix
    pub fn records(&self) -> Array2<f64> {
        let mut records = Array2::zeros((self.rows.len(), self.field_names.len()));
        for (mut dst, row) in records.rows_mut().into_iter().zip(&self.rows) {
            dst.assign(&ArrayView1::from(&row.values[..]));
        }

        records
    }

    /// Build the example table
    ///
    /// Targets are indices into the class list of this table.
    pub fn to_dataset(&self) -> Result<Dataset<f64, usize, Ix1>> {
        let targets = self
            .rows
            .iter()
            .map(|row| self.class_index(&row.class))
            .collect::<Result<Array1<usize>>>()?;

        Ok(DatasetBase::new(self.records(), targets).with_feature_names(self.field_names.clone()))
    }

    /// Export the table as tab-delimited text
    ///
    /// Three header lines are written: the column names, the column types and the column
    /// flags. The class column is called `type` and lists its possible values separated by
    /// spaces, so class names containing whitespace cannot be exported.
    pub fn write_tab<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(class) = self
            .class_names
            .iter()
            .find(|c| c.is_empty() || c.chars().any(char::is_whitespace))
        {
            return Err(ClassifierError::Parameters(format!(
                "class name {:?} cannot be exported, it is empty or contains whitespace",
                class
            )));
        }

        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)?;

        let mut names = self.field_names.clone();
        names.push(CLASS_COLUMN.to_string());
        writer.write_record(&names)?;

        let mut types = vec!["continuous".to_string(); self.field_names.len()];
        types.push(self.class_names.join(" "));
        writer.write_record(&types)?;

        let mut flags = vec![String::new(); self.field_names.len()];
        flags.push("class".to_string());
        writer.write_record(&flags)?;

        for row in &self.rows {
            let mut record = row.values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
            record.push(row.class.clone());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
