//! Persistence of classifiers
//!
//! Only the learner hyperparameters and the raw feature table are written. Feature extractors are
//! supplied again when loading, the example table and the fitted model are rebuilt from the
//! stored rows.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::FeatureTable;

#[derive(Serialize)]
struct StateRef<'a, L> {
    learner: &'a L,
    table: &'a FeatureTable,
}

/// Serializable part of a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierState<L> {
    pub learner: L,
    pub table: FeatureTable,
}

impl<L: Serialize> ClassifierState<L> {
    /// Write learner and table as JSON without copying them
    pub(crate) fn write<P: AsRef<Path>>(path: P, learner: &L, table: &FeatureTable) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &StateRef { learner, table })?;
        writer.flush()?;

        Ok(())
    }
}

impl<L: for<'de> Deserialize<'de>> ClassifierState<L> {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);

        Ok(serde_json::from_reader(reader)?)
    }
}
