// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use log::debug;
use ndarray::{Array1, Array2};
use polars::prelude::{DataFrame, DataType, Float64Type, IndexOrder};

use crate::error::PipelineError;
use crate::pipeline::{ID, ORDERED, ORDERS_TOTAL, RATING, TARGET, TOTAL_ORDERED, require};

/// Feature columns handed to a model, in matrix column order.
pub const FEATURE_COLUMNS: [&str; 4] = [ORDERED, ORDERS_TOTAL, RATING, TOTAL_ORDERED];

/// A training frame converted to the `(features, targets)` arrays models consume.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    /// Composite `user;category` id of each row.
    pub ids: Vec<String>,
    /// Shape `(n_rows, FEATURE_COLUMNS.len())`.
    pub features: Array2<f64>,
    /// 0.0 or 1.0 per row.
    pub targets: Array1<f64>,
}

fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float() || dtype == &DataType::Boolean
}

impl TrainingSet {
    /// Extracts [`FEATURE_COLUMNS`], `target` and `id` from a processed frame.
    ///
    /// NaN ratings are passed through unchanged; null cells become NaN.
    pub fn from_table(frame: &DataFrame) -> Result<Self, PipelineError> {
        let mut required = FEATURE_COLUMNS.to_vec();
        required.extend([TARGET, ID]);
        require(frame, "training set", &required)?;

        for name in FEATURE_COLUMNS.iter().chain([&TARGET]) {
            if !is_numeric(frame.column(name)?.dtype()) {
                return Err(PipelineError::InvalidColumnType {
                    column: name.to_string(),
                    expected: "numeric",
                });
            }
        }

        let features = frame.select(FEATURE_COLUMNS)?.to_ndarray::<Float64Type>(IndexOrder::C)?;
        let targets: Array1<f64> = frame
            .column(TARGET)?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|t| t.unwrap_or(f64::NAN))
            .collect();
        let ids = frame
            .column(ID)?
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|id| id.unwrap_or_default().to_string())
            .collect();

        debug!("Training set: {} rows x {} features", frame.height(), FEATURE_COLUMNS.len());
        Ok(TrainingSet { ids, features, targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use polars::df;

    fn training_frame() -> DataFrame {
        df!(
            "user_id" => [1i64, 1],
            "category" => ["A", "B"],
            "ordered" => [2i64, 0],
            "orders_total" => [4i64, 4],
            "rating" => [0.5, 0.0],
            "id" => ["1;A", "1;B"],
            "target" => [1i64, 0],
            "total_ordered" => [7i64, 3]
        )
        .expect("Failed to build frame")
    }

    #[test]
    fn test_from_table() {
        let set = TrainingSet::from_table(&training_frame()).expect("Conversion failed");

        assert_eq!(set.features, array![[2.0, 4.0, 0.5, 7.0], [0.0, 4.0, 0.0, 3.0]]);
        assert_eq!(set.targets, array![1.0, 0.0]);
        assert_eq!(set.ids, vec!["1;A".to_string(), "1;B".to_string()]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_from_table_missing_target() {
        let frame = training_frame().drop(TARGET).expect("Failed to drop target");

        let result = TrainingSet::from_table(&frame);
        assert!(matches!(
            result,
            Err(PipelineError::MissingColumns { columns, .. }) if columns == vec![TARGET.to_string()]
        ));
    }

    #[test]
    fn test_from_table_rejects_text_features() {
        let mut frame = training_frame();
        frame
            .with_column(polars::prelude::Column::new(ORDERED.into(), ["x", "y"]))
            .expect("Failed to replace column");

        let result = TrainingSet::from_table(&frame);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidColumnType { column, .. }) if column == ORDERED
        ));
    }
}
