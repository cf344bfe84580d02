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

use std::path::Path;

use polars::prelude::DataFrame;

use crate::data;
use crate::error::ProcessorError;
use crate::pipeline::{self, PipelineConfig};

/// Loads raw data and turns it into a model-ready table.
///
/// Implementors pair a loader with a processing pipeline, so experiments can swap
/// the whole data preparation step by swapping the processor.
pub trait DataProcessor {
    /// Loads the file at `path` into a table.
    fn load_data<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame, ProcessorError>;

    /// Transforms loaded `data` into training rows restricted to the `id` column of
    /// `allowlist`.
    fn process_data(&self, data: &DataFrame, allowlist: &DataFrame) -> Result<DataFrame, ProcessorError>;
}

/// Builds re-order training sets from `user_id` / `order_completed_at` / `cart` event
/// logs, with candidates taken from a submission file's `id` column.
///
/// # Example
/// ```no_run
/// use reorderml::processor::{DataProcessor, ReorderProcessor};
///
/// let processor = ReorderProcessor::default();
/// let events = processor.load_data("train.csv")?;
/// let submission = processor.load_data("sample_submission.csv")?;
/// let training = processor.process_data(&events, &submission)?;
/// println!("{} training rows", training.height());
/// # Ok::<(), reorderml::error::ProcessorError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReorderProcessor {
    config: PipelineConfig,
}

impl ReorderProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        ReorderProcessor { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl DataProcessor for ReorderProcessor {
    fn load_data<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame, ProcessorError> {
        Ok(data::load_data(path)?)
    }

    fn process_data(&self, data: &DataFrame, allowlist: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Ok(pipeline::process_data(data, allowlist, &self.config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DataError, PipelineError};
    use crate::pipeline::HistoryPolicy;
    use crate::pipeline::test_support::{ints, strs};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn create_temp_file(content: &str, suffix: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_load_and_process_from_files() {
        let events = create_temp_file(
            "user_id,order_completed_at,cart\n\
             1,2020-01-01,A\n\
             1,2020-02-01,A\n\
             1,2020-02-01,B\n\
             2,2020-01-15,A\n",
            ".csv",
        );
        let submission = create_temp_file(r#"[{"id": "1;A"}, {"id": "1;B"}, {"id": "2;A"}]"#, ".json");
        let processor = ReorderProcessor::default();

        let events = processor.load_data(events.path()).expect("Failed to load events");
        let submission = processor.load_data(submission.path()).expect("Failed to load submission");
        let training = processor.process_data(&events, &submission).expect("Processing failed");

        assert_eq!(strs(&training, "id"), vec!["1;A", "1;B"]);
        assert_eq!(ints(&training, "target"), vec![1, 1]);
    }

    #[test]
    fn test_zero_fill_processor_keeps_single_order_user() {
        let events = create_temp_file(
            "user_id,order_completed_at,cart\n1,1,A\n1,2,A\n2,1,A\n",
            ".csv",
        );
        let submission = create_temp_file("id\n2;A\n", ".csv");
        let processor =
            ReorderProcessor::new(PipelineConfig::new().with_history_policy(HistoryPolicy::ZeroFill));

        let events = processor.load_data(events.path()).expect("Failed to load events");
        let submission = processor.load_data(submission.path()).expect("Failed to load submission");
        let training = processor.process_data(&events, &submission).expect("Processing failed");

        assert_eq!(training.height(), 1);
        assert_eq!(ints(&training, "orders_total"), vec![0]);
    }

    #[test]
    fn test_load_data_rejects_xlsx() {
        let result = ReorderProcessor::default().load_data("orders.xlsx");
        assert!(matches!(
            result,
            Err(ProcessorError::Data(DataError::UnsupportedFormat { extension })) if extension == "xlsx"
        ));
    }

    #[test]
    fn test_process_data_surfaces_pipeline_errors() {
        let frame = DataFrame::empty();
        let result = ReorderProcessor::default().process_data(&frame, &frame);
        assert!(matches!(
            result,
            Err(ProcessorError::Pipeline(PipelineError::MissingColumns { .. }))
        ));
    }
}
