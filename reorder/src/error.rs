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

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("File with the extension '{extension}' is not supported.")]
    UnsupportedFormat { extension: String },

    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("JSON error: {0}")]
    Json(#[from] JsonError),
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),

    #[error("CSV file is empty")]
    EmptyFile,

    #[error("Duplicate column '{0}' in CSV header")]
    DuplicateHeader(String),

    #[error("Inconsistent column count: row {row} has {actual} columns, expected {expected}")]
    InconsistentColumns { row: usize, actual: usize, expected: usize },

    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("JSON must be an array of records or an object of columns")]
    UnsupportedLayout,

    #[error("Column '{column}' holds a nested value")]
    NestedValue { column: String },

    #[error("Column '{column}' has {actual} values, expected {expected}")]
    RaggedColumns { column: String, actual: usize, expected: usize },

    #[error("Column '{column}' has row key '{key}', expected '{expected}'")]
    RowKey { column: String, key: String, expected: usize },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage}: missing required columns: {}", .columns.join(", "))]
    MissingColumns { stage: &'static str, columns: Vec<String> },

    #[error("Column '{column}' must hold {expected} values")]
    InvalidColumnType { column: String, expected: &'static str },

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}
