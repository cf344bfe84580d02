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

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use log::debug;
use polars::prelude::{Column, DataFrame, DataType, JsonFormat, JsonReader, SerReader};
use serde_json::{Map, Value};

use crate::data::DataLoader;
use crate::error::JsonError;

/// Loads a JSON file into a `DataFrame`.
///
/// Two layouts are understood:
/// - an array of records, `[{"user_id": 1, "cart": "A"}, ...]`; keys missing from a
///   record load as nulls and columns appear in first-seen order;
/// - an object of columns, either `{"cart": {"0": "A", "1": "B"}}` (index-keyed, as
///   written by dataframe libraries by default) or `{"cart": ["A", "B"]}`.
///
/// Index-keyed columns are placed by their row key, not by key order in the file.
pub struct JsonLoader;

/// Rows in a uniform shape, plus the column order to restore after parsing.
struct Records {
    names: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

fn check_scalar(column: &str, value: &Value) -> Result<(), JsonError> {
    match value {
        Value::Array(_) | Value::Object(_) => {
            Err(JsonError::NestedValue { column: column.to_string() })
        }
        _ => Ok(()),
    }
}

fn from_records(records: Vec<Value>) -> Result<Records, JsonError> {
    let mut names: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let Value::Object(object) = record else {
            return Err(JsonError::UnsupportedLayout);
        };
        for (key, value) in &object {
            check_scalar(key, value)?;
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
        rows.push(object);
    }
    Ok(Records { names, rows })
}

// Row keys must be exactly 0..n, in any order.
fn indexed_values(column: &str, indexed: Map<String, Value>) -> Result<Vec<Value>, JsonError> {
    let mut slots: Vec<(usize, Value)> = Vec::with_capacity(indexed.len());
    for (position, (key, value)) in indexed.into_iter().enumerate() {
        let index = key.parse::<usize>().map_err(|_| JsonError::RowKey {
            column: column.to_string(),
            key: key.clone(),
            expected: position,
        })?;
        slots.push((index, value));
    }
    slots.sort_by_key(|(index, _)| *index);

    for (expected, (index, _)) in slots.iter().enumerate() {
        if *index != expected {
            return Err(JsonError::RowKey {
                column: column.to_string(),
                key: index.to_string(),
                expected,
            });
        }
    }
    Ok(slots.into_iter().map(|(_, value)| value).collect())
}

fn from_columns(columns: Map<String, Value>) -> Result<Records, JsonError> {
    let mut names: Vec<String> = Vec::with_capacity(columns.len());
    let mut rows: Vec<Map<String, Value>> = Vec::new();
    for (name, column) in columns {
        let values = match column {
            Value::Array(items) => items,
            Value::Object(indexed) => indexed_values(&name, indexed)?,
            _ => return Err(JsonError::UnsupportedLayout),
        };
        if names.is_empty() {
            rows = vec![Map::new(); values.len()];
        } else if values.len() != rows.len() {
            return Err(JsonError::RaggedColumns {
                column: name,
                actual: values.len(),
                expected: rows.len(),
            });
        }
        for (row, value) in rows.iter_mut().zip(values) {
            check_scalar(&name, &value)?;
            row.insert(name.clone(), value);
        }
        names.push(name);
    }
    Ok(Records { names, rows })
}

fn to_frame(records: Records) -> Result<DataFrame, JsonError> {
    if records.names.is_empty() {
        return Ok(DataFrame::empty());
    }
    if records.rows.is_empty() {
        let columns = records
            .names
            .iter()
            .map(|name| Column::new_empty(name.as_str().into(), &DataType::String))
            .collect();
        return Ok(DataFrame::new(columns)?);
    }

    let rows: Vec<Value> = records.rows.into_iter().map(Value::Object).collect();
    let bytes = serde_json::to_vec(&rows)?;
    let frame = JsonReader::new(Cursor::new(bytes))
        .with_json_format(JsonFormat::Json)
        .infer_schema_len(None)
        .finish()?;
    Ok(frame.select(records.names)?)
}

fn load_json_common<P: AsRef<Path>>(path: P) -> Result<DataFrame, JsonError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let json: Value = serde_json::from_reader(BufReader::new(file))?;

    let records = match json {
        Value::Array(records) => from_records(records)?,
        Value::Object(columns) => from_columns(columns)?,
        _ => return Err(JsonError::UnsupportedLayout),
    };
    let frame = to_frame(records)?;
    debug!("Loaded {} rows x {} columns from {:?}", frame.height(), frame.width(), path);

    Ok(frame)
}

impl DataLoader for JsonLoader {
    type Error = JsonError;

    fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame, Self::Error> {
        load_json_common(path)
    }
}
