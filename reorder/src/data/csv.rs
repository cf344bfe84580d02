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

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use log::debug;
use polars::prelude::{Column, CsvReadOptions, CsvWriter, DataFrame, DataType, SerReader, SerWriter};

use crate::data::DataLoader;
use crate::error::CsvError;

/// Loads a headed CSV file into a `DataFrame`, inferring one type per column from all rows.
///
/// Columns holding only integers load as `Int64`, numbers as `Float64`, `true`/`false`
/// as `Boolean`, anything else as `String`. Empty fields load as nulls. A file with a
/// header but no rows loads as empty `String` columns.
pub struct CsvLoader;

struct Layout {
    headers: Vec<String>,
    rows: usize,
}

// Header and row-length checks, done with the csv reader before polars parses types.
fn check_layout(path: &Path) -> Result<Layout, CsvError> {
    let file = File::open(path)?;
    let mut rdr = ::csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
    if headers.is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(CsvError::DuplicateHeader(duplicate.clone()));
    }

    let mut rows = 0;
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() != headers.len() {
            return Err(CsvError::InconsistentColumns {
                row: i + 1,
                actual: record.len(),
                expected: headers.len(),
            });
        }
        rows += 1;
    }

    Ok(Layout { headers, rows })
}

fn load_csv_common<P: AsRef<Path>>(path: P) -> Result<DataFrame, CsvError> {
    let path = path.as_ref();
    let layout = check_layout(path)?;

    let frame = if layout.rows == 0 {
        let columns = layout
            .headers
            .iter()
            .map(|name| Column::new_empty(name.as_str().into(), &DataType::String))
            .collect();
        DataFrame::new(columns)?
    } else {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?
    };
    debug!("Loaded {} rows x {} columns from {:?}", frame.height(), frame.width(), path);

    Ok(frame)
}

impl DataLoader for CsvLoader {
    type Error = CsvError;

    fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame, Self::Error> {
        load_csv_common(path)
    }
}

/// Writes `frame` as a headed CSV file, one line per row. Nulls are written as empty
/// fields.
pub fn write_csv<P: AsRef<Path>>(frame: &DataFrame, path: P) -> Result<(), CsvError> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut frame.clone())?;
    debug!("Wrote {} rows x {} columns to {:?}", frame.height(), frame.width(), path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load_with;
    use polars::df;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn assert_round_trip(frame: &DataFrame) {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");

        write_csv(frame, temp_file.path()).expect("Failed to write CSV");
        let loaded = load_with::<CsvLoader, _>(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(loaded.get_column_names(), frame.get_column_names());
        assert_eq!(loaded.dtypes(), frame.dtypes());
        assert!(loaded.equals_missing(frame), "{:?} != {:?}", loaded, frame);
    }

    #[test]
    fn test_load_text_columns() {
        let temp_file = create_temp_csv("col1,col2\nvalue1,value2\nvalue3,value4\n");

        let frame = load_with::<CsvLoader, _>(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(frame.height(), 2);
        let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["col1", "col2"]);
        let col1 = frame.column("col1").and_then(|c| c.str()).expect("Missing col1");
        assert_eq!(col1.get(0), Some("value1"));
    }

    #[test]
    fn test_load_infers_column_types() {
        let temp_file =
            create_temp_csv("user_id,price,flag,cart\n1,2.5,true,milk\n2,3,false,bread\n");

        let frame = load_with::<CsvLoader, _>(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(
            frame.dtypes(),
            vec![DataType::Int64, DataType::Float64, DataType::Boolean, DataType::String]
        );
        let price = frame.column("price").and_then(|c| c.f64()).expect("Missing price");
        assert_eq!(price.into_no_null_iter().collect::<Vec<_>>(), vec![2.5, 3.0]);
    }

    #[test]
    fn test_load_empty_field_is_null() {
        let temp_file = create_temp_csv("a,b\n1,x\n,y\n");

        let frame = load_with::<CsvLoader, _>(temp_file.path()).expect("Failed to load CSV");

        let a = frame.column("a").expect("Missing a");
        assert_eq!(a.dtype(), &DataType::Int64);
        assert_eq!(a.null_count(), 1);
    }

    #[test]
    fn test_load_header_only() {
        let temp_file = create_temp_csv("user_id,cart\n");

        let frame = load_with::<CsvLoader, _>(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.dtypes(), vec![DataType::String, DataType::String]);
    }

    #[test]
    fn test_load_empty_file() {
        let temp_file = create_temp_csv("");

        let result = load_with::<CsvLoader, _>(temp_file.path());
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_load_duplicate_header() {
        let temp_file = create_temp_csv("a,b,a\n1,2,3\n");

        let result = load_with::<CsvLoader, _>(temp_file.path());
        assert!(matches!(result, Err(CsvError::DuplicateHeader(name)) if name == "a"));
    }

    #[test]
    fn test_load_inconsistent_columns() {
        let temp_file = create_temp_csv("a,b\n1,2\n3,4,5\n");

        let result = load_with::<CsvLoader, _>(temp_file.path());
        assert!(
            matches!(result, Err(CsvError::InconsistentColumns { row, actual, expected }) if row == 2 && actual == 3 && expected == 2)
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_with::<CsvLoader, _>("nonexistent.csv");
        assert!(matches!(result, Err(CsvError::FileOpen(_))));
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let frame = df!(
            "user_id" => [1i64, 1, 2],
            "cart" => ["A", "B", "A"],
            "rating" => [0.5, 1.0, 0.25],
            "present" => [true, false, true]
        )
        .expect("Failed to build frame");

        assert_round_trip(&frame);
    }

    #[test]
    fn test_round_trip_without_rows() {
        let frame = DataFrame::new(vec![
            Column::new_empty("id".into(), &DataType::String),
            Column::new_empty("category".into(), &DataType::String),
        ])
        .expect("Failed to build frame");

        assert_round_trip(&frame);
    }
}
