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

pub mod csv;
pub mod json;

pub use self::csv::{CsvLoader, write_csv};
pub use self::json::JsonLoader;

use std::path::Path;

use log::info;
use polars::prelude::DataFrame;

use crate::error::DataError;

/// A trait for loading a file into a `DataFrame`.
///
/// This trait defines the interface every input format implements. Implementors read
/// the file at a given path and return its contents as named, typed columns, leaving
/// type inference to the `polars` readers. The trait is generic over an associated
/// error type so that callers who know the format can match on format-specific
/// failures.
///
/// # Associated Types
/// - `Error`: The error type returned by the `load` method, which must implement
///   `std::error::Error` and have a `'static` lifetime.
///
/// # Methods
/// - `load`: Loads the file at the specified path into a `DataFrame`.
///
/// # Notes
/// - Column order follows the file: header order for CSV, first-seen key order for
///   JSON records.
/// - Implementors validate the file layout before handing it to `polars`, so layout
///   problems surface as typed errors instead of generic parse failures.
pub trait DataLoader {
    /// Loads a file into a `DataFrame`.
    ///
    /// # Parameters
    /// - `path`: The path to the data file, accepting any type that implements `AsRef<Path>`.
    ///
    /// # Returns
    /// A `Result` containing:
    /// - On success: A `DataFrame` with one column per field of the file.
    /// - On error: An error of type `Self::Error` specific to the implementation.
    fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame, Self::Error>;

    /// The error type returned by the `load` method.
    type Error: std::error::Error + 'static;
}

/// Loads a file with an explicitly chosen `DataLoader` implementation.
///
/// Unlike [`load_data`], this skips extension dispatch, which is useful when a file
/// carries a non-standard extension but a known format.
///
/// # Type Parameters
/// - `T`: The type implementing `DataLoader`, determining the reader and error type.
/// - `P`: The path type, constrained to implement `AsRef<Path>`.
///
/// # Parameters
/// - `path`: The path to the data file.
///
/// # Returns
/// A `Result` containing:
/// - On success: The loaded `DataFrame`.
/// - On error: An error of type `T::Error`, specific to the `DataLoader` implementation.
pub fn load_with<T: DataLoader, P: AsRef<Path>>(path: P) -> Result<DataFrame, T::Error> {
    T::load(path)
}

/// Returns the text after the last `.` of `path`, or the whole path when it has none.
pub fn file_extension<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref().to_string_lossy();
    path.rsplit('.').next().unwrap_or_default().to_string()
}

/// Loads a `csv` or `json` file, choosing the reader from the file extension.
///
/// # Parameters
/// - `path`: The path to the data file.
///
/// # Returns
/// A `Result` containing:
/// - On success: The loaded `DataFrame`.
/// - On error: [`DataError::UnsupportedFormat`] for any extension other than `csv` or
///   `json`, or the wrapped [`CsvError`](crate::error::CsvError) /
///   [`JsonError`](crate::error::JsonError) of the chosen reader.
///
/// # Notes
/// - The extension match is case-sensitive: `data.CSV`, `data.xlsx`, `data.parquet` and
///   paths without an extension are all rejected.
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<DataFrame, DataError> {
    let path = path.as_ref();
    let extension = file_extension(path);
    let frame = match extension.as_str() {
        "csv" => CsvLoader::load(path)?,
        "json" => JsonLoader::load(path)?,
        _ => return Err(DataError::UnsupportedFormat { extension }),
    };
    info!("Loaded {:?}: {} rows, {} columns", path, frame.height(), frame.width());
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn create_temp_file(content: &str, suffix: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("orders.csv"), "csv");
        assert_eq!(file_extension("archive.tar.json"), "json");
        assert_eq!(file_extension("orders"), "orders");
    }

    #[test]
    fn test_load_data_dispatches_csv() {
        let temp_file = create_temp_file("col1,col2\nvalue1,value2\nvalue3,value4\n", ".csv");

        let frame = load_data(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(frame.height(), 2);
        let col2 = frame.column("col2").and_then(|c| c.str()).expect("Missing col2");
        assert_eq!(col2.get(1), Some("value4"));
    }

    #[test]
    fn test_load_data_dispatches_json() {
        let temp_file = create_temp_file(r#"[{"id": "1;A"}, {"id": "2;A"}]"#, ".json");

        let frame = load_data(temp_file.path()).expect("Failed to load JSON");

        let ids = frame.column("id").expect("Missing id");
        assert_eq!(ids.dtype(), &DataType::String);
        assert_eq!(ids.str().expect("Not a string column").get(1), Some("2;A"));
    }

    #[test]
    fn test_load_data_rejects_unknown_extensions() {
        for suffix in [".xlsx", ".parquet", ".CSV"] {
            let temp_file = create_temp_file("col1\n1\n", suffix);
            let result = load_data(temp_file.path());
            assert!(
                matches!(&result, Err(DataError::UnsupportedFormat { extension }) if suffix.ends_with(extension.as_str())),
                "Unexpected result for {}: {:?}",
                suffix,
                result
            );
        }
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = load_data("data.xlsx").unwrap_err();
        assert_eq!(err.to_string(), "File with the extension 'xlsx' is not supported.");
    }
}
