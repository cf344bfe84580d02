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
use polars::prelude::*;

use super::{CATEGORY, USER_ID, item_columns, require};
use crate::error::PipelineError;

const STAGE: &str = "long format";

/// The type `category` takes for items of `item_dtype`: numeric items keep their type,
/// anything else stays text.
fn category_dtype(item_dtype: &DataType) -> DataType {
    if item_dtype.is_integer() || item_dtype.is_float() {
        item_dtype.clone()
    } else {
        DataType::String
    }
}

/// Melts a wide frame into `(user_id, category, <value_name>)` rows.
///
/// Every item column contributes one row per input row, zeros and `false` included.
/// Rows are emitted item by item, and within an item in input row order, so two wide
/// frames with the same users and item columns melt into row-aligned long frames.
/// `order_number`, when present, is a key column and is not melted.
///
/// Item columns are named by the items' text form; `category` converts the names back
/// to `item_dtype` (the type of the original `cart` column) when the items are numeric.
pub fn to_long(
    wide: &DataFrame,
    value_name: &str,
    item_dtype: &DataType,
) -> Result<DataFrame, PipelineError> {
    require(wide, STAGE, &[USER_ID])?;

    let items = item_columns(wide);
    let category = category_dtype(item_dtype);
    let long = if items.is_empty() {
        DataFrame::new(vec![
            Column::new_empty(USER_ID.into(), wide.column(USER_ID)?.dtype()),
            Column::new_empty(CATEGORY.into(), &category),
            Column::new_empty(value_name.into(), &DataType::Int64),
        ])?
    } else {
        wide.unpivot(items.clone(), [USER_ID])?
            .lazy()
            .select([
                col(USER_ID),
                col("variable").strict_cast(category).alias(CATEGORY),
                col("value").alias(value_name),
            ])
            .collect()?
    };

    debug!(
        "{}: {} users x {} items -> {} '{}' rows",
        STAGE,
        wide.height(),
        items.len(),
        long.height(),
        value_name
    );
    Ok(long)
}
