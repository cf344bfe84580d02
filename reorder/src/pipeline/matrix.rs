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

use super::{CART, ORDER_COMPLETED_AT, USER_ID, require};
use crate::error::PipelineError;

const STAGE: &str = "presence matrix";

/// Distinct non-null `cart` values in sort order, as the text used for column names.
fn item_names(events: &DataFrame) -> Result<Vec<String>, PipelineError> {
    let items = events
        .clone()
        .lazy()
        .select([col(CART).drop_nulls().unique().sort(SortOptions::default()).cast(DataType::String)])
        .collect()?;
    let names = items.column(CART)?.str()?.into_iter().flatten().map(str::to_string).collect();
    Ok(names)
}

/// One-hot encodes `cart` and collapses the event log to one row per
/// `(user_id, order_completed_at)`.
///
/// Each distinct non-null `cart` value becomes a boolean column named after the value's
/// text form; a cell is `true` when the item appears in any event of that user's order.
/// Rows come out sorted by `(user_id, order_completed_at)` and item columns by value, so
/// every user's orders are adjacent and in chronological order.
///
/// Events with a null `user_id` or `order_completed_at` belong to no order and are
/// skipped. Events with a null `cart` still create their order row.
///
/// # Errors
/// [`PipelineError::MissingColumns`] when `user_id`, `order_completed_at` or `cart` is
/// absent, and [`PipelineError::Polars`] when an item name collides with a key column.
pub fn build_presence_matrix(events: &DataFrame) -> Result<DataFrame, PipelineError> {
    require(events, STAGE, &[USER_ID, ORDER_COMPLETED_AT, CART])?;

    let items = item_names(events)?;
    let presence: Vec<Expr> = items
        .iter()
        .map(|item| {
            col(CART).cast(DataType::String).eq(lit(item.as_str())).any(true).alias(item.as_str())
        })
        .collect();

    let matrix = events
        .clone()
        .lazy()
        .filter(col(USER_ID).is_not_null().and(col(ORDER_COMPLETED_AT).is_not_null()))
        .group_by([col(USER_ID), col(ORDER_COMPLETED_AT)])
        .agg(presence)
        .sort([USER_ID, ORDER_COMPLETED_AT], SortMultipleOptions::default())
        .collect()?;

    debug!("{}: {} events -> {} orders x {} items", STAGE, events.height(), matrix.height(), items.len());
    Ok(matrix)
}
