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

use super::{
    CATEGORY, ID, ORDER_NUMBER, ORDERED, ORDERS_TOTAL, RATING, ROW_INDEX, USER_ID, first_text,
    require, require_counts,
};
use crate::error::PipelineError;

const STAGE: &str = "feature calculation";

/// Adds `orders_total`, `rating` and `id` to the long history frame.
///
/// `orders_total` is the user's holdout `order_number`, which equals the number of
/// orders before the holdout. `rating` is `ordered / orders_total` and is NaN for a
/// user with no earlier orders. `id` joins `user_id` and `category` with `separator`.
///
/// # Errors
/// [`PipelineError::DataIntegrity`] when a history user has no holdout row.
pub fn compute_features(
    history_long: &DataFrame,
    holdout: &DataFrame,
    separator: &str,
) -> Result<DataFrame, PipelineError> {
    require(history_long, STAGE, &[USER_ID, CATEGORY, ORDERED])?;
    require(holdout, STAGE, &[USER_ID, ORDER_NUMBER])?;
    require_counts(history_long, &[ORDERED])?;
    require_counts(holdout, &[ORDER_NUMBER])?;

    let totals = holdout
        .clone()
        .lazy()
        .group_by([col(USER_ID)])
        .agg([col(ORDER_NUMBER).max().cast(DataType::Int64).alias(ORDERS_TOTAL)]);
    let joined = history_long
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .join(totals, [col(USER_ID)], [col(USER_ID)], JoinArgs::new(JoinType::Left))
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    if joined.column(ORDERS_TOTAL)?.null_count() > 0 {
        let orphans = joined.clone().lazy().filter(col(ORDERS_TOTAL).is_null()).collect()?;
        return Err(PipelineError::DataIntegrity(format!(
            "user '{}' has history but no holdout order",
            first_text(&orphans, USER_ID)?
        )));
    }

    let features = joined
        .lazy()
        .with_columns([
            (col(ORDERED).cast(DataType::Float64) / col(ORDERS_TOTAL).cast(DataType::Float64))
                .alias(RATING),
            concat_str(
                [col(USER_ID).cast(DataType::String), col(CATEGORY).cast(DataType::String)],
                separator,
                false,
            )
            .alias(ID),
        ])
        .collect()?;
    debug!("{}: {} feature rows", STAGE, features.height());
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{floats, ints, names, strs};
    use polars::df;

    fn holdout() -> DataFrame {
        df!("user_id" => [7i64, 9], "A" => [true, false], "order_number" => [4i64, 0])
            .expect("Failed to build holdout")
    }

    #[test]
    fn test_rating_is_share_of_history_orders() {
        let history_long =
            df!("user_id" => [7i64, 7], "category" => ["X", "Y"], "ordered" => [2i64, 4])
                .expect("Failed to build history");

        let features = compute_features(&history_long, &holdout(), ";").expect("Features failed");

        assert_eq!(
            names(&features),
            vec!["user_id", "category", "ordered", "orders_total", "rating", "id"]
        );
        assert_eq!(ints(&features, ORDERS_TOTAL), vec![4, 4]);
        assert_eq!(floats(&features, RATING), vec![0.5, 1.0]);
        assert_eq!(strs(&features, ID), vec!["7;X", "7;Y"]);
    }

    #[test]
    fn test_zero_history_orders_rate_as_nan() {
        let history_long = df!("user_id" => [9i64], "category" => ["A"], "ordered" => [0i64])
            .expect("Failed to build history");

        let features = compute_features(&history_long, &holdout(), ";").expect("Features failed");

        assert_eq!(ints(&features, ORDERS_TOTAL), vec![0]);
        let rating = floats(&features, RATING)[0];
        assert!(rating.is_nan(), "Expected NaN rating, got {}", rating);
    }

    #[test]
    fn test_unknown_user_is_integrity_error() {
        let history_long = df!("user_id" => [8i64], "category" => ["A"], "ordered" => [1i64])
            .expect("Failed to build history");

        let result = compute_features(&history_long, &holdout(), ";");
        assert!(matches!(result, Err(PipelineError::DataIntegrity(msg)) if msg.contains("'8'")));
    }

    #[test]
    fn test_text_user_ids_in_composite_key() {
        let holdout = df!("user_id" => ["alice"], "order_number" => [2i64])
            .expect("Failed to build holdout");
        let history_long = df!("user_id" => ["alice"], "category" => ["tea"], "ordered" => [1i64])
            .expect("Failed to build history");

        let features = compute_features(&history_long, &holdout, "::").expect("Features failed");

        assert_eq!(strs(&features, ID), vec!["alice::tea"]);
        assert_eq!(floats(&features, RATING), vec![0.5]);
    }
}
