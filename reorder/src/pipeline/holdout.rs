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

use super::{HistoryPolicy, ORDER_NUMBER, ROW_INDEX, USER_ID, item_columns, require, require_counts};
use crate::error::PipelineError;

const STAGE: &str = "holdout split";

/// The two halves of a sequenced order matrix.
#[derive(Debug, Clone)]
pub struct Split {
    /// One row per user: item columns summed over every order except the last.
    pub history: DataFrame,
    /// Each user's last order, unchanged, in the order the rows appeared.
    pub holdout: DataFrame,
}

/// Separates each user's latest order from the earlier ones.
///
/// Rows whose `order_number` equals the user's maximum form the holdout frame. All
/// other rows are summed per user into the history frame; history users are listed in
/// the same order as their holdout rows, so the long forms of both frames line up row
/// for row when every user has a history row.
///
/// Users with a single order have nothing to sum: under [`HistoryPolicy::DropEmpty`]
/// they are left out of the history, under [`HistoryPolicy::ZeroFill`] they get zeros.
pub fn split_holdout(sequenced: &DataFrame, policy: HistoryPolicy) -> Result<Split, PipelineError> {
    require(sequenced, STAGE, &[USER_ID, ORDER_NUMBER])?;
    if !sequenced.column(ORDER_NUMBER)?.dtype().is_integer() {
        return Err(PipelineError::InvalidColumnType {
            column: ORDER_NUMBER.to_string(),
            expected: "integer",
        });
    }
    let items = item_columns(sequenced);
    require_counts(sequenced, &items)?;

    let is_last = col(ORDER_NUMBER).eq(col(ORDER_NUMBER).max().over([col(USER_ID)]));
    let holdout = sequenced.clone().lazy().filter(is_last.clone()).collect()?;

    let sums: Vec<Expr> =
        items.iter().map(|name| col(name.as_str()).cast(DataType::Int64).sum()).collect();
    let summed = sequenced.clone().lazy().filter(is_last.not()).group_by([col(USER_ID)]).agg(sums);

    let how = match policy {
        HistoryPolicy::DropEmpty => JoinType::Inner,
        HistoryPolicy::ZeroFill => JoinType::Left,
    };
    let columns: Vec<Expr> = std::iter::once(col(USER_ID))
        .chain(items.iter().map(|name| col(name.as_str()).fill_null(lit(0i64))))
        .collect();

    // History users follow holdout row order
    let history = holdout
        .clone()
        .lazy()
        .select([col(USER_ID).unique_stable()])
        .with_row_index(ROW_INDEX, None)
        .join(summed, [col(USER_ID)], [col(USER_ID)], JoinArgs::new(how))
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .select(columns)
        .collect()?;

    debug!(
        "{}: {} holdout rows, {} history rows over {} users ({:?})",
        STAGE,
        holdout.height(),
        sequenced.height() - holdout.height(),
        history.height(),
        policy
    );
    Ok(Split { history, holdout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{bools, ints, names, strs};
    use polars::df;

    fn sequenced() -> DataFrame {
        df!(
            "user_id" => ["u1", "u1", "u2", "u1", "u3", "u3"],
            "A" => [true, true, false, false, true, true],
            "B" => [false, true, true, true, false, true],
            "order_number" => [0i64, 1, 0, 2, 0, 1]
        )
        .expect("Failed to build frame")
    }

    #[test]
    fn test_holdout_is_last_order_per_user() {
        let split = split_holdout(&sequenced(), HistoryPolicy::DropEmpty).expect("Split failed");

        assert_eq!(strs(&split.holdout, USER_ID), vec!["u2", "u1", "u3"]);
        assert_eq!(ints(&split.holdout, ORDER_NUMBER), vec![0, 2, 1]);
        assert_eq!(bools(&split.holdout, "B"), vec![true, true, true]);
    }

    #[test]
    fn test_history_sums_earlier_orders() {
        let split = split_holdout(&sequenced(), HistoryPolicy::DropEmpty).expect("Split failed");

        assert_eq!(names(&split.history), vec!["user_id", "A", "B"]);
        assert_eq!(strs(&split.history, USER_ID), vec!["u1", "u3"]);
        assert_eq!(ints(&split.history, "A"), vec![2, 1]);
        assert_eq!(ints(&split.history, "B"), vec![1, 0]);
    }

    #[test]
    fn test_zero_fill_keeps_single_order_users() {
        let split = split_holdout(&sequenced(), HistoryPolicy::ZeroFill).expect("Split failed");

        assert_eq!(strs(&split.history, USER_ID), vec!["u2", "u1", "u3"]);
        assert_eq!(ints(&split.history, "A"), vec![0, 2, 1]);
        assert_eq!(ints(&split.history, "B"), vec![0, 1, 0]);
    }

    #[test]
    fn test_split_covers_every_order_once() {
        let frame = sequenced();
        let split = split_holdout(&frame, HistoryPolicy::DropEmpty).expect("Split failed");

        let holdout_orders = split.holdout.height() as i64;
        let history_orders: i64 = ints(&split.holdout, ORDER_NUMBER).iter().sum();
        assert_eq!(holdout_orders + history_orders, frame.height() as i64);
    }

    #[test]
    fn test_rejects_non_integer_order_number() {
        let frame = df!("user_id" => [1i64], "order_number" => ["first"])
            .expect("Failed to build frame");

        let result = split_holdout(&frame, HistoryPolicy::DropEmpty);
        assert!(matches!(result, Err(PipelineError::InvalidColumnType { .. })));
    }

    #[test]
    fn test_rejects_text_item_columns() {
        let frame = df!("user_id" => [1i64], "A" => ["yes"], "order_number" => [0i64])
            .expect("Failed to build frame");

        let result = split_holdout(&frame, HistoryPolicy::DropEmpty);
        assert!(matches!(result, Err(PipelineError::InvalidColumnType { column, .. }) if column == "A"));
    }

    #[test]
    fn test_missing_columns() {
        let frame = df!("A" => [true]).expect("Failed to build frame");

        let result = split_holdout(&frame, HistoryPolicy::DropEmpty);
        assert!(matches!(
            result,
            Err(PipelineError::MissingColumns { columns, .. })
                if columns == vec![USER_ID.to_string(), ORDER_NUMBER.to_string()]
        ));
    }
}
