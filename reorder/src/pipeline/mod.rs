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

//! The event-log to training-set pipeline.
//!
//! Stages run strictly in order, each a pure function from frames to a new frame:
//!
//! 1. [`build_presence_matrix`]: event log to boolean user x order x item matrix
//! 2. [`number_orders`]: per-user 0-based `order_number`, timestamp dropped
//! 3. [`split_holdout`]: last order per user (holdout) vs. summed earlier orders (history)
//! 4. [`to_long`]: wide item columns to `(user_id, category, value)` rows
//! 5. [`compute_features`]: `orders_total`, `rating` and the composite `id`
//! 6. [`attach_target`] and [`filter_allowlist`]: binary label and candidate filter
//! 7. [`add_popularity`]: per-category `total_ordered`
//!
//! [`process_data`] wires them together.

pub mod features;
pub mod holdout;
pub mod long;
pub mod matrix;
pub mod merge;
pub mod popularity;
pub mod sequence;

pub use features::compute_features;
pub use holdout::{Split, split_holdout};
pub use long::to_long;
pub use matrix::build_presence_matrix;
pub use merge::{attach_target, filter_allowlist};
pub use popularity::add_popularity;
pub use sequence::number_orders;

use log::info;
use polars::prelude::{DataFrame, DataType};

use crate::error::PipelineError;

pub const USER_ID: &str = "user_id";
pub const ORDER_COMPLETED_AT: &str = "order_completed_at";
pub const CART: &str = "cart";
pub const ORDER_NUMBER: &str = "order_number";
pub const CATEGORY: &str = "category";
pub const ORDERED: &str = "ordered";
pub const TARGET: &str = "target";
pub const ORDERS_TOTAL: &str = "orders_total";
pub const RATING: &str = "rating";
pub const ID: &str = "id";
pub const TOTAL_ORDERED: &str = "total_ordered";

pub const DEFAULT_ID_SEPARATOR: &str = ";";

// Scratch column used to restore row order after joins.
pub(crate) const ROW_INDEX: &str = "__row";

/// What the history table holds for a user whose only order is the holdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    /// The user has no history row and drops out of the feature table.
    #[default]
    DropEmpty,
    /// The user gets an all-zero history row, `orders_total = 0` and a NaN `rating`.
    ZeroFill,
}

/// How the holdout target is attached to feature rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetAlignment {
    /// Join on `(user_id, category)`.
    #[default]
    ByKey,
    /// Attach by row position after checking both tables list the same keys in the
    /// same order.
    Positional,
}

/// Options for [`process_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    history_policy: HistoryPolicy,
    target_alignment: TargetAlignment,
    id_separator: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            history_policy: HistoryPolicy::default(),
            target_alignment: TargetAlignment::default(),
            id_separator: DEFAULT_ID_SEPARATOR.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }

    pub fn with_target_alignment(mut self, alignment: TargetAlignment) -> Self {
        self.target_alignment = alignment;
        self
    }

    pub fn with_id_separator(mut self, separator: &str) -> Self {
        self.id_separator = separator.to_string();
        self
    }

    pub fn history_policy(&self) -> HistoryPolicy {
        self.history_policy
    }

    pub fn target_alignment(&self) -> TargetAlignment {
        self.target_alignment
    }

    pub fn id_separator(&self) -> &str {
        &self.id_separator
    }
}

/// Fails with the stage name and every missing column when `frame` lacks any of `columns`.
pub(crate) fn require(
    frame: &DataFrame,
    stage: &'static str,
    columns: &[&str],
) -> Result<(), PipelineError> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|name| frame.column(name).is_err())
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns { stage, columns: missing })
    }
}

/// Fails unless every named column holds integers or booleans.
pub(crate) fn require_counts<S: AsRef<str>>(
    frame: &DataFrame,
    columns: &[S],
) -> Result<(), PipelineError> {
    for name in columns {
        let name = name.as_ref();
        let dtype = frame.column(name)?.dtype();
        if !(dtype.is_integer() || dtype == &DataType::Boolean) {
            return Err(PipelineError::InvalidColumnType {
                column: name.to_string(),
                expected: "integer or boolean",
            });
        }
    }
    Ok(())
}

/// Names of the per-item columns of a wide frame: everything but the key columns.
pub(crate) fn item_columns(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != USER_ID && name.as_str() != ORDER_NUMBER)
        .map(|name| name.to_string())
        .collect()
}

/// Text form of `name` on the first row of `frame`, for error messages.
pub(crate) fn first_text(frame: &DataFrame, name: &str) -> Result<String, PipelineError> {
    let text = frame.column(name)?.cast(&DataType::String)?;
    Ok(text.str()?.get(0).unwrap_or_default().to_string())
}

/// Runs the full pipeline: raw events and a candidate allowlist in, training frame out.
///
/// # Parameters
/// - `events`: The event log, with `user_id`, `order_completed_at` and `cart` columns.
/// - `allowlist`: Candidate ids in an `id` column, in the `user;category` format.
/// - `config`: History policy, target alignment and id separator.
///
/// # Returns
/// A `Result` containing:
/// - On success: One row per allowed `(user_id, category)` pair with columns `user_id`,
///   `category`, `ordered`, `orders_total`, `rating`, `id`, `target` and `total_ordered`.
///   `category` keeps the type of `cart` when the items are numeric.
/// - On error: The first [`PipelineError`] raised by a stage.
///
/// # Notes
/// - Inputs are never modified; every stage returns a new frame.
pub fn process_data(
    events: &DataFrame,
    allowlist: &DataFrame,
    config: &PipelineConfig,
) -> Result<DataFrame, PipelineError> {
    info!("Processing {} events with {:?}", events.height(), config);

    let matrix = build_presence_matrix(events)?;
    let item_dtype = events.column(CART)?.dtype().clone();
    let sequenced = number_orders(&matrix)?;
    let split = split_holdout(&sequenced, config.history_policy)?;

    let history_long = to_long(&split.history, ORDERED, &item_dtype)?;
    let holdout_long = to_long(&split.holdout, TARGET, &item_dtype)?;

    let features = compute_features(&history_long, &split.holdout, &config.id_separator)?;
    let labelled = attach_target(&features, &holdout_long, config.target_alignment)?;
    let filtered = filter_allowlist(&labelled, allowlist)?;
    let training = add_popularity(&filtered)?;

    info!("Built training frame with {} rows", training.height());
    Ok(training)
}
