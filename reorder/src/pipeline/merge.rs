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

use super::{CATEGORY, ID, ROW_INDEX, TARGET, TargetAlignment, USER_ID, first_text, require};
use crate::error::PipelineError;

const TARGET_STAGE: &str = "target merge";
const FILTER_STAGE: &str = "allowlist filter";

fn by_key(features: &DataFrame, holdout_long: &DataFrame) -> Result<DataFrame, PipelineError> {
    let targets = holdout_long.clone().lazy().select([
        col(USER_ID),
        col(CATEGORY),
        col(TARGET).cast(DataType::Int64),
    ]);
    let keys = [col(USER_ID), col(CATEGORY)];
    let labelled = features
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .join(targets, keys.clone(), keys, JoinArgs::new(JoinType::Left))
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    if labelled.column(TARGET)?.null_count() > 0 {
        let unmatched = labelled.clone().lazy().filter(col(TARGET).is_null()).collect()?;
        return Err(PipelineError::DataIntegrity(format!(
            "no holdout target for user '{}', category '{}'",
            first_text(&unmatched, USER_ID)?,
            first_text(&unmatched, CATEGORY)?
        )));
    }
    Ok(labelled)
}

fn positional(features: &DataFrame, holdout_long: &DataFrame) -> Result<DataFrame, PipelineError> {
    if features.height() != holdout_long.height() {
        return Err(PipelineError::DataIntegrity(format!(
            "feature table has {} rows but holdout target has {}",
            features.height(),
            holdout_long.height()
        )));
    }

    let same_key = |name: &str| -> Result<BooleanChunked, PipelineError> {
        let left = features.column(name)?.as_materialized_series();
        let right = holdout_long.column(name)?.as_materialized_series();
        Ok(left.equal_missing(right)?)
    };
    let aligned = &same_key(USER_ID)? & &same_key(CATEGORY)?;
    if let Some(row) = aligned.into_iter().position(|same| same != Some(true)) {
        return Err(PipelineError::DataIntegrity(format!(
            "row {} has a different (user_id, category) in the feature table than in the holdout target",
            row
        )));
    }

    let target = holdout_long.column(TARGET)?.cast(&DataType::Int64)?;
    let mut labelled = features.clone();
    labelled.with_column(target)?;
    Ok(labelled)
}

/// Attaches the holdout `target` (as 0/1) to every feature row.
///
/// With [`TargetAlignment::ByKey`] the target is joined on `(user_id, category)`.
/// With [`TargetAlignment::Positional`] row `i` takes the target of holdout row `i`,
/// after checking that both frames have the same length and the same key on every row.
///
/// # Errors
/// [`PipelineError::DataIntegrity`] when a feature row has no matching holdout row.
pub fn attach_target(
    features: &DataFrame,
    holdout_long: &DataFrame,
    alignment: TargetAlignment,
) -> Result<DataFrame, PipelineError> {
    require(features, TARGET_STAGE, &[USER_ID, CATEGORY])?;
    require(holdout_long, TARGET_STAGE, &[USER_ID, CATEGORY, TARGET])?;

    let labelled = match alignment {
        TargetAlignment::ByKey => by_key(features, holdout_long)?,
        TargetAlignment::Positional => positional(features, holdout_long)?,
    };
    debug!("{}: attached {} targets ({:?})", TARGET_STAGE, labelled.height(), alignment);
    Ok(labelled)
}

/// Keeps the rows whose `id` appears in the `id` column of `allowlist`, in their
/// original order.
///
/// Ids are compared in their text form; null allowlist entries match nothing.
pub fn filter_allowlist(
    frame: &DataFrame,
    allowlist: &DataFrame,
) -> Result<DataFrame, PipelineError> {
    require(allowlist, FILTER_STAGE, &[ID])?;
    require(frame, FILTER_STAGE, &[ID])?;

    let allowed = allowlist
        .clone()
        .lazy()
        .select([col(ID).cast(DataType::String).drop_nulls().unique()])
        .collect()?;
    let filtered = frame
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .join(
            allowed.clone().lazy(),
            [col(ID).cast(DataType::String)],
            [col(ID)],
            JoinArgs::new(JoinType::Semi),
        )
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    debug!(
        "{}: kept {} of {} rows against {} allowed ids",
        FILTER_STAGE,
        filtered.height(),
        frame.height(),
        allowed.height()
    );
    Ok(filtered)
}
