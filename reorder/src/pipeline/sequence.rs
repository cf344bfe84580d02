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

use super::{ORDER_COMPLETED_AT, ORDER_NUMBER, USER_ID, require};
use crate::error::PipelineError;

const STAGE: &str = "order numbering";

/// Numbers each user's orders 0, 1, 2, ... in the frame's current row order and drops
/// `order_completed_at`.
///
/// Rows are not re-sorted; the caller is responsible for the row order reflecting
/// chronology, which [`build_presence_matrix`](super::build_presence_matrix) guarantees.
pub fn number_orders(matrix: &DataFrame) -> Result<DataFrame, PipelineError> {
    require(matrix, STAGE, &[USER_ID, ORDER_COMPLETED_AT])?;

    let running = col(USER_ID).cum_count(false).over([col(USER_ID)]).cast(DataType::Int64);
    let sequenced = matrix
        .clone()
        .lazy()
        .with_column((running - lit(1i64)).alias(ORDER_NUMBER))
        .collect()?
        .drop(ORDER_COMPLETED_AT)?;

    debug!("{}: {} orders numbered", STAGE, sequenced.height());
    Ok(sequenced)
}
