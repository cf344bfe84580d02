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

use std::env;
use std::error::Error;
use std::process;

use log::{error, info};
use reorderml::{
    DataProcessor, HistoryPolicy, PipelineConfig, ReorderProcessor, TrainingSet, write_csv,
};

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let mut config = PipelineConfig::new();
    if args.iter().any(|a| a == "--zero-fill") {
        config = config.with_history_policy(HistoryPolicy::ZeroFill);
    }
    let processor = ReorderProcessor::new(config);

    let events = processor.load_data(&args[1])?;
    let submission = processor.load_data(&args[2])?;
    let training = processor.process_data(&events, &submission)?;

    write_csv(&training, &args[3])?;

    let set = TrainingSet::from_table(&training)?;
    let positives = set.targets.iter().filter(|&&t| t > 0.5).count();
    info!("Wrote {} rows to {}", set.len(), args[3]);
    println!("Training rows: {}, positives: {}", set.len(), positives);
    Ok(())
}

fn main() {
    env_logger::init();

    // Usage: build_training_set <events.csv|json> <submission.csv|json> <output.csv> [--zero-fill]
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "Usage: {} <events> <submission> <output.csv> [--zero-fill]",
            args.first().map(String::as_str).unwrap_or("build_training_set")
        );
        process::exit(2);
    }

    if let Err(e) = run(&args) {
        error!("Failed to build training set: {}", e);
        process::exit(1);
    }
}
