//! Command-line tool to roll up pre-sorted keyed CSV lines.
//!
//! Reads `key,value` lines from STDIN, where all lines for a key are adjacent,
//! and writes one `key,value1\0value2...` line per run of keys to STDOUT with
//! duplicate values removed. Output lines are in arbitrary order.
//!
//! Options other than `--help` are taken from environment variables.

// dependencies
use std::env;
use std::error::Error;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use csv_rollup::pub_key_constants;
use csv_rollup::workflow::Config;
use csv_rollup::workflow::file::{InputFile, OutputFile};
use csv_rollup::{rollup_counters, RollupError, RollupFanner, RollupSummary, Workflow};

// constants
const TOOL: &str = "csv_rollup";
const DEFAULT_CAPACITY: usize = 1000;
const DEFAULT_PROGRESS_SECS: usize = 1;
pub_key_constants!(
    CSV_ROLLUP_N_WORKERS
    CSV_ROLLUP_CAPACITY
    CSV_ROLLUP_PROGRESS_SECS
    CSV_ROLLUP_FAIL_ON_READ_ERROR
    CSV_ROLLUP_INPUT
    CSV_ROLLUP_OUTPUT
);

fn usage() -> String {
    format!("Usage: {TOOL} [-h|--help]

Reads a pre-sorted (sort -u -t , -k 1) CSV from stdin, treats all bytes after the
first comma as the value, merges values with the same key using a null byte, and
outputs an unsorted merged CSV.

Environment variables:
  {CSV_ROLLUP_N_WORKERS:<30} number of merge threads (default: available cores)
  {CSV_ROLLUP_CAPACITY:<30} records buffered between stages (default: {DEFAULT_CAPACITY})
  {CSV_ROLLUP_PROGRESS_SECS:<30} seconds between progress reports, 0 to disable (default: {DEFAULT_PROGRESS_SECS})
  {CSV_ROLLUP_FAIL_ON_READ_ERROR:<30} exit 1 if input cannot be read to the end (default: 0)
  {CSV_ROLLUP_INPUT:<30} input file, - for stdin, .gz is decompressed (default: -)
  {CSV_ROLLUP_OUTPUT:<30} output file, - for stdout, .gz is compressed (default: -)")
}

// exit status of a finished run; a read error only fails the run on request
fn exit_status(result: &Result<RollupSummary, RollupError>, fail_on_read_error: bool) -> u8 {
    match result {
        Ok(_) => 0,
        Err(RollupError::Read(_)) if !fail_on_read_error => 0,
        Err(_) => 1,
    }
}

// load and process data
fn main() -> Result<ExitCode, Box<dyn Error>> {

    // read command line arguments; only help is supported
    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {},
        Some("-h" | "--help") if args.len() == 1 => {
            println!("{}", usage());
            return Ok(ExitCode::SUCCESS);
        },
        Some(_) => {
            eprintln!("{}: unexpected arguments: {}\n\n{}", TOOL, args.join(" "), usage());
            return Ok(ExitCode::from(2));
        },
    }

    // get config from environment variables
    let n_cpu = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let mut cfg = Config::new();
    cfg.set_usize_env(&[
        (CSV_ROLLUP_N_WORKERS,     n_cpu),
        (CSV_ROLLUP_CAPACITY,      DEFAULT_CAPACITY),
        (CSV_ROLLUP_PROGRESS_SECS, DEFAULT_PROGRESS_SECS),
    ])?;
    cfg.set_bool_env(&[(CSV_ROLLUP_FAIL_ON_READ_ERROR, false)])?;
    let input  = InputFile::open_env(&mut cfg, CSV_ROLLUP_INPUT)?;
    let output = OutputFile::open_env(&mut cfg, CSV_ROLLUP_OUTPUT)?;

    // initialize the tool
    let w = Workflow::new(TOOL, cfg, rollup_counters(TOOL));
    w.log.initializing();
    let progress = match w.cfg.get_usize(CSV_ROLLUP_PROGRESS_SECS) {
        0 => None,
        secs => Some(Duration::from_secs(secs as u64)),
    };
    let mut fanner = RollupFanner::new(
        w.cfg.get_usize(CSV_ROLLUP_N_WORKERS),
        w.cfg.get_usize(CSV_ROLLUP_CAPACITY),
    );
    fanner.progress(progress);
    w.log.print(&format!("merging {} into {} with {} workers",
        input.filepath, output.filepath, fanner.n_workers()
    ));

    // process records in a stream
    let result = fanner.run(input.into_reader(), output.into_writer(), &w);

    // report counter values
    w.ctrs.print_all();
    match &result {
        Ok(summary) => w.log.print(&format!("wrote {} merged records from {} input records",
            summary.n_records_out, summary.n_records_in
        )),
        Err(e) => w.log.print(&e.to_string()),
    }
    w.log.print("complete");
    let status = exit_status(&result, w.cfg.get_bool(CSV_ROLLUP_FAIL_ON_READ_ERROR));
    Ok(ExitCode::from(status))
}
