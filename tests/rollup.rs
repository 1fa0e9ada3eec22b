use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read, Write};

use csv_rollup::record::{N_GROUPS, N_INVALID, N_LINES, N_RECORDS_IN, N_RECORDS_OUT};
use csv_rollup::workflow::Config;
use csv_rollup::workflow::file::{Finish, InputFile, OutputFile};
use csv_rollup::{rollup_counters, RollupError, RollupFanner, RollupSummary, Workflow};
use flate2::{Compression, write::GzEncoder};

type ValueSet = BTreeSet<String>;

fn workflow() -> Workflow {
    Workflow::new("test", Config::new(), rollup_counters("test"))
}

// parse output into (key, value set) pairs, sorted by key then values
fn parse_output(out: &[u8]) -> Vec<(String, ValueSet)> {
    let text = String::from_utf8(out.to_vec()).unwrap();
    let mut records: Vec<(String, ValueSet)> = text
        .lines()
        .map(|line| {
            let (key, values) = line.split_once(',').unwrap();
            (key.to_string(), values.split('\0').map(str::to_string).collect())
        })
        .collect();
    records.sort();
    records
}

fn set(values: &[&str]) -> ValueSet {
    values.iter().map(|v| v.to_string()).collect()
}

fn rollup(input: &str, n_workers: usize) -> (Vec<(String, ValueSet)>, Workflow) {
    let w = workflow();
    let mut out: Vec<u8> = Vec::new();
    RollupFanner::new(n_workers, 4)
        .run(Cursor::new(input.to_string()), &mut out, &w)
        .unwrap();
    (parse_output(&out), w)
}

#[test]
fn one_record_per_key_with_deduplicated_values() {
    let (records, w) = rollup("a,1\na,2\na,1\nb,3\n", 4);
    assert_eq!(records, vec![
        ("a".to_string(), set(&["1", "2"])),
        ("b".to_string(), set(&["3"])),
    ]);
    assert_eq!(w.ctrs.get(N_RECORDS_IN), 4);
    assert_eq!(w.ctrs.get(N_RECORDS_OUT), 2);
}

#[test]
fn merged_input_is_split_before_merging() {
    let (records, _) = rollup("a,1\u{0}2\na,2\n", 2);
    assert_eq!(records, vec![("a".to_string(), set(&["1", "2"]))]);
}

#[test]
fn rolling_up_output_again_changes_nothing() {
    let input = "a,x\na,y\na,x\nb,z\nb,z\nc,1,2\n";
    let w = workflow();
    let mut first: Vec<u8> = Vec::new();
    RollupFanner::new(3, 4).run(Cursor::new(input), &mut first, &w).unwrap();

    // sort merged lines by key so they satisfy the contiguity precondition
    let mut lines: Vec<&[u8]> = first.split(|&b| b == b'\n').filter(|l| !l.is_empty()).collect();
    lines.sort();
    let resorted: Vec<u8> = lines.join(&b'\n');
    let mut second: Vec<u8> = Vec::new();
    RollupFanner::new(3, 4).run(Cursor::new(resorted), &mut second, &workflow()).unwrap();

    assert_eq!(parse_output(&first), parse_output(&second));
    assert_eq!(parse_output(&second), vec![
        ("a".to_string(), set(&["x", "y"])),
        ("b".to_string(), set(&["z"])),
        ("c".to_string(), set(&["1,2"])),
    ]);
}

#[test]
fn non_contiguous_keys_are_not_merged() {
    let (records, w) = rollup("a,1\nb,2\na,3\n", 2);
    assert_eq!(records, vec![
        ("a".to_string(), set(&["1"])),
        ("a".to_string(), set(&["3"])),
        ("b".to_string(), set(&["2"])),
    ]);
    assert_eq!(w.ctrs.get(N_GROUPS), 3);
}

#[test]
fn malformed_lines_are_skipped() {
    let input = "a,1\n\nno delimiter\na,2\n,empty key\nb,\nb,4\n   \n";
    let (records, w) = rollup(input, 2);
    assert_eq!(records, vec![
        ("a".to_string(), set(&["1", "2"])),
        ("b".to_string(), set(&["4"])),
    ]);
    assert_eq!(w.ctrs.get(N_LINES), 6);
    assert_eq!(w.ctrs.get(N_INVALID), 3);
    assert_eq!(w.ctrs.get(N_RECORDS_IN), 3);

    let mut out: Vec<u8> = Vec::new();
    let summary = RollupFanner::new(2, 4).run(Cursor::new(input), &mut out, &workflow()).unwrap();
    assert_eq!(summary, RollupSummary {
        n_lines:       6,
        n_records_in:  3,
        n_invalid:     3,
        n_groups:      2,
        n_records_out: 2,
    });
}

#[test]
fn last_key_without_trailing_newline_is_flushed() {
    let (records, w) = rollup("a,1\nb,1\nb,2", 1);
    assert_eq!(records.last(), Some(&("b".to_string(), set(&["1", "2"]))));
    assert_eq!(w.ctrs.get(N_RECORDS_OUT), 2);
}

#[test]
fn empty_input_writes_nothing() {
    let (records, w) = rollup("", 4);
    assert!(records.is_empty());
    assert_eq!(w.ctrs.get(N_GROUPS), 0);
}

#[test]
fn large_sorted_input_matches_a_serial_merge() {
    // 2000 keys with repeated values, processed by many workers through small queues
    let mut input = String::new();
    let mut expected: BTreeMap<String, ValueSet> = BTreeMap::new();
    for k in 0..2000 {
        let key = format!("key{k:05}");
        for v in 0..(k % 7 + 1) {
            let value = format!("v{}", v % 3);
            input.push_str(&format!("{key},{value}\n"));
            expected.entry(key.clone()).or_default().insert(value);
        }
    }
    let (records, _) = rollup(&input, 8);
    let expected: Vec<(String, ValueSet)> = expected.into_iter().collect();
    assert_eq!(records, expected);
}

#[test]
fn custom_delimiter_and_sentinel() {
    let w = workflow();
    let mut out: Vec<u8> = Vec::new();
    RollupFanner::new(2, 4)
        .delimiter(b'\t')
        .sentinel(b'|')
        .run(Cursor::new("a\t1|2\na\t2\n"), &mut out, &w)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    let (key, values) = text.trim_end().split_once('\t').unwrap();
    assert_eq!(key, "a");
    assert_eq!(values.split('|').collect::<BTreeSet<_>>(), BTreeSet::from(["1", "2"]));
}

// yields its data, then fails every read
struct FailingReader {
    data: Cursor<Vec<u8>>,
}
impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::other("connection reset")),
            n => Ok(n),
        }
    }
}

#[test]
fn read_failure_drains_what_was_read() {
    let w = workflow();
    let mut out: Vec<u8> = Vec::new();
    let input = FailingReader { data: Cursor::new(b"a,1\na,2\nb,3\nb,4\nc,trunc".to_vec()) };
    let result = RollupFanner::new(2, 4).run(input, &mut out, &w);
    match result {
        Err(RollupError::Read(e)) => assert_eq!(e.to_string(), "connection reset"),
        other => panic!("expected a read error, got {other:?}"),
    }
    assert_eq!(parse_output(&out), vec![
        ("a".to_string(), set(&["1", "2"])),
        ("b".to_string(), set(&["3", "4"])),
    ]);
}

#[test]
fn gzip_files_in_and_out() {
    let dir = std::env::temp_dir().join(format!("csv_rollup_it_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let in_path = dir.join("in.csv.gz");
    let out_path = dir.join("out.csv.gz");
    {
        let mut wtr = OutputFile::open(in_path.to_str().unwrap()).unwrap().into_writer();
        wtr.write_all(b"a,1\na,1\nb,2\n").unwrap();
        wtr.finish().unwrap();
    }
    let w = workflow();
    let input = InputFile::open(in_path.to_str().unwrap()).unwrap();
    let output = OutputFile::open(out_path.to_str().unwrap()).unwrap();
    RollupFanner::new(2, 4).run(input.into_reader(), output.into_writer(), &w).unwrap();

    let mut merged: Vec<u8> = Vec::new();
    InputFile::open(out_path.to_str().unwrap()).unwrap().into_reader().read_to_end(&mut merged).unwrap();
    assert_eq!(parse_output(&merged), vec![
        ("a".to_string(), set(&["1"])),
        ("b".to_string(), set(&["2"])),
    ]);
    std::fs::remove_dir_all(&dir).unwrap();
}

// stores bytes until it runs out of room, then fails
struct ShortDisk {
    data: Vec<u8>,
    room: usize,
}
impl Write for ShortDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.room == 0 {
            return Err(io::Error::other("no space left"));
        }
        let n = buf.len().min(self.room);
        self.data.extend_from_slice(&buf[..n]);
        self.room -= n;
        Ok(n)
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn truncated_gzip_trailer_is_a_write_error() {
    // one worker and single-valued keys make the output bytes predictable
    let input = "a,1\nb,2\n";
    let mut complete = GzEncoder::new(Vec::new(), Compression::default());
    complete.write_all(input.as_bytes()).unwrap();
    let total = complete.finish().unwrap().len();

    let mut disk = ShortDisk { data: Vec::new(), room: total - 4 };
    let output = GzEncoder::new(&mut disk, Compression::default());
    let result = RollupFanner::new(1, 4).run(Cursor::new(input), output, &workflow());
    match result {
        Err(RollupError::Write(e)) => assert_eq!(e.to_string(), "no space left"),
        other => panic!("expected a write error, got {other:?}"),
    }
    assert_eq!(disk.data.len(), total - 4);
}
