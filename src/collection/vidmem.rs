//! Graphics memory collection from the kernel `vidmem` usage report.
//!
//! The GPU driver exposes a line-oriented text report enumerating committed
//! video memory per process:
//!
//! ```text
//! VidMem Usage (Process 126: surfaceflinger):
//!              Current     Maximum     Total
//! All-Types    16361320    16397908    17045756
//! ```
//!
//! Blocks repeat per tracked process, in any order. Only the "Current" column
//! of the `All-Types` row is of interest here; Maximum and Total are ignored.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{
    collection::Pid,
    service::{MemtrackFlags, MemtrackRecord},
};

/// The tag opening a per-process usage block.
const HEADER_TAG: &str = "VidMem";

/// The label of the row holding the committed byte count.
const TOTALS_LABEL: &str = "All-Types";

/// Accounting attributes of everything in the driver pool: dedicated device
/// memory, private to the process, outside smaps, non-secure.
const GRAPHICS_FLAGS: MemtrackFlags = MemtrackFlags::SMAPS_UNACCOUNTED
    .union(MemtrackFlags::PRIVATE)
    .union(MemtrackFlags::DEDICATED)
    .union(MemtrackFlags::NONSECURE);

/// Scan position while walking the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Still looking for the usage header of the target process.
    Seeking,
    /// Header found; looking for a well-formed totals row.
    Extracting,
}

/// What a single line of the report does to the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Nothing of interest; keep the current state.
    Stay,
    /// The target header was found; switch to [`ScanState::Extracting`].
    Found,
    /// A well-formed totals row was found; stop scanning.
    Done(u64),
}

impl ScanState {
    /// Applies one line of the report to the scan.
    ///
    /// A totals row that fails to parse keeps the scan in
    /// [`ScanState::Extracting`]. In particular the state does not reset on
    /// block boundaries, so the next well-formed totals row wins wherever it
    /// is.
    fn step(self, line: &str, pid: Pid) -> Transition {
        match self {
            ScanState::Seeking if is_usage_header(line, pid) => Transition::Found,
            ScanState::Seeking => Transition::Stay,
            ScanState::Extracting => match current_bytes(line) {
                Some(size) => Transition::Done(size),
                None => Transition::Stay,
            },
        }
    }
}

/// Whether `line` is the usage header for `pid`.
///
/// The canonical header is `VidMem Usage (Process <pid>: <name>):`. The check
/// is token-based so spacing variations from the driver do not matter, but
/// the tag has to sit at the very start of the line.
fn is_usage_header(line: &str, pid: Pid) -> bool {
    if !line.starts_with(HEADER_TAG) {
        return false;
    }

    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(HEADER_TAG) {
        return false;
    }

    // The pid token sits three tokens past the tag: "Usage (Process <pid>:".
    match tokens.nth(2) {
        Some(token) => token
            .strip_suffix(':')
            .and_then(|p| p.parse::<Pid>().ok())
            .is_some_and(|p| p == pid),
        None => false,
    }
}

/// Extracts the "Current" column from a totals row.
///
/// Returns `None` both for lines that are not totals rows at all and for
/// totals rows whose current column does not parse; the caller treats the two
/// the same way and keeps scanning.
fn current_bytes(line: &str) -> Option<u64> {
    if !line.contains(TOTALS_LABEL) {
        return None;
    }

    let mut fields = line.split_whitespace();
    let _label = fields.next()?;

    match fields.next().map(str::parse::<u64>) {
        Some(Ok(size)) => Some(size),
        _ => {
            crate::error!("failed to extract size from line: {line}");
            None
        }
    }
}

/// Scans the report for the committed byte count of `pid`.
///
/// Single-pass and forward-only; stops at the first well-formed totals row
/// reached after the matching header.
fn scan<R: BufRead>(reader: R, pid: Pid) -> Option<u64> {
    let mut state = ScanState::Seeking;

    for line in reader.lines() {
        let Ok(line) = line else {
            return None;
        };

        match state.step(&line, pid) {
            Transition::Stay => {}
            Transition::Found => state = ScanState::Extracting,
            Transition::Done(size) => return Some(size),
        }
    }

    None
}

/// Returns the dedicated video memory records for `pid`, re-reading the
/// report at `path` from scratch.
///
/// A missing or unreadable report is not an error: the platform then simply
/// has no video memory instrumentation and the result is empty. Likewise for
/// a process absent from the report, or present with zero committed bytes.
pub fn graphics_memory(path: &Path, pid: Pid) -> Vec<MemtrackRecord> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_err) => {
            crate::debug!("failed to open report {}: {_err}", path.display());
            return Vec::new();
        }
    };

    match scan(BufReader::new(file), pid) {
        Some(size) if size > 0 => {
            crate::debug!("graphics memory size (pid = {pid}): {size} bytes");

            vec![MemtrackRecord {
                size_in_bytes: size,
                flags: GRAPHICS_FLAGS,
            }]
        }
        _ => Vec::new(),
    }
}
