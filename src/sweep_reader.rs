//! Capture CSV reader. Extracts the newest sweep from the file the sweep
//! tool appends to.
//!
//! Row layout: `date, time, freq_low, freq_high, step, samples, db, db, ...`.
//! Only the row count (≥ 6 fields), the two frequency bounds and the trailing
//! power columns are interpreted; step and sample count pass through
//! unchecked since the upstream format is not ours to enforce.

use crate::types::Sweep;
use log::debug;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Minimum fields in a usable row.
pub const MIN_FIELDS: usize = 6;
const FREQ_LOW_FIELD: usize = 2;
const FREQ_HIGH_FIELD: usize = 3;
/// First power column.
const POWER_FIELD: usize = 6;
/// Bytes read per backward step when looking for the last line.
const TAIL_CHUNK: u64 = 64 * 1024;

/// Newest sweep in the capture file, or `None` when the file is missing,
/// empty, or its last line does not parse. Never fails.
pub fn read_latest_sweep(path: &Path) -> Option<Sweep> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("capture file {} unavailable: {}", path.display(), e);
            return None;
        }
    };

    let line = match last_line(file) {
        Ok(Some(line)) => line,
        Ok(None) => {
            debug!("capture file {} is empty", path.display());
            return None;
        }
        Err(e) => {
            debug!("read {}: {}", path.display(), e);
            return None;
        }
    };

    match parse_sweep_line(&line) {
        Ok(sweep) => Some(sweep),
        Err(e) => {
            debug!("discarding last capture row: {}", e);
            None
        }
    }
}

/// Last line of the stream (without its terminator), or `None` if the
/// stream is empty. Reads backwards from the end in chunks, so the cost
/// does not grow with the number of rows. A trailing blank line counts as
/// the last line, which then fails to parse: the writer is mid-row.
pub fn last_line<R: Read + Seek>(mut reader: R) -> io::Result<Option<String>> {
    let len = reader.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(None);
    }

    let mut tail: Vec<u8> = Vec::new();
    let mut pos = len;
    loop {
        let start = pos.saturating_sub(TAIL_CHUNK);
        let mut chunk = vec![0u8; (pos - start) as usize];
        reader.seek(SeekFrom::Start(start))?;
        reader.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&tail);
        tail = chunk;
        pos = start;

        let body = tail.strip_suffix(b"\n").unwrap_or(&tail[..]);
        if let Some(nl) = body.iter().rposition(|&b| b == b'\n') {
            return decode_line(&body[nl + 1..]).map(Some);
        }
        if pos == 0 {
            return decode_line(body).map(Some);
        }
    }
}

fn decode_line(bytes: &[u8]) -> io::Result<String> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Parse one capture row into a sweep.
pub fn parse_sweep_line(line: &str) -> Result<Sweep, String> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Err(format!(
            "expected at least {} fields, got {}",
            MIN_FIELDS,
            fields.len()
        ));
    }

    let freq_low = parse_number(fields[FREQ_LOW_FIELD], "freq_low")?;
    let freq_high = parse_number(fields[FREQ_HIGH_FIELD], "freq_high")?;
    if freq_low > freq_high {
        return Err(format!(
            "freq_low {} above freq_high {}",
            freq_low, freq_high
        ));
    }

    let power_readings = fields[POWER_FIELD..]
        .iter()
        .enumerate()
        .map(|(i, f)| parse_number(f, &format!("power[{}]", i)))
        .collect::<Result<Vec<f64>, String>>()?;
    if power_readings.is_empty() {
        return Err("row has no power readings".into());
    }

    Ok(Sweep {
        freq_low,
        freq_high,
        power_readings,
    })
}

fn parse_number(field: &str, name: &str) -> Result<f64, String> {
    let value: f64 = field
        .parse()
        .map_err(|e| format!("{} {:?}: {}", name, field, e))?;
    if !value.is_finite() {
        return Err(format!("{} {:?} is not finite", name, field));
    }
    Ok(value)
}
