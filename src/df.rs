//! Parser for `df -T -k` output.
//!
//! The output looks like this on Linux:
//!
//! ```text
//! Filesystem     Type     1K-blocks     Used Available Use% Mounted on
//! /dev/sda1      ext4     244277768 88767396 155254372  37% /
//! map -hosts     autofs           0        0         0 100% /net
//! ```
//!
//! Some platforms put long device names on their own line with the numbers
//! on the next one; those records are joined back together. Rows that do not
//! look like real devices are dropped without error, and kept rows only carry
//! the counters that parse as numbers.

use tracing::debug;

use crate::exclusion::ExclusionConfig;
use crate::metrics::SpaceMetrics;
use crate::model::DiskCandidate;

/// Command used by the text discovery source.
pub const DF_PROGRAM: &str = "df";
pub const DF_ARGS: &[&str] = &["-T", "-k"];

/// One kept row of df output.
#[derive(Debug, Clone, PartialEq)]
pub struct DfRow {
    pub candidate: DiskCandidate,
    pub space: SpaceMetrics,
}

/// Parses raw df output into rows that pass the exclusion policy.
pub fn parse_df_output(raw: &str, exclusion: &ExclusionConfig) -> Vec<DfRow> {
    let lines: Vec<Vec<&str>> = raw
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| !fields.is_empty())
        .collect();

    coalesce_wrapped_rows(lines)
        .into_iter()
        .filter(|fields| keep_row(fields, exclusion))
        .filter_map(|fields| to_row(&fields))
        .collect()
}

/// Joins a lone device name line with the numeric line that follows it.
fn coalesce_wrapped_rows(lines: Vec<Vec<&str>>) -> Vec<Vec<&str>> {
    let mut pending: Option<&str> = None;
    let mut out = Vec::with_capacity(lines.len());

    for mut fields in lines {
        if fields.len() == 1 {
            pending = Some(fields[0]);
        } else if let Some(device) = pending.take() {
            if is_number(fields[0]) {
                fields.insert(0, device);
            }
        }
        out.push(fields);
    }
    out
}

fn keep_row(fields: &[&str], exclusion: &ExclusionConfig) -> bool {
    let keep = fields.len() > 2
        && is_digits(fields[2])
        && !exclusion.should_exclude(fields[0], fields[1]);
    if !keep {
        debug!("Skipping df row: {:?}", fields);
    }
    keep
}

fn to_row(fields: &[&str]) -> Option<DfRow> {
    let total_kb = fields.get(2)?.parse::<f64>().ok()?;
    let used_kb = fields.get(3).and_then(|v| v.parse::<f64>().ok());
    let free_kb = fields.get(4).and_then(|v| v.parse::<f64>().ok());
    let in_use = fields.get(5).and_then(|pct| parse_percent(pct));
    let mountpoint = fields.last()?;

    Some(DfRow {
        candidate: DiskCandidate::new(fields[0], fields[1], *mountpoint),
        space: SpaceMetrics {
            total_kb,
            used_kb,
            free_kb,
            in_use,
        },
    })
}

/// `"37%"` becomes `0.37`; anything without a trailing percent sign is ignored.
fn parse_percent(field: &str) -> Option<f64> {
    let value = field.strip_suffix('%').filter(|v| !v.is_empty())?;
    value.parse::<f64>().ok().map(|pct| pct / 100.0)
}

fn is_digits(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

fn is_number(field: &str) -> bool {
    field.parse::<f64>().is_ok_and(f64::is_finite)
}
