//! Human-readable and JSON renderings of decoded torrents.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::bencode::BValue;
use crate::config::ReportOptions;
use crate::error::Result;
use crate::file_io::write_output_file;
use crate::torrent::{FileLayout, Metainfo};

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Formats a byte count with binary units, e.g. `1.5 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Unix seconds as `YYYY-MM-DD HH:MM:SS UTC`. Values chrono cannot
/// represent are printed raw.
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{} (out of range)", secs),
    }
}

/// Sum of all file lengths; negative lengths count as zero and the total
/// saturates at `u64::MAX`.
pub fn total_size(meta: &Metainfo) -> u64 {
    match &meta.torrent.info.layout {
        FileLayout::Single { length } => (*length).max(0) as u64,
        FileLayout::Multi { files } => files
            .iter()
            .map(|f| f.length.max(0) as u64)
            .fold(0u64, u64::saturating_add),
    }
}

pub fn render_summary(meta: &Metainfo, options: &ReportOptions) -> String {
    Summary { meta, options }.to_string()
}

struct Summary<'a> {
    meta: &'a Metainfo,
    options: &'a ReportOptions,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let torrent = &self.meta.torrent;
        let info = &torrent.info;

        writeln!(f, "Name: {}", info.name)?;
        writeln!(f, "Info Hash: {}", self.meta.info_hash)?;
        if let Some(announce) = &torrent.announce {
            writeln!(f, "Tracker URL: {}", announce)?;
        }
        if let Some(tiers) = &torrent.announce_list {
            writeln!(f, "Tracker Tiers: {}", tiers.len())?;
            for (i, tier) in tiers.iter().enumerate() {
                writeln!(f, "  [{}] {}", i, tier.join(", "))?;
            }
        }
        if let Some(date) = torrent.creation_date {
            writeln!(f, "Created: {}", format_timestamp(date))?;
        }
        if let Some(created_by) = &torrent.created_by {
            writeln!(f, "Created By: {}", created_by)?;
        }
        if let Some(comment) = &torrent.comment {
            writeln!(f, "Comment: {}", comment)?;
        }
        if let Some(private) = info.private {
            writeln!(f, "Private: {}", if private { "yes" } else { "no" })?;
        }

        writeln!(f, "Piece Length: {}", info.piece_length)?;
        writeln!(f, "Number of Pieces: {}", info.piece_count())?;
        if self.options.piece_preview {
            let mut hashes = info.piece_hashes();
            if let Some(first) = hashes.next() {
                writeln!(f, "First Piece: {}", hex::encode(first))?;
            }
            if let Some(last) = hashes.last() {
                writeln!(f, "Last Piece: {}", hex::encode(last))?;
            }
        }

        writeln!(f, "Total Size: {}", format_bytes(total_size(self.meta)))?;
        if let Some(files) = info.files() {
            let max_files = self.options.max_files;
            writeln!(f, "Files: {}", files.len())?;
            for file in files.iter().take(max_files) {
                writeln!(
                    f,
                    "  {} ({})",
                    file.joined_path(),
                    format_bytes(file.length.max(0) as u64)
                )?;
            }
            if files.len() > max_files {
                writeln!(f, "  ... and {} more", files.len() - max_files)?;
            }
        }
        Ok(())
    }
}

/// JSON projection of a mapped torrent; piece hashes are hex strings.
pub fn to_json(meta: &Metainfo) -> Value {
    let torrent = &meta.torrent;
    let info = &torrent.info;

    let mut info_json = json!({
        "name": info.name,
        "piece_length": info.piece_length,
        "piece_count": info.piece_count(),
        "pieces": info.piece_hashes().map(hex::encode).collect::<Vec<_>>(),
        "private": info.private,
    });
    match &info.layout {
        FileLayout::Single { length } => info_json["length"] = json!(length),
        FileLayout::Multi { files } => info_json["files"] = json!(files),
    }

    json!({
        "info_hash": meta.info_hash.to_hex(),
        "announce": torrent.announce,
        "announce_list": torrent.announce_list,
        "created_by": torrent.created_by,
        "comment": torrent.comment,
        "creation_date": torrent.creation_date,
        "encoding": torrent.encoding,
        "total_size": total_size(meta),
        "info": info_json,
    })
}

/// JSON projection of a raw decoded tree.
pub fn value_to_json(value: &BValue) -> Value {
    // BValue's Serialize impl only emits strings, numbers, arrays and maps
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub fn write_json<P: AsRef<Path>>(path: P, value: &Value) -> Result<()> {
    let mut rendered = serde_json::to_vec_pretty(value)?;
    rendered.push(b'\n');
    write_output_file(path, &rendered)
}

/// Hex dump of the bytes around `offset`, 16 per row, with the offending
/// byte bracketed.
pub fn hex_dump(bytes: &[u8], offset: usize, window: usize) -> String {
    let start = offset.saturating_sub(window) / 16 * 16;
    let end = offset.saturating_add(window + 1).min(bytes.len());
    let mut out = String::new();

    for row in (start..end).step_by(16) {
        let row_end = (row + 16).min(end);
        out.push_str(&format!("{:08x} ", row));
        for (i, b) in bytes[row..row_end].iter().enumerate() {
            if row + i == offset {
                out.push_str(&format!("[{:02x}]", b));
            } else {
                out.push_str(&format!(" {:02x} ", b));
            }
        }
        out.push_str(&"    ".repeat(row + 16 - row_end));
        out.push_str(" |");
        for &b in &bytes[row..row_end] {
            out.push(if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' });
        }
        out.push_str("|\n");
    }
    out
}
