// src/engine.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};

use rusbit_meta::bencode::{decode_with, DecodeError};
use rusbit_meta::config::Config;
use rusbit_meta::error::Error;
use rusbit_meta::file_io::read_torrent_file;
use rusbit_meta::report::{hex_dump, render_summary, to_json, value_to_json, write_json};
use rusbit_meta::torrent::Metainfo;

/// Bytes shown on each side of a decode error in the hex dump.
const DUMP_WINDOW: usize = 32;

/// Inspect bencoded data and .torrent files
#[derive(Debug, Parser)]
#[command(name = "rusbit-meta", version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./rusbit-meta.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a bencoded string and print it as JSON
    Decode {
        #[arg(value_name = "BENCODED")]
        input: String,
    },
    /// Print a summary of a .torrent file
    Info {
        #[arg(value_name = "TORRENT_FILE")]
        path: PathBuf,

        /// Also write the JSON projection to this file
        #[arg(long, value_name = "OUT")]
        json: Option<PathBuf>,

        /// Files listed before truncating (overrides the config)
        #[arg(long, value_name = "N")]
        max_files: Option<usize>,
    },
    /// Print every piece hash of a .torrent file in hex
    Pieces {
        #[arg(value_name = "TORRENT_FILE")]
        path: PathBuf,
    },
}

pub fn use_command(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    debug!("Effective config: {:?}", config);

    match cli.command {
        Command::Decode { input } => {
            let value = decode_with(input.as_bytes(), &config.decoder)
                .map_err(|e| with_dump(e, input.as_bytes()))?;
            println!("{}", serde_json::to_string(&value_to_json(&value))?);
        }
        Command::Info { path, json, max_files } => {
            if let Some(max_files) = max_files {
                config.report.max_files = max_files;
            }
            let meta = load(&path, &config)?;
            print!("{}", render_summary(&meta, &config.report));

            if let Some(out) = json {
                write_json(&out, &to_json(&meta))
                    .with_context(|| format!("writing JSON to {}", out.display()))?;
                info!("Wrote JSON projection to {}", out.display());
            }
        }
        Command::Pieces { path } => {
            let meta = load(&path, &config)?;
            for piece_hash in meta.torrent.info.piece_hashes() {
                println!("{}", hex::encode(piece_hash));
            }
        }
    }
    Ok(())
}

fn load(path: &Path, config: &Config) -> Result<Metainfo> {
    let buf = read_torrent_file(path)?;
    let meta = Metainfo::from_bytes(&buf, &config.decoder).map_err(|e| match e {
        Error::Decode(decode) => with_dump(decode, &buf),
        other => anyhow::Error::new(other),
    });
    meta.with_context(|| format!("reading torrent {}", path.display()))
}

/// Attaches a hex dump of the bytes around the fault to a decode error.
fn with_dump(err: DecodeError, buf: &[u8]) -> anyhow::Error {
    let dump = hex_dump(buf, err.offset(), DUMP_WINDOW);
    anyhow::Error::new(Error::Decode(err)).context(format!("bytes near the fault:\n{}", dump))
}
