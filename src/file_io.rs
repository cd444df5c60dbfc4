// src/file_io.rs
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

/// Reads a whole .torrent file into memory.
pub fn read_torrent_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
	let path = path.as_ref();
	let buf = fs::read(path).map_err(|source| Error::Io {
		path: path.to_path_buf(),
		source,
	})?;

	debug!("Read {} bytes from {}", buf.len(), path.display());
	Ok(buf)
}

/// Writes `contents` to `path`, replacing any existing file.
pub fn write_output_file<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
	let path = path.as_ref();
	fs::write(path, contents).map_err(|source| Error::Io {
		path: path.to_path_buf(),
		source,
	})?;

	debug!("Wrote {} bytes to {}", contents.len(), path.display());
	Ok(())
}
