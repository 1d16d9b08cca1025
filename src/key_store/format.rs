use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{error_codes, KeyringError, KeyringResult};
use crate::grip::Grip;
use crate::key::{TransferableKey, TransferableSubkey};

/// On-disk keyring formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyStoreFormat {
    /// Legacy binary keyring, one file
    Gpg,
    /// Extended binary keybox, one file
    Kbx,
    /// Directory with one file per key, named by grip
    G10,
    Unknown,
}

impl KeyStoreFormat {
    /// Whether the store is a directory of per-key files
    pub fn is_directory(&self) -> bool {
        matches!(self, KeyStoreFormat::G10)
    }
}

impl fmt::Display for KeyStoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyStoreFormat::Gpg => "GPG",
            KeyStoreFormat::Kbx => "KBX",
            KeyStoreFormat::G10 => "G10",
            KeyStoreFormat::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

impl FromStr for KeyStoreFormat {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GPG" => Ok(KeyStoreFormat::Gpg),
            "KBX" => Ok(KeyStoreFormat::Kbx),
            "G10" => Ok(KeyStoreFormat::G10),
            _ => Err(KeyringError::unsupported_format(s)),
        }
    }
}

/// A unit of encoded keyring data: a primary key with its subkeys, or a
/// subkey stored on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyBlock {
    Primary(TransferableKey),
    Subkey(TransferableSubkey),
}

/// Byte-level encoder and decoder for key blocks
///
/// Implementations translate between a concrete wire format and parsed
/// key blocks; the key store never looks at raw bytes itself.
pub trait KeyCodec {
    fn name(&self) -> &str;

    /// Parse every block in `bytes`. Any malformed block fails the call.
    fn decode(&self, bytes: &[u8]) -> KeyringResult<Vec<KeyBlock>>;

    fn encode(&self, blocks: &[KeyBlock]) -> KeyringResult<Vec<u8>>;
}

/// Built-in codec: bincode-encoded blocks, each prefixed by a 32-bit
/// big-endian length
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

const FRAME_HEADER: usize = 4;

impl KeyCodec for NativeCodec {
    fn name(&self) -> &str {
        "native"
    }

    fn decode(&self, bytes: &[u8]) -> KeyringResult<Vec<KeyBlock>> {
        let mut blocks = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            if rest.len() < FRAME_HEADER {
                return Err(KeyringError::parse_error(self.name(), "truncated frame header"));
            }
            let (header, body) = rest.split_at(FRAME_HEADER);
            let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
            if body.len() < len {
                return Err(KeyringError::parse_error(
                    self.name(),
                    &format!("frame of {} bytes exceeds remaining {}", len, body.len()),
                ));
            }
            let (frame, tail) = body.split_at(len);
            let block = bincode::deserialize(frame)
                .map_err(|e| KeyringError::parse_error(self.name(), &e.to_string()))?;
            blocks.push(block);
            rest = tail;
        }
        Ok(blocks)
    }

    fn encode(&self, blocks: &[KeyBlock]) -> KeyringResult<Vec<u8>> {
        let mut out = Vec::new();
        for block in blocks {
            let frame = bincode::serialize(block)?;
            let len = u32::try_from(frame.len()).map_err(|_| {
                KeyringError::invalid_parameter("block", "under 4 GiB", &frame.len().to_string())
            })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&frame);
        }
        Ok(out)
    }
}

/// File name of a key inside a directory-format store
pub fn key_file_name(grip: &Grip) -> String {
    format!("{}.key", grip.to_hex())
}

/// Lazily decode every file of a directory-format store.
///
/// Each item is the parse result of one file; a bad file does not stop
/// the iteration.
pub(crate) fn read_key_directory<'a, C>(
    dir: &Path,
    codec: &'a C,
) -> KeyringResult<impl Iterator<Item = (PathBuf, KeyringResult<Vec<KeyBlock>>)> + 'a>
where
    C: KeyCodec + ?Sized,
{
    let entries = fs::read_dir(dir).map_err(|e| {
        KeyringError::io_error(&format!("cannot read directory {}: {}", dir.display(), e))
    })?;
    let dir = dir.to_path_buf();
    Ok(entries.filter_map(move |entry| {
        decode_directory_entry(&dir, entry.map(|e| e.path()), codec)
    }))
}

/// Decode one directory entry. Non-file entries are skipped; an entry that
/// could not be listed is reported against the directory itself.
pub(crate) fn decode_directory_entry<C>(
    dir: &Path,
    entry: std::io::Result<PathBuf>,
    codec: &C,
) -> Option<(PathBuf, KeyringResult<Vec<KeyBlock>>)>
where
    C: KeyCodec + ?Sized,
{
    match entry {
        Ok(path) if path.is_file() => {
            let result = fs::read(&path)
                .map_err(KeyringError::from)
                .and_then(|bytes| codec.decode(&bytes));
            Some((path, result))
        }
        Ok(_) => None,
        Err(e) => Some((
            dir.to_path_buf(),
            Err(KeyringError::io_error(&format!(
                "cannot read entry of {}: {}",
                dir.display(),
                e
            ))),
        )),
    }
}

/// Make sure `dir` exists and is a directory
pub(crate) fn ensure_directory(dir: &Path) -> KeyringResult<()> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(KeyringError::ParseError {
                source_name: dir.display().to_string(),
                cause: "path exists and is not a directory".to_string(),
                error_code: error_codes::FORMAT_NOT_A_DIRECTORY,
            });
        }
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Write `bytes` to a temporary sibling of `path`, then rename it into place
pub(crate) fn write_file_atomic(path: &Path, bytes: &[u8]) -> KeyringResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| KeyringError::invalid_parameter("path", "file path", &path.display().to_string()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(KeyringError::IoError(format!(
            "write to {} failed (code {}): {}",
            tmp.display(),
            error_codes::FORMAT_WRITE_FAILED,
            e
        )));
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        KeyringError::io_error(&format!("rename to {} failed: {}", path.display(), e))
    })
}
