use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use seqrex_common::types::Transaction;
use tracing::{info, warn};

/// Write-ahead log of accepted transactions.
///
/// On-disk format: a sequence of `[u32_be length | canonical tx bytes]`
/// records. Appends are fsynced before the insert that caused them returns,
/// so a crash can lose at most the record being written; replay discards a
/// short trailing record.
/// Upper bound for a single record; a length header beyond this is corrupt
/// data, not a truncated append, and aborts startup.
const MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug)]
pub struct TxWal {
    file: File,
    path: PathBuf,
}

impl TxWal {
    /// Opens (or creates) the log at `path` and replays every complete
    /// record. Undecodable entries are skipped with a warning, a truncated
    /// tail is dropped.
    pub fn open(path: impl AsRef<Path>) -> io::Result<(Self, Vec<Transaction>)> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&path)?;

        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut contents)?;

        let mut replayed = Vec::new();
        let mut offset = 0usize;
        while offset + 4 <= contents.len() {
            let length = u32::from_be_bytes(
                contents[offset..offset + 4]
                    .try_into()
                    .map_err(|_| io::Error::other("corrupt WAL length header"))?,
            ) as usize;
            if length > MAX_RECORD_BYTES {
                return Err(io::Error::other(format!(
                    "corrupt WAL length header at offset {offset}: {length} bytes"
                )));
            }
            let Some(record) = contents.get(offset + 4..offset + 4 + length) else {
                warn!("Discarding short trailing WAL record");
                break;
            };
            match Transaction::decode_canonical(record) {
                Ok(tx) => replayed.push(tx),
                Err(err) => warn!("Skipping undecodable WAL record: {err}"),
            }
            offset += 4 + length;
        }
        if !replayed.is_empty() {
            info!(count = replayed.len(), "Replayed mempool WAL");
        }

        file.seek(SeekFrom::End(0))?;
        Ok((Self { file, path }, replayed))
    }

    /// Appends one record and fsyncs. All-or-nothing per entry: the record
    /// is only considered committed once the sync returns.
    pub fn append(&mut self, tx_bytes: &[u8]) -> io::Result<()> {
        let length = u32::try_from(tx_bytes.len())
            .map_err(|_| io::Error::other("transaction too large for WAL record"))?;
        self.file.write_all(&length.to_be_bytes())?;
        self.file.write_all(tx_bytes)?;
        self.file.sync_all()
    }

    /// Atomically rewrites the log to hold exactly the given records:
    /// a temp file is written, synced, then renamed over the log.
    pub fn rewrite<'a>(
        &mut self,
        entries: impl Iterator<Item = &'a [u8]>,
    ) -> io::Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = File::create(&tmp_path)?;
        for entry in entries {
            let length = u32::try_from(entry.len())
                .map_err(|_| io::Error::other("transaction too large for WAL record"))?;
            tmp.write_all(&length.to_be_bytes())?;
            tmp.write_all(entry)?;
        }
        tmp.sync_all()?;
        std::fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new().append(true).open(&self.path)?;
        self.file.sync_all()
    }
}
