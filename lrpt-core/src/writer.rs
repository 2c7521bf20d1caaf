//! Soft-symbol output writer: append-only, buffered, explicit close.

use crate::errors::{DemodError, Result};
use crate::symbol::SoftSymbol;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default flush-chunk size, matching the driver's default read-chunk size
/// so a stop mid-run flushes a bounded, small tail (spec §4.G).
pub const DEFAULT_CHUNK: usize = 8192;

pub struct SymbolWriter {
    inner: BufWriter<File>,
    path: PathBuf,
    pending: usize,
    chunk: usize,
    closed: bool,
}

impl SymbolWriter {
    pub fn create(path: &Path) -> Result<Self> {
        Self::create_with_chunk(path, DEFAULT_CHUNK)
    }

    pub fn create_with_chunk(path: &Path, chunk: usize) -> Result<Self> {
        let file = File::create(path).map_err(|e| DemodError::OutputOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            inner: BufWriter::new(file),
            path: path.to_path_buf(),
            pending: 0,
            chunk: chunk.max(1),
            closed: false,
        })
    }

    /// Append one symbol's raw bytes, flushing every `chunk` symbols.
    pub fn write_symbol(&mut self, sym: SoftSymbol) -> Result<()> {
        self.inner
            .write_all(&sym.to_bytes())
            .map_err(DemodError::WriteFailure)?;
        self.pending += 1;
        if self.pending >= self.chunk {
            self.flush_inner()?;
        }
        Ok(())
    }

    pub fn write_symbols(&mut self, syms: &[SoftSymbol]) -> Result<()> {
        for &s in syms {
            self.write_symbol(s)?;
        }
        Ok(())
    }

    fn flush_inner(&mut self) -> Result<()> {
        self.inner.flush().map_err(DemodError::WriteFailure)?;
        self.pending = 0;
        Ok(())
    }

    /// Flush and close the output explicitly. Errors surfaced here are what
    /// `Demodulator::join` propagates; `Drop` only best-effort flushes and
    /// swallows failures, so callers must call this to observe them.
    pub fn close(mut self) -> Result<()> {
        self.flush_inner()?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for SymbolWriter {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.inner.flush();
        }
    }
}

impl std::fmt::Debug for SymbolWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolWriter")
            .field("path", &self.path)
            .field("pending", &self.pending)
            .field("chunk", &self.chunk)
            .finish()
    }
}
