use super::types::{GcTrace, CSV_HEADER};
use std::{
    fs::File,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

/// Iterates over the lines of the traced program's stderr.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than ending the stream, so such
/// a line simply fails to match. Only real read errors are reported.
pub struct LineSource<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Result<String, std::io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();

        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                Some(Ok(String::from_utf8_lossy(line).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// A destination that can force written bytes through to stable storage.
pub trait Durable: Write {
    fn persist(&self) -> std::io::Result<()>;
}

impl Durable for File {
    fn persist(&self) -> std::io::Result<()> {
        self.sync_all()
    }
}

// Nothing beyond a flush can be forced on a pipe or terminal
impl Durable for std::io::Stdout {
    fn persist(&self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to create CSV file {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write CSV record: {0}")]
    Write(#[source] csv::Error),
    #[error("Failed to flush CSV output: {0}")]
    Flush(#[source] std::io::Error),
    #[error("Failed to sync CSV output to disk: {0}")]
    Persist(#[source] std::io::Error),
}

/// Append-only CSV output. Every header or row write is flushed and persisted before the call
/// returns, so a crash can only lose the row in flight.
pub struct CsvSink<W: Durable> {
    writer: csv::Writer<W>,
    header_written: bool,
    rows: u64,
}

impl CsvSink<File> {
    /// Creates (or truncates) `path`. The file exists, empty, even if nothing is ever written.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path).map_err(|source| SinkError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(file))
    }
}

impl<W: Durable> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(inner),
            header_written: false,
            rows: 0,
        }
    }

    /// Writes the column names. Only the first call has any effect.
    pub fn write_header(&mut self) -> Result<(), SinkError> {
        if self.header_written {
            return Ok(());
        }

        self.writer
            .write_record(CSV_HEADER)
            .map_err(SinkError::Write)?;
        self.commit()?;
        self.header_written = true;

        Ok(())
    }

    pub fn write_trace(&mut self, trace: &GcTrace) -> Result<(), SinkError> {
        self.writer.serialize(trace).map_err(SinkError::Write)?;
        self.commit()?;
        self.rows += 1;

        Ok(())
    }

    /// Flushes and persists any remaining output and releases the destination, returning the
    /// number of rows written.
    pub fn finish(mut self) -> Result<u64, SinkError> {
        self.commit()?;
        Ok(self.rows)
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(SinkError::Flush)?;
        self.writer.get_ref().persist().map_err(SinkError::Persist)
    }
}
