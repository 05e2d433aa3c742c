//! Newline-delimited document dumps, optionally gzipped and split into
//! several files by row count.

use crate::{file::error::FileError, json::write_json_line};
use flate2::{Compression, write::GzEncoder};
use model::records::document::Document;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    pub path: PathBuf,
    pub compress: bool,
    /// Rows per file. Zero disables splitting.
    pub max_rows: u64,
}

impl FileSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSinkConfig {
            path: path.into(),
            compress: false,
            max_rows: 0,
        }
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Name of the `split`-th output file.
    ///
    /// `out.json` becomes `out.split-3.json` when splitting, and gets a `.gz`
    /// suffix when compressing.
    pub fn file_name(&self, split: usize) -> PathBuf {
        let base = self.path.to_string_lossy();
        let mut name = if self.max_rows > 0 {
            let ext = extension(&base);
            let stem = &base[..base.len() - ext.len()];
            format!("{stem}.split-{split}{ext}")
        } else {
            base.into_owned()
        };
        if self.compress {
            name.push_str(".gz");
        }
        PathBuf::from(name)
    }
}

/// Extension of the last path element, including the dot. Empty when the
/// last element has no dot.
fn extension(path: &str) -> &str {
    for (idx, c) in path.char_indices().rev() {
        match c {
            '.' => return &path[idx..],
            '/' | '\\' => break,
            _ => {}
        }
    }
    ""
}

enum RecordWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl RecordWriter {
    fn open(path: &Path, compress: bool) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(if compress {
            RecordWriter::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            RecordWriter::Plain(file)
        })
    }

    fn finish(self) -> io::Result<()> {
        let mut file = match self {
            RecordWriter::Plain(file) => file,
            RecordWriter::Gzip(gz) => gz.finish()?,
        };
        file.flush()?;
        file.get_ref().sync_all()
    }
}

impl Write for RecordWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            RecordWriter::Plain(w) => w.write(buf),
            RecordWriter::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            RecordWriter::Plain(w) => w.flush(),
            RecordWriter::Gzip(w) => w.flush(),
        }
    }
}

/// Writes one JSON document per line.
///
/// The first file is created as soon as the sink is; later split files are
/// only opened when a record needs them, so `M` rows with a limit of `R`
/// produce `ceil(M / R)` files.
pub struct FileSink {
    config: FileSinkConfig,
    writer: Option<RecordWriter>,
    current: PathBuf,
    split: usize,
    rows: u64,
    total_rows: u64,
    files: Vec<PathBuf>,
}

impl FileSink {
    pub fn create(config: FileSinkConfig) -> Result<Self, FileError> {
        let current = config.file_name(0);
        let writer = open(&current, config.compress)?;

        Ok(FileSink {
            files: vec![current.clone()],
            config,
            writer: Some(writer),
            current,
            split: 0,
            rows: 0,
            total_rows: 0,
        })
    }

    pub fn write(&mut self, doc: &Document) -> Result<(), FileError> {
        if self.config.max_rows > 0 && self.rows >= self.config.max_rows {
            self.rotate()?;
        }

        let writer = self.writer.as_mut().ok_or(FileError::Closed)?;
        write_json_line(writer, doc).map_err(|source| FileError::Write {
            path: self.current.clone(),
            source,
        })?;

        self.rows += 1;
        self.total_rows += 1;
        Ok(())
    }

    /// Flushes and closes the current file. Further writes fail.
    pub fn finish(&mut self) -> Result<(), FileError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        writer.finish().map_err(|source| FileError::Close {
            path: self.current.clone(),
            source,
        })?;
        info!(
            files = self.files.len(),
            rows = self.total_rows,
            "File output closed"
        );
        Ok(())
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn rotate(&mut self) -> Result<(), FileError> {
        if let Some(writer) = self.writer.take() {
            writer.finish().map_err(|source| FileError::Close {
                path: self.current.clone(),
                source,
            })?;
        }

        self.split += 1;
        self.rows = 0;
        self.current = self.config.file_name(self.split);
        self.writer = Some(open(&self.current, self.config.compress)?);
        self.files.push(self.current.clone());

        debug!(file = %self.current.display(), split = self.split, "Opened next split file");
        Ok(())
    }
}

fn open(path: &Path, compress: bool) -> Result<RecordWriter, FileError> {
    RecordWriter::open(path, compress).map_err(|source| FileError::Create {
        path: path.to_path_buf(),
        source,
    })
}
