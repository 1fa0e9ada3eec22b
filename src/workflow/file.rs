//! Wrappers to help open input and output byte streams identified by
//! their environment variable keys or as file paths.
//!
//! The path `-` selects STDIN or STDOUT. Paths ending in `.gz` are
//! transparently decompressed on input and compressed on output.
//!
//! Output streams implement Finish, so that a gzip trailer is written
//! while its errors can still be reported rather than on drop.

// dependencies
use std::fs::File;
use std::io::{self, stdin, stdout, Read, Stdout, Write};
use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};
use crate::error::ConfigError;
use crate::workflow::Config;

/// The path that selects a standard stream rather than a file.
pub const STDIO: &str = "-";

/// An InputFile supports reading raw bytes from STDIN or a file.
pub struct InputFile {
    pub filepath: String,
    reader:       Box<dyn Read>,
}
impl InputFile {
    /* ------------------------------------------------------------------
    reader opening
    ------------------------------------------------------------------ */
    /// Open a reader for an input path provided as a reference to an
    /// environment variable key, defaulting to STDIN when the variable is unset.
    pub fn open_env(cfg: &mut Config, key: &str) -> Result<Self, ConfigError> {
        cfg.set_string_env(&[(key, STDIO)]);
        Self::open(cfg.get_string(key))
    }
    /// Open a reader for an input path provided as &str.
    pub fn open(filepath: &str) -> Result<Self, ConfigError> {
        let reader: Box<dyn Read> = if filepath == STDIO {
            Box::new(stdin())
        } else {
            let file = File::open(filepath).map_err(|source| ConfigError::Open {
                path: filepath.to_string(),
                source,
            })?;
            if filepath.ends_with(".gz") {
                Box::new(MultiGzDecoder::new(file))
            } else {
                Box::new(file)
            }
        };
        Ok(Self {
            filepath: filepath.to_string(),
            reader,
        })
    }
    /// Release the underlying byte stream.
    pub fn into_reader(self) -> Box<dyn Read> {
        self.reader
    }
}

/// A byte stream that must be explicitly completed after its last write.
///
/// `finish()` flushes all buffered bytes and writes any stream trailer,
/// returning the first error. Plain streams only need a flush.
pub trait Finish: Write {
    fn finish(&mut self) -> io::Result<()> {
        self.flush()
    }
}
impl Finish for File {}
impl Finish for Stdout {}
impl Finish for Vec<u8> {}
impl<W: Write> Finish for GzEncoder<W> {
    fn finish(&mut self) -> io::Result<()> {
        self.try_finish()?;
        self.get_mut().flush()
    }
}
impl<T: Finish + ?Sized> Finish for &mut T {
    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}
impl<T: Finish + ?Sized> Finish for Box<T> {
    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// An OutputFile supports writing raw bytes to STDOUT or a file.
/// The writer is Send so that a dedicated thread can own it.
pub struct OutputFile {
    pub filepath: String,
    writer:       Box<dyn Finish + Send>,
}
impl OutputFile {
    /* ------------------------------------------------------------------
    writer opening
    ------------------------------------------------------------------ */
    /// Open a writer for an output path provided as a reference to an
    /// environment variable key, defaulting to STDOUT when the variable is unset.
    pub fn open_env(cfg: &mut Config, key: &str) -> Result<Self, ConfigError> {
        cfg.set_string_env(&[(key, STDIO)]);
        Self::open(cfg.get_string(key))
    }
    /// Open a writer for an output path provided as &str.
    /// Call `finish()` on the writer after the last record.
    pub fn open(filepath: &str) -> Result<Self, ConfigError> {
        let writer: Box<dyn Finish + Send> = if filepath == STDIO {
            Box::new(stdout())
        } else {
            let file = File::create(filepath).map_err(|source| ConfigError::Open {
                path: filepath.to_string(),
                source,
            })?;
            if filepath.ends_with(".gz") {
                Box::new(GzEncoder::new(file, Compression::default()))
            } else {
                Box::new(file)
            }
        };
        Ok(Self {
            filepath: filepath.to_string(),
            writer,
        })
    }
    /// Release the underlying byte stream.
    pub fn into_writer(self) -> Box<dyn Finish + Send> {
        self.writer
    }
}
