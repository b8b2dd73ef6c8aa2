#[cfg(feature = "tempfile")]
use crate::streams::StreamFactory;
use crate::{ensure, Capability, Stream, StreamError, StreamResult};
use log::{debug, trace};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
#[cfg(feature = "tempfile")]
use tempfile::{NamedTempFile, TempPath};

/// The way a [`FileStream`] opens its file.
///
/// The capability flags of a [`FileStream`] derive from its mode:
///
/// | mode        | fopen | read | write | seek | on open               |
/// |-------------|-------|------|-------|------|-----------------------|
/// | `Read`      | `r`   | yes  | no    | yes  |                       |
/// | `Write`     | `w`   | no   | yes   | yes  | create, truncate      |
/// | `Append`    | `a`   | no   | yes   | no   | create, cursor at end |
/// | `ReadWrite` | `r+`  | yes  | yes   | yes  |                       |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
    ReadWrite,
}

impl OpenMode {
    fn options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
            OpenMode::ReadWrite => options.read(true).write(true),
        };
        options
    }

    pub fn can_read(&self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        !matches!(self, OpenMode::Read)
    }

    pub fn can_seek(&self) -> bool {
        !matches!(self, OpenMode::Append)
    }
}

impl FromStr for OpenMode {
    type Err = StreamError;

    /// Parse fopen style modes: "r", "w", "a" and "r+".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(OpenMode::Read),
            "w" => Ok(OpenMode::Write),
            "a" => Ok(OpenMode::Append),
            "r+" => Ok(OpenMode::ReadWrite),
            _ => Err(StreamError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid file open mode '{}'.", s),
            ))),
        }
    }
}

/// A [`Stream`](../trait.Stream.html) implementation based on a window
/// `[start, end)` of a file.
///
/// The stream position 0 is at `start` in the file. Writes past `end`
/// move `end` further. In [`OpenMode::Append`], writes always go at the
/// end of the window which always matches the end of the file.
///
/// Resizing calls [`File::set_len()`] on the file and is therefore only
/// possible when the window reaches the end of the file. Otherwise
/// [`resize()`](../trait.Stream.html#tymethod.resize) returns `Ok(false)`.
/// To view a region of a file without those restrictions, build
/// [substreams](../struct.Substream.html) of a stream over the whole file.
#[derive(Debug)]
pub struct FileStream {
    file: Option<File>,
    path: PathBuf,
    mode: OpenMode,
    start: u64,
    end: u64,
    position: u64,
    #[cfg(feature = "tempfile")]
    temp_path: Option<TempPath>,
}

impl FileStream {
    /// Open the file at `path` and window all of it.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> StreamResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = mode.options().open(&path)?;
        let length = file.metadata()?.len();
        debug!("FileStream {:?} opened in mode {:?}.", path, mode);
        Ok(Self::from_parts(file, path, mode, 0, length))
    }

    /// Open the file at `path` and window the bytes `[start, end)`.
    ///
    /// Fails with [`StreamError::InvalidRange`] if the window does not fit
    /// in the file. In [`OpenMode::Append`], `end` must be the end of the
    /// file.
    pub fn open_range<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        start: u64,
        end: u64,
    ) -> StreamResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = mode.options().open(&path)?;
        let length = file.metadata()?.len();
        if start > end
            || end > length
            || (mode == OpenMode::Append && end != length)
        {
            return Err(StreamError::invalid_range(start, end, length));
        }
        debug!(
            "FileStream {:?}[{}, {}) opened in mode {:?}.",
            path, start, end, mode
        );
        Ok(Self::from_parts(file, path, mode, start, end))
    }

    fn from_parts(
        file: File,
        path: PathBuf,
        mode: OpenMode,
        start: u64,
        end: u64,
    ) -> Self {
        let position = match mode {
            OpenMode::Append => end - start,
            _ => 0,
        };
        FileStream {
            file: Some(file),
            path,
            mode,
            start,
            end,
            position,
            #[cfg(feature = "tempfile")]
            temp_path: None,
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// The `[start, end)` window of the file.
    pub fn window(&self) -> (u64, u64) {
        (self.start, self.end)
    }

    fn file(&mut self) -> StreamResult<&mut File> {
        self.file.as_mut().ok_or(StreamError::NotOpen)
    }
}

impl Stream for FileStream {
    fn position(&self) -> u64 {
        self.position
    }

    fn length(&self) -> u64 {
        self.end - self.start
    }

    fn can_read(&self) -> bool {
        self.is_open() && self.mode.can_read()
    }

    fn can_write(&self) -> bool {
        self.is_open() && self.mode.can_write()
    }

    fn can_seek(&self) -> bool {
        self.is_open() && self.mode.can_seek()
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn seek(&mut self, position: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Seek, "seek")?;
        if position > self.length() {
            return Ok(false);
        }
        self.position = position;
        Ok(true)
    }

    fn read(&mut self, length: usize, exact: bool) -> StreamResult<Vec<u8>> {
        ensure(&*self, Capability::Read, "read")?;
        let available = self.length() - self.position;
        if exact && available < length as u64 {
            return Err(StreamError::ShortRead {
                attempted: length,
                actual: available as usize,
            });
        }

        let offset = self.start + self.position;
        let mut buf = vec![0u8; (length as u64).min(available) as usize];
        let file = self.file()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0usize;
        // The file may have been truncated under the window.
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buf.truncate(filled);
        if exact && filled < length {
            return Err(StreamError::ShortRead {
                attempted: length,
                actual: filled,
            });
        }

        trace!("FileStream read {} bytes at {}.", filled, offset);
        self.position += filled as u64;
        Ok(buf)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        ensure(&*self, Capability::Write, "write")?;
        if self.mode == OpenMode::Append {
            self.position = self.length();
        }

        let offset = self.start + self.position;
        let file = self.file()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

        trace!("FileStream wrote {} bytes at {}.", data.len(), offset);
        self.position += data.len() as u64;
        self.end = self.end.max(self.start + self.position);
        Ok(data.len())
    }

    fn resize(&mut self, length: u64) -> StreamResult<bool> {
        ensure(&*self, Capability::Write, "resize")?;
        let (start, end) = (self.start, self.end);
        let new_end = match start.checked_add(length) {
            Some(new_end) => new_end,
            None => return Ok(false),
        };
        let file = self.file()?;
        if file.metadata()?.len() != end {
            return Ok(false);
        }
        file.set_len(new_end)?;

        debug!("FileStream {:?} resized to {} bytes.", self.path, new_end);
        self.end = new_end;
        self.position = self.position.min(length);
        Ok(true)
    }

    fn close(&mut self) -> StreamResult<()> {
        if let Some(mut file) = self.file.take() {
            if self.mode.can_write() {
                file.flush()?;
            }
            debug!("FileStream {:?} closed.", self.path);
        }
        #[cfg(feature = "tempfile")]
        if let Some(temp_path) = self.temp_path.take() {
            temp_path.close()?;
        }
        Ok(())
    }
}

/// Factory to spawn read-write [`FileStream`] instances over temporary
/// files.
///
/// The temporary file is deleted when the stream is closed or dropped.
#[cfg(feature = "tempfile")]
#[derive(Clone, Debug, Default)]
pub struct TempFileStreamFactory {}

#[cfg(feature = "tempfile")]
impl StreamFactory for TempFileStreamFactory {
    type Stream = FileStream;
    fn create(&mut self) -> StreamResult<FileStream> {
        let (file, temp_path) = NamedTempFile::new()?.into_parts();
        let path = temp_path.to_path_buf();
        debug!("Temporary FileStream {:?} created.", path);
        let mut stream =
            FileStream::from_parts(file, path, OpenMode::ReadWrite, 0, 0);
        stream.temp_path = Some(temp_path);
        Ok(stream)
    }
}
