//! 24-bit BMP output.
//!
//! Rows are stored top-down (negative height in the info header), three
//! bytes per pixel in B, G, R order, each row padded to a multiple of
//! four bytes.

use super::{FrameProgress, FrameSink, SinkError};
use crate::decode::Rgb8;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;

/// Size of the file header plus the info header.
pub const BMP_HEADER_SIZE: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

/// Stored bytes per row, padding included.
#[inline]
fn row_stride(width: usize) -> usize {
    // 3w + (w mod 4) is always the next multiple of four.
    width * 3 + width % 4
}

/// Builds the 54-byte header for a top-down 24-bit bitmap.
pub fn bmp_header(width: usize, height: usize) -> Result<[u8; BMP_HEADER_SIZE], SinkError> {
    let too_large = || SinkError::TooLarge { width, height };
    let w = i32::try_from(width).map_err(|_| too_large())?;
    let h = i32::try_from(height).map_err(|_| too_large())?;
    let data_size = row_stride(width)
        .checked_mul(height)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(too_large)?;
    let file_size = data_size
        .checked_add(BMP_HEADER_SIZE as u32)
        .ok_or_else(too_large)?;

    let mut header = [0u8; BMP_HEADER_SIZE];
    header[0..2].copy_from_slice(b"BM");
    header[2..6].copy_from_slice(&file_size.to_le_bytes());
    // 6..10 reserved
    header[10..14].copy_from_slice(&(BMP_HEADER_SIZE as u32).to_le_bytes());
    header[14..18].copy_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    header[18..22].copy_from_slice(&w.to_le_bytes());
    // Negative height: first stored row is the top of the image.
    header[22..26].copy_from_slice(&(-h).to_le_bytes());
    header[26..28].copy_from_slice(&1u16.to_le_bytes());
    header[28..30].copy_from_slice(&24u16.to_le_bytes());
    // 30..34 compression: none
    header[34..38].copy_from_slice(&data_size.to_le_bytes());
    header[38..42].copy_from_slice(&1i32.to_le_bytes());
    header[42..46].copy_from_slice(&1i32.to_le_bytes());
    // 46..54 palette size and important colours: zero
    Ok(header)
}

/// File name for a frame captured at `at`, e.g. `image_20190101000000.bmp`.
pub fn timestamped_file_name(at: DateTime<Local>) -> String {
    at.format("image_%Y%m%d%H%M%S.bmp").to_string()
}

/// Writes one frame as a BMP stream into `W`.
#[derive(Debug)]
pub struct BmpSink<W: Write> {
    writer: W,
    progress: Option<FrameProgress>,
    row: Vec<u8>,
}

impl<W: Write> BmpSink<W> {
    /// Creates a sink writing into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            progress: None,
            row: Vec::new(),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for BmpSink<W> {
    fn begin_frame(&mut self, width: usize, height: usize) -> Result<(), SinkError> {
        let header = bmp_header(width, height)?;
        self.writer.write_all(&header)?;

        let stride = row_stride(width);
        self.row.clear();
        self.row
            .try_reserve_exact(stride)
            .map_err(|_| SinkError::TooLarge { width, height })?;
        // Padding bytes stay zero for the whole frame.
        self.row.resize(stride, 0);
        self.progress = Some(FrameProgress::new(width, height));
        Ok(())
    }

    fn write_scanline(&mut self, row: &[Rgb8]) -> Result<(), SinkError> {
        let progress = self.progress.as_mut().ok_or(SinkError::NoFrame)?;
        progress.accept(row)?;
        for (dst, px) in self.row.chunks_exact_mut(3).zip(row) {
            dst.copy_from_slice(&px.to_bgr());
        }
        self.writer.write_all(&self.row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let progress = self.progress.take().ok_or(SinkError::NoFrame)?;
        self.writer.flush()?;
        progress.complete()
    }

    /// Stops accepting rows. Bytes already handed to the writer stay there.
    fn abort(&mut self) {
        self.progress = None;
    }
}

/// Writes every frame to its own timestamped BMP file in a directory.
#[derive(Debug)]
pub struct BmpFileSink {
    directory: PathBuf,
    current: Option<(PathBuf, BmpSink<BufWriter<File>>)>,
    written: Vec<PathBuf>,
}

impl BmpFileSink {
    /// Creates the sink, creating `directory` if needed.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            current: None,
            written: Vec::new(),
        })
    }

    /// Paths of completed frames, oldest first.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Path of the most recent completed frame.
    pub fn last_path(&self) -> Option<&Path> {
        self.written.last().map(PathBuf::as_path)
    }

    fn next_path(&self) -> PathBuf {
        let name = timestamped_file_name(Local::now());
        let mut path = self.directory.join(&name);
        let stem = name.trim_end_matches(".bmp");
        let mut n = 1;
        // More than one frame per second: keep earlier files.
        while path.exists() {
            path = self.directory.join(format!("{stem}-{n}.bmp"));
            n += 1;
        }
        path
    }
}

impl FrameSink for BmpFileSink {
    fn begin_frame(&mut self, width: usize, height: usize) -> Result<(), SinkError> {
        let path = self.next_path();
        let file = File::create(&path)?;
        let mut sink = BmpSink::new(BufWriter::new(file));
        sink.begin_frame(width, height)?;
        tracing::debug!(path = %path.display(), width, height, "writing frame");
        self.current = Some((path, sink));
        Ok(())
    }

    fn write_scanline(&mut self, row: &[Rgb8]) -> Result<(), SinkError> {
        let (_, sink) = self.current.as_mut().ok_or(SinkError::NoFrame)?;
        sink.write_scanline(row)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let (path, mut sink) = self.current.take().ok_or(SinkError::NoFrame)?;
        if let Err(e) = sink.finish() {
            drop(sink);
            remove_partial(&path);
            return Err(e);
        }
        tracing::info!(path = %path.display(), "frame saved");
        self.written.push(path);
        Ok(())
    }

    /// Closes and deletes the file of the frame in progress.
    fn abort(&mut self) {
        if let Some((path, sink)) = self.current.take() {
            // Buffered rows are discarded, not flushed.
            drop(sink.into_inner().into_parts());
            remove_partial(&path);
        }
    }
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "partial frame discarded"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove partial frame"),
    }
}
