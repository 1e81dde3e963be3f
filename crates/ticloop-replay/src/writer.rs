//! Demo recording writer.
//!
//! [`DemoWriter`] streams frames to any `Write` sink, encoding the binary
//! demo format. The header is written immediately on construction.

use std::io::Write;

use crate::codec::{encode_frame, encode_header, quantize_set};
use crate::error::ReplayError;
use crate::hash::Fnv1a;
use crate::types::{DemoFlags, DemoFrame, DemoHeader};

/// Writes demo data to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use ticloop_core::TicSet;
/// use ticloop_engine::SessionSettings;
/// use ticloop_replay::{DemoFrame, DemoHeader, DemoReader, DemoWriter};
///
/// let header = DemoHeader::from_settings(&SessionSettings::default());
///
/// // Write two frames to an in-memory buffer.
/// let mut buf = Vec::new();
/// let mut writer = DemoWriter::new(&mut buf, &header).unwrap();
/// for tic in 0..2u64 {
///     let mut set = TicSet::default();
///     set.present[0] = true;
///     set.commands[0].forward_move = tic as i8;
///     writer.write_frame(&DemoFrame { tic, set, digest: None }).unwrap();
/// }
/// assert_eq!(writer.frames_written(), 2);
/// drop(writer);
///
/// // Read them back.
/// let mut reader = DemoReader::open(buf.as_slice()).unwrap();
/// assert_eq!(reader.header(), &header);
/// let f1 = reader.next_frame().unwrap().unwrap();
/// assert_eq!(f1.set.commands[0].forward_move, 0);
/// let f2 = reader.next_frame().unwrap().unwrap();
/// assert_eq!(f2.tic, 1);
/// assert!(reader.next_frame().unwrap().is_none());
/// ```
pub struct DemoWriter<W: Write> {
    writer: W,
    header: DemoHeader,
    frames_written: u64,
    stream: Fnv1a,
}

impl<W: Write> DemoWriter<W> {
    /// Create a new demo writer, immediately writing the header.
    pub fn new(mut writer: W, header: &DemoHeader) -> Result<Self, ReplayError> {
        encode_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: *header,
            frames_written: 0,
            stream: Fnv1a::new(),
        })
    }

    /// Record one frame.
    ///
    /// The frame must carry a digest exactly when the header says the demo
    /// records them.
    pub fn write_frame(&mut self, frame: &DemoFrame) -> Result<(), ReplayError> {
        encode_frame(&mut self.writer, frame, self.header.flags)?;
        let long_tics = self.header.flags.contains(DemoFlags::LONG_TICS);
        self.stream.write_tic_set(&quantize_set(&frame.set, long_tics));
        self.frames_written += 1;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// The header written at the start of the stream.
    pub fn header(&self) -> &DemoHeader {
        &self.header
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// FNV-1a hash over every recorded tic set so far.
    ///
    /// Equal to [`DemoReader::stream_hash`](crate::DemoReader::stream_hash)
    /// once the same frames have been read back.
    pub fn stream_hash(&self) -> u64 {
        self.stream.finish()
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
