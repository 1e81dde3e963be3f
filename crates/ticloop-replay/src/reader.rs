//! Demo playback reader.
//!
//! [`DemoReader`] reads frames from any `Read` source, decoding the binary
//! demo format. The header is validated on construction.

use std::io::Read;

use crate::codec::{decode_frame, decode_header};
use crate::error::ReplayError;
use crate::hash::Fnv1a;
use crate::types::{DemoFrame, DemoHeader};

/// Reads demo data from a byte stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`.
pub struct DemoReader<R: Read> {
    reader: R,
    header: DemoHeader,
    frames_read: u64,
    stream: Fnv1a,
}

impl<R: Read> DemoReader<R> {
    /// Open a demo stream, reading and validating the header.
    pub fn open(mut reader: R) -> Result<Self, ReplayError> {
        let header = decode_header(&mut reader)?;
        Ok(Self {
            reader,
            header,
            frames_read: 0,
            stream: Fnv1a::new(),
        })
    }

    /// Session parameters and extension flags from the header.
    pub fn header(&self) -> &DemoHeader {
        &self.header
    }

    /// Read the next frame, or `None` if the stream is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<DemoFrame>, ReplayError> {
        let frame = decode_frame(&mut self.reader, self.header.flags)?;
        if let Some(f) = &frame {
            self.stream.write_tic_set(&f.set);
            self.frames_read += 1;
        }
        Ok(frame)
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// FNV-1a hash over every tic set read so far.
    pub fn stream_hash(&self) -> u64 {
        self.stream.finish()
    }

    /// Convert into a frame iterator.
    pub fn frames(self) -> FrameIter<R> {
        FrameIter {
            inner: self,
            done: false,
        }
    }
}

/// Iterator adapter over demo frames.
///
/// Stops after the first error.
pub struct FrameIter<R: Read> {
    inner: DemoReader<R>,
    done: bool,
}

impl<R: Read> FrameIter<R> {
    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.inner.frames_read
    }
}

impl<R: Read> Iterator for FrameIter<R> {
    type Item = Result<DemoFrame, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
