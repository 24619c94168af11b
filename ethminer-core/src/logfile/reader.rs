//! Backwards line reader
//!
//! Yields the lines of a file from the last one to the first, reading
//! fixed-size chunks from the end instead of loading the whole file.

use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom};

const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Longest line kept in memory. Older bytes of a longer line are dropped.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Iterator over the lines of `R`, newest (last) line first.
///
/// Every byte is searched for a newline once. A line longer than
/// [`MAX_LINE_LEN`] is yielded truncated to its last `MAX_LINE_LEN` bytes.
/// A read error is yielded once and ends the sequence.
pub struct ReverseLines<R> {
    reader: R,
    /// Offset of the first byte already pulled into `chunk`
    pos: u64,
    /// Part of the last read chunk not yet searched for a newline
    chunk: Vec<u8>,
    /// End of the line being assembled, already searched
    tail: VecDeque<u8>,
    chunk_size: usize,
    max_line_len: usize,
    /// Still looking at the physical end of the file
    at_end: bool,
    finished: bool,
}

impl<R: Read + Seek> ReverseLines<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(mut reader: R, chunk_size: usize) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader,
            pos: len,
            chunk: Vec::new(),
            tail: VecDeque::new(),
            chunk_size: chunk_size.max(1),
            max_line_len: MAX_LINE_LEN,
            at_end: true,
            finished: len == 0,
        })
    }

    /// Read the chunk in front of `pos` into `chunk`.
    fn fill(&mut self) -> io::Result<()> {
        let n = (self.chunk_size as u64).min(self.pos);
        self.pos -= n;
        self.reader.seek(SeekFrom::Start(self.pos))?;

        self.chunk.resize(n as usize, 0);
        self.reader.read_exact(&mut self.chunk)
    }

    fn take_line(&mut self) -> String {
        let mut raw: Vec<u8> = self.tail.drain(..).collect();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        String::from_utf8_lossy(&raw).into_owned()
    }
}

/// Put `bytes` in front of `tail`, keeping at most `max` bytes in total.
fn prepend(tail: &mut VecDeque<u8>, max: usize, bytes: &[u8]) {
    let room = max.saturating_sub(tail.len());
    let keep = &bytes[bytes.len().saturating_sub(room)..];
    for &b in keep.iter().rev() {
        tail.push_front(b);
    }
}

impl<R: Read + Seek> Iterator for ReverseLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if let Some(i) = self.chunk.iter().rposition(|&b| b == b'\n') {
                prepend(&mut self.tail, self.max_line_len, &self.chunk[i + 1..]);
                self.chunk.truncate(i);

                // A newline terminating the file does not start another line
                let trailing = self.at_end && self.tail.is_empty();
                self.at_end = false;
                if trailing {
                    continue;
                }
                return Some(Ok(self.take_line()));
            }

            prepend(&mut self.tail, self.max_line_len, &self.chunk);
            self.chunk.clear();

            if self.pos == 0 {
                self.finished = true;
                return Some(Ok(self.take_line()));
            }

            if let Err(e) = self.fill() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}
