//This file is part of wcrev
//
//wcrev is free software: you can redistribute it and/or modify
//it under the terms of the GNU General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//wcrev is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU General Public License for more details.
//
//You should have received a copy of the GNU General Public License
//along with wcrev.  If not, see <http://www.gnu.org/licenses/>.

use crate::errors::Error;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How many bytes a template may grow by while placeholders get expanded
pub const EXPANSION_SLACK: usize = 4096;

/// A template loaded into memory, together with the position the next
/// placeholder search starts at.
///
/// The logical length never exceeds `capacity`; every resize goes through
/// [splice](TemplateBuffer::splice), which refuses to grow past it.
#[derive(Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct TemplateBuffer {
    data: Vec<u8>,
    capacity: usize,
    cursor: usize,
}

impl TemplateBuffer {
    /// Creates a buffer holding `bytes` that may grow by `slack` bytes
    pub fn new<B: Into<Vec<u8>>>(bytes: B, slack: usize) -> TemplateBuffer {
        let data = bytes.into();
        let capacity = data.len().saturating_add(slack);

        TemplateBuffer {
            data,
            capacity,
            cursor: 0,
        }
    }

    /// Reads the whole file at `path` into a new buffer with [EXPANSION_SLACK]
    /// bytes of room to grow.
    ///
    /// # Errors
    ///
    /// * If the file can't be opened
    /// * If the file can't be read or is empty
    pub fn from_file(path: &Path) -> Result<TemplateBuffer, Error> {
        let mut file = File::open(path).map_err(|e| Error::Open {
            path: path.display().to_string(),
            err: e.to_string(),
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        if bytes.is_empty() {
            return Err(Error::File(format!(
                "Could not determine filesize of '{}'",
                path.display()
            )));
        }

        debug!("Read {} bytes from {}", bytes.len(), path.display());

        Ok(TemplateBuffer::new(bytes, EXPANSION_SLACK))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Moves the cursor back to the start of the buffer
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to `pos`, or to the end of the buffer if `pos` is past it
    pub fn seek(&mut self, pos: usize) {
        self.cursor = pos.min(self.data.len());
    }

    /// Finds the next occurrence of `marker` at or after the cursor. Doesn't
    /// move the cursor.
    pub fn find(&self, marker: &[u8]) -> Option<usize> {
        if marker.is_empty() || self.cursor + marker.len() > self.data.len() {
            return None;
        }

        self.data[self.cursor..]
            .windows(marker.len())
            .position(|window| window == marker)
            .map(|pos| pos + self.cursor)
    }

    /// Finds the first `byte` at or after `from`
    pub fn find_byte(&self, byte: u8, from: usize) -> Option<usize> {
        if from >= self.data.len() {
            return None;
        }

        self.data[from..]
            .iter()
            .position(|b| *b == byte)
            .map(|pos| pos + from)
    }

    /// The bytes in `start..end`, if that's inside the buffer
    pub fn slice(&self, start: usize, end: usize) -> Option<&[u8]> {
        self.data.get(start..end)
    }

    /// Replaces the `remove_len` bytes at `start` with `replacement`. The
    /// bytes after the span are kept and shifted by the length difference.
    ///
    /// # Errors
    ///
    /// * If the span isn't inside the buffer
    /// * If the result would be longer than the capacity. The buffer is left
    ///   untouched in both cases.
    pub fn splice(
        &mut self,
        start: usize,
        remove_len: usize,
        replacement: &[u8],
    ) -> Result<(), Error> {
        let end = start
            .checked_add(remove_len)
            .filter(|end| *end <= self.data.len());

        let end = match end {
            Some(end) => end,
            None => {
                return Err(Error::Span {
                    start,
                    len: remove_len,
                    buf_len: self.data.len(),
                    capacity: self.capacity,
                });
            }
        };

        let needed = self.data.len() - remove_len + replacement.len();

        if needed > self.capacity {
            return Err(Error::Overflow {
                marker: String::from_utf8_lossy(&self.data[start..end]).into_owned(),
                needed,
                capacity: self.capacity,
            });
        }

        self.data.splice(start..end, replacement.iter().cloned());

        Ok(())
    }
}
