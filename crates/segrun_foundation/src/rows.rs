//! Fixed-width byte rows.
//!
//! Backing storage for `bN`, `I`, and `E` arrays: a flat buffer holding
//! `len` rows of exactly `width` bytes each.

use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::Error;
use crate::value::check_array_size;

/// A homogeneous sequence of byte rows, all `width` bytes long.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ByteRows {
    width: usize,
    data: Vec<u8>,
}

impl ByteRows {
    /// Creates an empty set of rows with the given width.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `width` is zero.
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::invalid_input("byte row width must be positive"));
        }
        Ok(Self {
            width,
            data: Vec::new(),
        })
    }

    /// Creates `len` zero-filled rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `width` is zero or the rows would exceed
    /// [`MAX_ARRAY_BYTES`](crate::MAX_ARRAY_BYTES).
    pub fn zeroed(width: usize, len: usize) -> Result<Self> {
        let mut rows = Self::new(width)?;
        rows.data = vec![0; check_array_size(len, width)?];
        Ok(rows)
    }

    /// Builds rows from a flat buffer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `width` is zero or does not divide the buffer.
    pub fn from_flat(width: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || data.len() % width != 0 {
            return Err(Error::invalid_input(format!(
                "{} bytes cannot be split into rows of width {width}",
                data.len()
            )));
        }
        Ok(Self { width, data })
    }

    /// Builds rows from individual byte sequences, each of which must be `width` long.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any row has a different length.
    pub fn from_rows<I, R>(width: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        let mut out = Self::new(width)?;
        for row in rows {
            out.push(row.as_ref())?;
        }
        Ok(out)
    }

    /// Width of each row in bytes.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.width)?;
        self.data.get(start..start + self.width)
    }

    /// Iterates over rows in order.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.width)
    }

    /// The flat backing buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the rows, returning the flat buffer.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the row length differs from the width.
    pub fn push(&mut self, row: &[u8]) -> Result<()> {
        if row.len() != self.width {
            return Err(Error::invalid_input(format!(
                "row of {} bytes does not fit width {}",
                row.len(),
                self.width
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Overwrites the row at `index`. The caller guarantees bounds and width.
    pub(crate) fn set_row(&mut self, index: usize, row: &[u8]) {
        let start = index * self.width;
        self.data[start..start + self.width].copy_from_slice(row);
    }

    /// Collects the rows at the given positions. The caller guarantees bounds.
    pub(crate) fn take(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.width);
        for &i in indices {
            data.extend_from_slice(&self.data[i * self.width..(i + 1) * self.width]);
        }
        Self {
            width: self.width,
            data,
        }
    }

    /// Truncates or zero-pads to `len` rows.
    pub(crate) fn resize(&mut self, len: usize) {
        self.data.resize(len * self.width, 0);
    }

    /// Appends all rows of `other`. The caller guarantees equal widths.
    pub(crate) fn append(&mut self, other: &Self) {
        self.data.extend_from_slice(&other.data);
    }

    /// Lexicographic comparison of two rows.
    pub(crate) fn cmp_rows(&self, a: usize, b: usize) -> Ordering {
        self.data[a * self.width..(a + 1) * self.width]
            .cmp(&self.data[b * self.width..(b + 1) * self.width])
    }
}

impl fmt::Debug for ByteRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}[", self.width)?;
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            for byte in row {
                write!(f, "{byte:02x}")?;
            }
        }
        write!(f, "]")
    }
}
