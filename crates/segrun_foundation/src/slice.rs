//! Lazy slice descriptors.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::{Error, ErrorKind};

/// A `start:stop:step` range resolved against a length only when consumed.
///
/// Omitted bounds and negative indices follow half-open slicing rules:
/// negatives count from the end, out-of-range bounds are clamped, and a
/// negative step walks backwards.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slice {
    /// First index, or `None` for the natural start.
    pub start: Option<i64>,
    /// Exclusive end, or `None` for the natural end.
    pub stop: Option<i64>,
    /// Stride, or `None` for 1.
    pub step: Option<i64>,
}

impl Slice {
    /// Creates a slice from optional bounds.
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Resolves this slice against a container of `length` elements.
    ///
    /// # Errors
    ///
    /// Returns `ZeroStep` if the step is zero.
    #[allow(clippy::cast_sign_loss)]
    pub fn indices(&self, length: usize) -> Result<Vec<usize>> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(Error::new(ErrorKind::ZeroStep));
        }

        let len = i64::try_from(length).map_err(|_| Error::invalid_input("length too large"))?;
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };

        let clamp = |bound: i64| {
            let bound = if bound < 0 { bound + len } else { bound };
            bound.clamp(lower, upper)
        };

        let start = self
            .start
            .map_or(if step > 0 { lower } else { upper }, clamp);
        let stop = self
            .stop
            .map_or(if step > 0 { upper } else { lower }, clamp);

        let mut out = Vec::new();
        let mut i = start;
        // Bounds are clamped to [-1, len], so every pushed index is non-negative.
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |f: &mut fmt::Formatter<'_>, v: Option<i64>| match v {
            Some(n) => write!(f, "{n}"),
            None => Ok(()),
        };
        part(f, self.start)?;
        write!(f, ":")?;
        part(f, self.stop)?;
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}
