//! In-memory IR buffer with forward-label patching.
//!
//! A branch to a not-yet-numbered block is resolved by reserving a
//! fixed-width space placeholder in the buffer and overwriting it once
//! the target's number is known. Real file seeking has no place in a
//! library that hands back a `String`; the same trick works directly
//! on the in-memory buffer by recording a byte offset instead.

use std::fmt;

use super::error::CodegenError;

/// A reserved span of `width` space characters inside the buffer,
/// waiting to be overwritten with a label once it's known.
#[derive(Debug, Clone, Copy)]
pub struct PatchPoint {
    offset: usize,
}

/// Accumulates generated IR text and owns the forward-patch machinery.
pub struct Emitter {
    buf: String,
    placeholder_width: usize,
}

impl Emitter {
    pub fn new(placeholder_width: usize) -> Self {
        Emitter {
            buf: String::new(),
            placeholder_width,
        }
    }

    pub fn into_inner(self) -> String {
        self.buf
    }

    /// Write `width` spaces and return a handle to their position, to
    /// be filled in later by [`Self::patch`] once the forward-referenced
    /// label is minted.
    pub fn reserve_patch(&mut self) -> PatchPoint {
        let offset = self.buf.len();
        for _ in 0..self.placeholder_width {
            self.buf.push(' ');
        }
        PatchPoint { offset }
    }

    /// Overwrite a previously reserved placeholder with `label`,
    /// left-aligned and padded with spaces to the reserved width.
    pub fn patch(&mut self, point: PatchPoint, label: u32) -> Result<(), CodegenError> {
        let text = label.to_string();
        if text.len() > self.placeholder_width {
            return Err(CodegenError::Logic(format!(
                "label %{text} does not fit the {}-character forward-reference placeholder; \
                 widen CodegenConfig::label_placeholder_width",
                self.placeholder_width
            )));
        }
        let start = point.offset;
        let end = start + self.placeholder_width;
        let filled = format!("{:<width$}", text, width = self.placeholder_width);
        self.buf.replace_range(start..end, &filled);
        Ok(())
    }
}

impl fmt::Write for Emitter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    #[test]
    fn patch_fills_reserved_span_in_place() {
        let mut e = Emitter::new(4);
        write!(e, "br label %").unwrap();
        let p = e.reserve_patch();
        write!(e, "\n").unwrap();
        e.patch(p, 7).unwrap();
        assert_eq!(e.into_inner(), "br label %7   \n");
    }

    #[test]
    fn patch_rejects_label_wider_than_placeholder() {
        let mut e = Emitter::new(2);
        let p = e.reserve_patch();
        assert!(e.patch(p, 1234).is_err());
    }

    #[test]
    fn unpatched_text_is_preserved() {
        let mut e = Emitter::new(3);
        write!(e, "a").unwrap();
        let p = e.reserve_patch();
        write!(e, "b").unwrap();
        e.patch(p, 9).unwrap();
        assert_eq!(e.into_inner(), "a9  b");
    }
}
