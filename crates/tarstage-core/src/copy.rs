//! Streaming copy helpers for entries that bypass the write buffer.
//!
//! Direct writes stream archive data straight to disk through a single
//! reusable 64 KiB buffer per extraction, so large files never need to be
//! held in memory.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::Result;

/// Chunk size for streaming copies.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Heap-allocated scratch buffer reused across every direct write of one
/// extraction.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use tarstage_core::copy::{CopyBuffer, copy_with_buffer};
///
/// # fn main() -> tarstage_core::Result<()> {
/// let mut buffer = CopyBuffer::new();
/// let mut input = Cursor::new(b"hello".to_vec());
/// let mut output = Vec::new();
///
/// let copied = copy_with_buffer(&mut input, &mut output, &mut buffer)?;
/// assert_eq!(copied, 5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Box<[u8]>,
}

impl CopyBuffer {
    /// Creates a zeroed 64 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; COPY_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Returns the chunk size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Streams `reader` into `writer` chunk by chunk, then flushes.
///
/// Returns the number of bytes copied.
#[inline]
pub fn copy_with_buffer<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
) -> Result<u64> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        writer.write_all(&buffer.buf[..bytes_read])?;
        total = total.saturating_add(bytes_read as u64);
    }

    writer.flush()?;
    Ok(total)
}

/// Reads an entry of declared `size` fully into memory for staging.
///
/// The declared size is a capacity hint only; the returned payload holds
/// whatever the reader actually yields.
pub fn read_payload<R: Read + ?Sized>(reader: &mut R, size: u64) -> Result<Vec<u8>> {
    let hint = usize::try_from(size).unwrap_or(0);
    let mut payload = Vec::with_capacity(hint);
    reader.read_to_end(&mut payload)?;
    Ok(payload)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use std::io::Cursor;

    #[test]
    fn test_copy_buffer_size() {
        assert_eq!(CopyBuffer::new().size(), 64 * 1024);
        assert_eq!(CopyBuffer::default().size(), 64 * 1024);
    }

    #[test]
    fn test_copy_empty_source() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(Vec::<u8>::new());
        let mut output = Vec::new();

        let copied = copy_with_buffer(&mut input, &mut output, &mut buffer).unwrap();
        assert_eq!(copied, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_copy_multiple_chunks() {
        let mut buffer = CopyBuffer::new();
        let input_data = vec![0x55u8; COPY_BUFFER_SIZE * 3 + 1000];
        let mut input = Cursor::new(&input_data);
        let mut output = Vec::new();

        let copied = copy_with_buffer(&mut input, &mut output, &mut buffer).unwrap();
        assert_eq!(copied, input_data.len() as u64);
        assert_eq!(output, input_data);
    }

    #[test]
    fn test_copy_reusable_buffer() {
        let mut buffer = CopyBuffer::new();

        let mut first = Vec::new();
        copy_with_buffer(&mut Cursor::new(b"first"), &mut first, &mut buffer).unwrap();

        let mut second = Vec::new();
        copy_with_buffer(&mut Cursor::new(b"second copy"), &mut second, &mut buffer).unwrap();

        assert_eq!(first, b"first");
        assert_eq!(second, b"second copy");
    }

    #[test]
    fn test_copy_with_interrupted_reads() {
        struct InterruptedReader {
            data: Vec<u8>,
            position: usize,
            calls: usize,
        }

        impl Read for InterruptedReader {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.calls += 1;
                if self.calls % 2 == 1 && self.position < self.data.len() {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
                }
                let remaining = &self.data[self.position..];
                let n = remaining.len().min(buf.len()).min(100);
                buf[..n].copy_from_slice(&remaining[..n]);
                self.position += n;
                Ok(n)
            }
        }

        let data = vec![0x42u8; 1000];
        let mut reader = InterruptedReader {
            data: data.clone(),
            position: 0,
            calls: 0,
        };
        let mut output = Vec::new();

        copy_with_buffer(&mut reader, &mut output, &mut CopyBuffer::new()).unwrap();
        assert_eq!(output, data);
    }

    #[test]
    fn test_copy_with_write_failure() {
        struct FailingWriter;

        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("write failed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut input = Cursor::new(vec![1u8; 10]);
        let result = copy_with_buffer(&mut input, &mut FailingWriter, &mut CopyBuffer::new());
        assert!(matches!(result, Err(ExtractionError::Io(_))));
    }

    #[test]
    fn test_read_payload_reads_everything() {
        let mut input = Cursor::new(vec![7u8; 3000]);
        let payload = read_payload(&mut input, 3000).unwrap();
        assert_eq!(payload.len(), 3000);
    }

    #[test]
    fn test_read_payload_ignores_wrong_hint() {
        let mut input = Cursor::new(b"abc".to_vec());
        let payload = read_payload(&mut input, 1_000_000).unwrap();
        assert_eq!(payload, b"abc");
    }
}
