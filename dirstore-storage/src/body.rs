//! Body sources for object writes.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};

/// Content of an object being saved.
///
/// A body is consumed by [`Body::write_to`], so it is read at most once,
/// front to back. Nothing ever seeks or rewinds the source.
pub enum Body {
    /// In-memory buffer.
    Bytes(Vec<u8>),
    /// Sequential source. With a declared length exactly that many bytes are
    /// copied; without one the source is read until it reports end of stream.
    Reader {
        source: Box<dyn Read + Send>,
        declared_len: Option<u64>,
    },
}

impl Body {
    pub fn from_reader(source: impl Read + Send + 'static) -> Self {
        Self::Reader {
            source: Box::new(source),
            declared_len: None,
        }
    }

    pub fn from_reader_with_len(source: impl Read + Send + 'static, len: u64) -> Self {
        Self::Reader {
            source: Box::new(source),
            declared_len: Some(len),
        }
    }

    pub fn declared_len(&self) -> Option<u64> {
        match self {
            Body::Bytes(bytes) => Some(bytes.len() as u64),
            Body::Reader { declared_len, .. } => *declared_len,
        }
    }

    /// Copy the body into `sink`, returning the number of bytes written.
    ///
    /// A source that ends before its declared length fails with
    /// `ErrorKind::UnexpectedEof`, not the `EIO` a raw device read would
    /// give: the shortfall is detected here, not by the OS.
    pub fn write_to<W: Write + ?Sized>(self, sink: &mut W) -> io::Result<u64> {
        match self {
            Body::Bytes(bytes) => {
                sink.write_all(&bytes)?;
                Ok(bytes.len() as u64)
            }
            Body::Reader {
                source,
                declared_len: Some(expected),
            } => {
                let written = io::copy(&mut source.take(expected), sink)?;
                if written != expected {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("body declared {expected} bytes but only {written} were read"),
                    ));
                }
                Ok(written)
            }
            Body::Reader {
                mut source,
                declared_len: None,
            } => io::copy(&mut source, sink),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Body::Reader { declared_len, .. } => f
                .debug_struct("Reader")
                .field("declared_len", declared_len)
                .finish_non_exhaustive(),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Body::Bytes(bytes.to_vec())
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Bytes(text.as_bytes().to_vec())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Bytes(text.into_bytes())
    }
}

impl From<File> for Body {
    fn from(file: File) -> Self {
        Body::from_reader(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Yields its data once, then end of stream once; any read after that is
    /// an error.
    struct OneShot {
        data: Cursor<Vec<u8>>,
        finished: bool,
        reads_after_eof: Arc<AtomicUsize>,
    }

    impl Read for OneShot {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.finished {
                self.reads_after_eof.fetch_add(1, Ordering::SeqCst);
                return Err(io::Error::new(io::ErrorKind::Other, "must not be read"));
            }
            let n = self.data.read(buf)?;
            if n == 0 {
                self.finished = true;
            }
            Ok(n)
        }
    }

    #[test]
    fn bytes_body_writes_everything() {
        let mut sink = Vec::new();
        let written = Body::from("my contents").write_to(&mut sink).unwrap();
        assert_eq!(written, 11);
        assert_eq!(sink, b"my contents");
    }

    #[test]
    fn reader_without_length_reads_to_exhaustion_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let body = Body::from_reader(OneShot {
            data: Cursor::new(b"tempfile".to_vec()),
            finished: false,
            reads_after_eof: counter.clone(),
        });
        let mut sink = Vec::new();
        assert_eq!(body.write_to(&mut sink).unwrap(), 8);
        assert_eq!(sink, b"tempfile");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reader_with_length_stops_at_declared_length() {
        let counter = Arc::new(AtomicUsize::new(0));
        let body = Body::from_reader_with_len(
            OneShot {
                data: Cursor::new(b"0123456789".to_vec()),
                finished: false,
                reads_after_eof: counter.clone(),
            },
            4,
        );
        let mut sink = Vec::new();
        assert_eq!(body.write_to(&mut sink).unwrap(), 4);
        assert_eq!(sink, b"0123");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn short_reader_is_unexpected_eof() {
        let body = Body::from_reader_with_len(Cursor::new(b"my contents".to_vec()), 1234);
        assert_eq!(body.declared_len(), Some(1234));
        let err = body.write_to(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
