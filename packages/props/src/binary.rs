//! BinaryStream - a lazily-resolved, size-queryable binary handle.

use std::io::{self, Read, Write};

use bytes::Bytes;
use cask_repo::PathAddress;

use crate::{PropsResult, Session};

/// A stream over one binary property of one node.
///
/// The underlying binary is resolved lazily, exactly once, on the first
/// operation that needs it; every later operation (and `close`) observes
/// that same state. If resolution fails - property absent, wrong type,
/// node missing, repository error - the handle degrades to an empty
/// stream: reads return nothing, sizes are zero, and no error is raised.
///
/// `data_size` answers without reading the stream: before resolution it
/// asks the repository for the property's size directly.
///
/// The session decides connection lifetime: an `Owned` session holds no
/// connection between operations, and a `Shared` session's connection is
/// never closed by this handle, `close` included.
pub struct BinaryStream {
    session: Session,
    path: PathAddress,
    property: String,
    /// Memo cell: `None` until first resolution, then `Some(resolved)`
    /// where a failed resolution memoizes `Some(None)`.
    resolved: Option<Option<Bytes>>,
    pos: usize,
    mark: usize,
    closed: bool,
}

impl BinaryStream {
    /// Bind a stream to one property of one node. Nothing is resolved yet.
    pub fn bind(session: Session, path: PathAddress, property: &str) -> Self {
        BinaryStream {
            session,
            path,
            property: property.to_string(),
            resolved: None,
            pos: 0,
            mark: 0,
            closed: false,
        }
    }

    /// The bound path.
    pub fn path(&self) -> &PathAddress {
        &self.path
    }

    /// The bound property name.
    pub fn property(&self) -> &str {
        &self.property
    }

    fn resolve(&self) -> PropsResult<Option<Bytes>> {
        self.session.with_conn(|conn| {
            let bytes = conn
                .resolve(&self.path)?
                .and_then(|node| node.property(&self.property).cloned())
                .and_then(|value| value.as_binary().cloned());
            Ok(bytes)
        })
    }

    /// The memoized binary, resolving on first use. Empty after `close`
    /// or failed resolution.
    fn bytes(&mut self) -> Bytes {
        if self.closed {
            return Bytes::new();
        }
        if self.resolved.is_none() {
            let outcome = match self.resolve() {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::debug!(
                        "binary resolution failed for '{}' at {}: {}",
                        self.property,
                        self.path,
                        e
                    );
                    None
                }
            };
            self.resolved = Some(outcome);
        }
        match &self.resolved {
            Some(Some(bytes)) => bytes.clone(),
            _ => Bytes::new(),
        }
    }

    /// The total size of the binary in bytes.
    ///
    /// Zero for an absent or non-binary property. Does not read or
    /// memoize the stream: before resolution this is a size query only.
    pub fn data_size(&mut self) -> u64 {
        if self.closed {
            return 0;
        }
        match &self.resolved {
            Some(Some(bytes)) => bytes.len() as u64,
            Some(None) => 0,
            None => self
                .session
                .with_conn(|conn| Ok(conn.binary_size(&self.path, &self.property)?))
                .unwrap_or(0),
        }
    }

    /// Read everything from the current position to the end.
    pub fn read_all(&mut self) -> Bytes {
        let bytes = self.bytes();
        let rest = bytes.slice(self.pos.min(bytes.len())..);
        self.pos = bytes.len();
        rest
    }

    /// Read up to `n` bytes from the current position.
    pub fn read_n(&mut self, n: usize) -> Bytes {
        let bytes = self.bytes();
        let start = self.pos.min(bytes.len());
        let end = (start + n).min(bytes.len());
        self.pos = end;
        bytes.slice(start..end)
    }

    /// Skip up to `n` bytes; returns how many were skipped.
    pub fn skip(&mut self, n: u64) -> u64 {
        let len = self.bytes().len();
        let start = self.pos.min(len);
        let end = (start as u64).saturating_add(n).min(len as u64) as usize;
        self.pos = end;
        (end - start) as u64
    }

    /// Bytes remaining from the current position.
    pub fn available(&mut self) -> usize {
        let len = self.bytes().len();
        len.saturating_sub(self.pos)
    }

    /// Remember the current position for a later [`BinaryStream::reset`].
    pub fn mark(&mut self) {
        self.mark = self.pos;
    }

    /// Return to the last marked position (the start by default).
    pub fn reset(&mut self) {
        self.pos = self.mark;
    }

    /// Write everything remaining to `out`; returns the byte count.
    pub fn transfer_to(&mut self, out: &mut dyn Write) -> io::Result<u64> {
        let rest = self.read_all();
        out.write_all(&rest)?;
        Ok(rest.len() as u64)
    }

    /// Release the memoized binary. Idempotent; later operations behave
    /// as an empty stream. A shared connection is left open for its
    /// owner.
    pub fn close(&mut self) {
        self.resolved = None;
        self.pos = 0;
        self.mark = 0;
        self.closed = true;
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Read for BinaryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.read_n(buf.len());
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}
