//! Length-prefixed count server.
//!
//! Request: `u32` little-endian length `N`, then `N` bytes of text.
//! Response: the decimal count and `\n`; an `N = 0` frame gets a bare `\n`.
//! End of input before a complete frame ends the loop normally.

use std::io::{self, ErrorKind, Read, Write};

use tracing::debug;

use crate::counter::Counter;

pub struct Server {
    counter: Box<dyn Counter>,
}

/// Fills `buf`, or returns `false` if the stream ends first.
fn read_frame_part<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

impl Server {
    pub fn new(counter: Box<dyn Counter>) -> Self {
        Server { counter }
    }

    pub fn counter(&self) -> &dyn Counter {
        self.counter.as_ref()
    }

    /// Serves frames until `reader` is exhausted. Returns the number of
    /// frames answered.
    pub fn run<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> io::Result<u64> {
        let mut buf = Vec::new();
        let mut served = 0u64;
        loop {
            let mut len = [0u8; 4];
            if !read_frame_part(&mut reader, &mut len)? {
                break;
            }
            let len = u32::from_le_bytes(len) as usize;

            if len == 0 {
                writer.write_all(b"\n")?;
                writer.flush()?;
                served += 1;
                continue;
            }

            // Grows with the bytes actually received, not the claimed length.
            buf.clear();
            reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
            if buf.len() < len {
                debug!(expected = len, received = buf.len(), "input ended inside a frame");
                break;
            }

            let count = self.counter.count(&buf);
            debug!(bytes = len, tokens = count, "served frame");
            writeln!(writer, "{count}")?;
            writer.flush()?;
            served += 1;
        }
        Ok(served)
    }
}
