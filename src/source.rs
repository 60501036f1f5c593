use filebuffer::FileBuffer;
use std::io;

use crate::error::Result;
use crate::uint32;

/// A random-access byte source a cdb can be read from.
///
/// Reads are at absolute positions and must fill the whole buffer; a read
/// that runs past the end of the source is an error.
pub trait ReadAt {
    fn read_at(&self, buf: &mut [u8], pos: u32) -> Result<()>;

    /// Read a pair of little-endian `u32`s at `pos`.
    fn read_pair(&self, pos: u32) -> Result<(u32, u32)> {
        let mut buf = [0; 8];
        self.read_at(&mut buf, pos)?;
        Ok(uint32::unpack2(&buf))
    }

    /// Read `len` bytes at `pos` into a new vector.
    fn read_vec(&self, pos: u32, len: u32) -> Result<Vec<u8>> {
        let mut result = vec![0; len as usize];
        self.read_at(&mut result, pos)?;
        Ok(result)
    }
}

fn err_eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of file")
}

fn range(data: &[u8], pos: u32, len: usize) -> Result<&[u8]> {
    let start = pos as usize;
    let end = start.checked_add(len).ok_or_else(err_eof)?;
    data.get(start..end).ok_or_else(|| err_eof().into())
}

impl ReadAt for [u8] {
    fn read_at(&self, buf: &mut [u8], pos: u32) -> Result<()> {
        buf.copy_from_slice(range(self, pos, buf.len())?);
        Ok(())
    }

    // Bounds are checked before allocating.
    fn read_vec(&self, pos: u32, len: u32) -> Result<Vec<u8>> {
        Ok(range(self, pos, len as usize)?.to_vec())
    }
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], pos: u32) -> Result<()> {
        self[..].read_at(buf, pos)
    }

    fn read_vec(&self, pos: u32, len: u32) -> Result<Vec<u8>> {
        self[..].read_vec(pos, len)
    }
}

impl ReadAt for FileBuffer {
    fn read_at(&self, buf: &mut [u8], pos: u32) -> Result<()> {
        self[..].read_at(buf, pos)
    }

    fn read_vec(&self, pos: u32, len: u32) -> Result<Vec<u8>> {
        self[..].read_vec(pos, len)
    }
}

#[cfg(unix)]
impl ReadAt for std::fs::File {
    fn read_at(&self, buf: &mut [u8], pos: u32) -> Result<()> {
        use std::os::unix::fs::FileExt;
        self.read_exact_at(buf, pos as u64)?;
        Ok(())
    }
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
    fn read_at(&self, buf: &mut [u8], pos: u32) -> Result<()> {
        (**self).read_at(buf, pos)
    }

    fn read_vec(&self, pos: u32, len: u32) -> Result<Vec<u8>> {
        (**self).read_vec(pos, len)
    }
}
