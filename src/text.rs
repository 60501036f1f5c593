//! The textual record format of `cdbdump` and `cdbmake`.
//!
//! Each record is written as `+klen,dlen:key->data` followed by a newline,
//! and the whole listing ends with an empty line. Keys and data are raw
//! bytes; the lengths make the format binary safe.

use std::io::{self, BufRead, Read, Write};

use crate::error::{Error, Result};
use crate::multimap::MultiMap;
use crate::reader::CDB;
use crate::source::ReadAt;

/// Write every record of `cdb` to `out`, in file order.
pub fn dump<S: ReadAt, W: Write>(cdb: &CDB<S>, out: &mut W) -> Result<()> {
    for record in cdb.iter() {
        let (key, data) = record?;
        write_record(out, &key, &data)?;
    }
    out.write_all(b"\n")?;
    Ok(())
}

/// Write every record of `map`, in its iteration order.
pub fn dump_map<W: Write>(map: &MultiMap, out: &mut W) -> Result<()> {
    for (key, data) in map.records() {
        write_record(out, key, data)?;
    }
    out.write_all(b"\n")?;
    Ok(())
}

fn write_record<W: Write>(out: &mut W, key: &[u8], data: &[u8]) -> Result<()> {
    write!(out, "+{},{}:", key.len(), data.len())?;
    out.write_all(key)?;
    out.write_all(b"->")?;
    out.write_all(data)?;
    out.write_all(b"\n")?;
    Ok(())
}

struct Parser<R> {
    input: R,
    line: usize,
}

impl<R: BufRead> Parser<R> {
    fn error(&self, reason: &'static str) -> Error {
        Error::Parse {
            line: self.line,
            reason,
        }
    }

    fn byte(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        match self.input.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(self.error("unexpected end of input"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn expect(&mut self, want: &[u8]) -> Result<()> {
        for &c in want {
            if self.byte()? != c {
                return Err(self.error("bad record format"));
            }
        }
        Ok(())
    }

    fn number(&mut self, terminator: u8) -> Result<u32> {
        let mut n: u32 = 0;
        let mut digits = 0;
        loop {
            let c = self.byte()?;
            if c == terminator && digits > 0 {
                return Ok(n);
            }
            if !c.is_ascii_digit() {
                return Err(self.error("bad length"));
            }
            n = n
                .checked_mul(10)
                .and_then(|n| n.checked_add((c - b'0') as u32))
                .ok_or_else(|| self.error("length too large"))?;
            digits += 1;
        }
    }

    fn bytes(&mut self, len: u32) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.input).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len as usize {
            return Err(self.error("unexpected end of input"));
        }
        Ok(buf)
    }

    fn record(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.line += 1;
        match self.byte()? {
            b'\n' => return Ok(None),
            b'+' => (),
            _ => return Err(self.error("bad record format")),
        }
        let klen = self.number(b',')?;
        let dlen = self.number(b':')?;
        let key = self.bytes(klen)?;
        self.expect(b"->")?;
        let data = self.bytes(dlen)?;
        self.expect(b"\n")?;
        Ok(Some((key, data)))
    }
}

/// Read records from `input`, passing each to `f`, until the terminating
/// empty line.
pub fn read_records<R, F>(input: R, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&[u8], &[u8]) -> Result<()>,
{
    let mut parser = Parser { input, line: 0 };
    while let Some((key, data)) = parser.record()? {
        f(&key, &data)?;
    }
    Ok(())
}

/// Read a whole listing into a [`MultiMap`].
pub fn parse<R: BufRead>(input: R) -> Result<MultiMap> {
    let mut map = MultiMap::new();
    read_records(input, |key, data| {
        map.insert(key, data);
        Ok(())
    })?;
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(input: &[u8]) -> (usize, &'static str) {
        match parse(input) {
            Err(Error::Parse { line, reason }) => (line, reason),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_listing() {
        let map = parse(&b"+3,5:one->Hello\n+0,2:->\n\n\n\n+1,1:x->y\n"[..]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(b"one").unwrap(), &[b"Hello".to_vec()]);
        assert_eq!(map.get(b"").unwrap(), &[b"\n\n".to_vec()]);
        assert!(!map.contains_key(b"x"));
    }

    #[test]
    fn binary_safe() {
        let mut map = MultiMap::new();
        map.insert(&b"a->b\n"[..], &b"+1,1:\0"[..]);
        map.insert(&b"a->b\n"[..], &b""[..]);
        let mut out = Vec::new();
        dump_map(&map, &mut out).unwrap();
        assert_eq!(parse(&out[..]).unwrap(), map);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_err(b""), (1, "unexpected end of input"));
        assert_eq!(parse_err(b"+1,1:a->b\n"), (2, "unexpected end of input"));
        assert_eq!(parse_err(b"+1,1:a=>b\n\n"), (1, "bad record format"));
        assert_eq!(parse_err(b"+,1:a->b\n\n"), (1, "bad length"));
        assert_eq!(parse_err(b"+1,1:a->bc\n\n"), (1, "bad record format"));
        assert_eq!(parse_err(b"+99999999999,1:"), (1, "length too large"));
        assert_eq!(parse_err(b"+1,5:a->b\n\n"), (1, "unexpected end of input"));
        assert_eq!(parse_err(b"-1,1:a->b\n\n"), (1, "bad record format"));
    }
}
