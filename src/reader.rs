use filebuffer::FileBuffer;
use std::cmp::min;
use std::path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::format::{EMPTY_SLOT, HEADER_SIZE, PAIR_SIZE};
use crate::hash::{hash, slot_index, table_index};
use crate::multimap::MultiMap;
use crate::source::ReadAt;

const KEYSIZE: usize = 32;

fn offset(pos: u32, len: u32) -> Result<u32> {
    pos.checked_add(len)
        .ok_or(Error::Malformed("offset past 4 GiB limit"))
}

/// CDB file reader
///
/// The reader works over any [`ReadAt`] source: a memory-mapped file from
/// [`CDB::open`], an open `File`, or bytes already in memory.
///
/// # Example
///
/// ```no_run
/// let cdb = cdbmap::CDB::open("tests/test1.cdb").unwrap();
///
/// for result in cdb.find(b"one") {
///     println!("{:?}", result.unwrap());
/// }
/// ```
pub struct CDB<S = FileBuffer> {
    source: S,
}

impl CDB<FileBuffer> {
    /// Opens the named file and returns the CDB reader.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// let cdb = cdbmap::CDB::open("tests/test1.cdb").unwrap();
    /// ```
    pub fn open<P: AsRef<path::Path>>(filename: P) -> Result<CDB> {
        let file = FileBuffer::open(&filename)?;
        if file.len() < HEADER_SIZE as usize || file.len() > u32::MAX as usize {
            return Err(Error::Malformed("file size out of range"));
        }
        Ok(CDB::new(file))
    }
}

impl<S: ReadAt> CDB<S> {
    pub fn new(source: S) -> CDB<S> {
        CDB { source }
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Position where the records end and the hash tables begin.
    ///
    /// This is the table position of the first header entry, taken as is.
    pub fn end_of_records(&self) -> Result<u32> {
        let (end, _) = self.source.read_pair(0)?;
        Ok(end)
    }

    fn hash_table(&self, khash: u32) -> Result<(u32, u32, u32)> {
        let x = table_index(khash) as u32 * PAIR_SIZE;
        let (hpos, hslots) = self.source.read_pair(x)?;
        let kpos = if hslots > 0 {
            let size = hslots
                .checked_mul(PAIR_SIZE)
                .ok_or(Error::Malformed("hash table too large"))?;
            offset(hpos, size)?;
            hpos + slot_index(khash, hslots) * PAIR_SIZE
        } else {
            0
        };
        Ok((hpos, hslots, kpos))
    }

    fn match_key(&self, key: &[u8], pos: u32) -> Result<bool> {
        let mut buf = [0 as u8; KEYSIZE];
        let mut len = key.len();
        let mut pos = pos;
        let mut keypos = 0;

        while len > 0 {
            let n = min(len, buf.len());
            self.source.read_at(&mut buf[..n], pos)?;
            if buf[..n] != key[keypos..keypos + n] {
                return Ok(false);
            }
            pos = offset(pos, n as u32)?;
            keypos += n;
            len -= n;
        }
        Ok(true)
    }

    /// Find all records with the named key. The returned iterator
    /// produces each value associated with the key.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut cdb = cdbmap::CDBMake::new(std::io::Cursor::new(Vec::new())).unwrap();
    /// cdb.add(b"one", b"Hello").unwrap();
    /// let cdb = cdbmap::CDB::new(cdb.finish().unwrap().into_inner());
    ///
    /// for result in cdb.find(b"one") {
    ///     println!("{:?}", result.unwrap());
    /// }
    /// ```
    pub fn find(&self, key: &[u8]) -> CDBValueIter<'_, S> {
        CDBValueIter::find(self, key)
    }

    /// The first value stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.find(key).next().transpose()
    }

    /// Iterate over every record in the order it was written.
    ///
    /// This walks the record region and never consults the hash tables.
    pub fn iter(&self) -> CDBKeyValueIter<'_, S> {
        CDBKeyValueIter::new(self)
    }

    /// Load every record into a [`MultiMap`].
    pub fn to_map(&self) -> Result<MultiMap> {
        let mut map = MultiMap::new();
        for record in self.iter() {
            let (key, value) = record?;
            map.insert(key, value);
        }
        debug!(keys = map.len(), records = map.record_count(), "decoded cdb");
        Ok(map)
    }
}

/// Decode every record of a cdb into a [`MultiMap`].
///
/// A single forward scan over the records: values of each key keep their
/// on-disk order. Any read failure, including a source that ends in the
/// middle of a record, is returned instead of a partial map.
pub fn decode<S: ReadAt>(source: S) -> Result<MultiMap> {
    CDB::new(source).to_map()
}

pub type CDBIter<'a, S = FileBuffer> = CDBKeyValueIter<'a, S>;

/// Iterator over every record in the CDB, as `(key, value)` pairs.
pub struct CDBKeyValueIter<'a, S> {
    cdb: &'a CDB<S>,
    pos: u32,
    end: Option<u32>,
    done: bool,
}

impl<'a, S: ReadAt> CDBKeyValueIter<'a, S> {
    fn new(cdb: &'a CDB<S>) -> CDBKeyValueIter<'a, S> {
        CDBKeyValueIter {
            cdb,
            pos: HEADER_SIZE,
            end: None,
            done: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let end = match self.end {
            Some(end) => end,
            None => {
                let end = self.cdb.end_of_records()?;
                self.end = Some(end);
                end
            }
        };
        if self.pos >= end {
            return Ok(None);
        }

        let source = &self.cdb.source;
        let (klen, dlen) = source.read_pair(self.pos)?;
        let kpos = offset(self.pos, PAIR_SIZE)?;
        let dpos = offset(kpos, klen)?;
        let next = offset(dpos, dlen)?;
        let key = source.read_vec(kpos, klen)?;
        let data = source.read_vec(dpos, dlen)?;
        self.pos = next;
        Ok(Some((key, data)))
    }
}

impl<'a, S: ReadAt> Iterator for CDBKeyValueIter<'a, S> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator over a set of records in the CDB with the same key.
pub struct CDBValueIter<'a, S> {
    cdb: &'a CDB<S>,
    key: Vec<u8>,
    khash: u32,
    kloop: u32,
    kpos: u32,
    hpos: u32,
    hslots: u32,
    started: bool,
}

impl<'a, S: ReadAt> CDBValueIter<'a, S> {
    fn find(cdb: &'a CDB<S>, key: &[u8]) -> CDBValueIter<'a, S> {
        CDBValueIter {
            cdb,
            key: key.to_vec(),
            khash: hash(key),
            kloop: 0,
            kpos: 0,
            hpos: 0,
            hslots: 0,
            started: false,
        }
    }

    fn next_value(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.started {
            let (hpos, hslots, kpos) = self.cdb.hash_table(self.khash)?;
            self.hpos = hpos;
            self.hslots = hslots;
            self.kpos = kpos;
            self.started = true;
        }
        let source = &self.cdb.source;
        while self.kloop < self.hslots {
            let (khash, pos) = source.read_pair(self.kpos)?;
            if pos == EMPTY_SLOT {
                return Ok(None);
            }
            self.kloop += 1;
            self.kpos += PAIR_SIZE;
            if self.kpos == self.hpos + (self.hslots << 3) {
                self.kpos = self.hpos;
            }
            if khash == self.khash {
                let (klen, dlen) = source.read_pair(pos)?;
                if klen as usize == self.key.len() {
                    let kpos = offset(pos, PAIR_SIZE)?;
                    if self.cdb.match_key(&self.key[..], kpos)? {
                        let dpos = offset(kpos, klen)?;
                        return source.read_vec(dpos, dlen).map(Some);
                    }
                }
            }
        }
        Ok(None)
    }
}

impl<'a, S: ReadAt> Iterator for CDBValueIter<'a, S> {
    type Item = Result<Vec<u8>>;
    fn next(&mut self) -> Option<Result<Vec<u8>>> {
        match self.next_value() {
            Ok(value) => value.map(Ok),
            Err(e) => {
                // Stop probing after a failed read.
                self.kloop = u32::MAX;
                self.started = true;
                Some(Err(e))
            }
        }
    }
}
