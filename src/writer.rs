use std::convert::TryFrom;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path;
use std::string;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::format::{EMPTY_SLOT, HEADER_SIZE, PAIR_SIZE, TABLE_COUNT};
use crate::hash::{hash, slot_index, table_index};
use crate::multimap::MultiMap;
use crate::uint32;

#[derive(Clone, Copy, Debug, PartialEq)]
struct HashPos {
    hash: u32,
    pos: u32,
}

const EMPTY: HashPos = HashPos {
    hash: 0,
    pos: EMPTY_SLOT,
};

impl HashPos {
    fn pack(&self, buf: &mut [u8]) {
        uint32::pack2(buf, self.hash, self.pos);
    }
}

fn checked_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TooBig)
}

/// Place every entry of one sub-table into `table`, which must be empty and
/// hold twice as many slots as there are entries.
fn fill_table(entries: &[HashPos], table: &mut [HashPos]) {
    let len = table.len() as u32;
    for e in entries {
        let mut wh = slot_index(e.hash, len) as usize;
        while table[wh].pos != EMPTY_SLOT {
            wh += 1;
            if wh == table.len() {
                wh = 0;
            }
        }
        table[wh] = *e;
    }
}

/// Base interface for making a CDB file.
///
/// Records are written in the order they are added. The sink only needs to
/// be writable and seekable; the header is written last, once every table
/// position is known.
///
/// # Example
///
/// ```no_run
/// fn main() -> cdbmap::Result<()> {
///     let file = std::fs::File::create("temporary.cdb")?;
///     let mut cdb = cdbmap::CDBMake::new(file)?;
///     cdb.add(b"one", b"Hello,")?;
///     cdb.add(b"two", b"world!")?;
///     cdb.finish()?;
///     Ok(())
/// }
/// ```
pub struct CDBMake<W: Write + Seek> {
    entries: Vec<Vec<HashPos>>,
    pos: u32,
    file: io::BufWriter<W>,
}

impl<W: Write + Seek> CDBMake<W> {
    /// Create a new CDB maker, reserving space for the header.
    pub fn new(file: W) -> Result<CDBMake<W>> {
        let mut w = io::BufWriter::new(file);
        w.seek(io::SeekFrom::Start(0))?;
        w.write_all(&[0; HEADER_SIZE as usize])?;
        Ok(CDBMake {
            entries: vec![Vec::new(); TABLE_COUNT],
            pos: HEADER_SIZE,
            file: w,
        })
    }

    fn pos_plus(&mut self, len: u32) -> Result<()> {
        self.pos = self.pos.checked_add(len).ok_or(Error::TooBig)?;
        Ok(())
    }

    /// Add a record to the CDB file.
    pub fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        let keylen = checked_len(key.len())?;
        let datalen = checked_len(data.len())?;
        let next = [PAIR_SIZE, keylen, datalen]
            .iter()
            .try_fold(self.pos, |pos, &len| pos.checked_add(len))
            .ok_or(Error::TooBig)?;

        let mut buf = [0; 8];
        uint32::pack2(&mut buf, keylen, datalen);
        self.file.write_all(&buf)?;
        self.file.write_all(key)?;
        self.file.write_all(data)?;

        let h = hash(key);
        self.entries[table_index(h)].push(HashPos {
            hash: h,
            pos: self.pos,
        });
        self.pos = next;
        Ok(())
    }

    /// Number of records added so far.
    pub fn len(&self) -> usize {
        self.entries.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the hash tables and header, flush, and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        let maxsize = self.entries.iter().map(|e| e.len() * 2).max().unwrap_or(0);
        let count = self.len();
        if maxsize + count > (u32::MAX / PAIR_SIZE) as usize {
            return Err(Error::TooBig);
        }
        debug!(records = count, end = self.pos, "writing hash tables");

        let mut buf = [0; 8];
        let mut table = vec![EMPTY; maxsize];
        let mut header = [0u8; HEADER_SIZE as usize];
        for i in 0..TABLE_COUNT {
            let len = self.entries[i].len() * 2;
            let j = i * PAIR_SIZE as usize;
            uint32::pack2(&mut header[j..j + 8], self.pos, len as u32);
            if len == 0 {
                continue;
            }
            trace!(table = i, slots = len, pos = self.pos, "hash table");

            let slots = &mut table[..len];
            fill_table(&self.entries[i], slots);
            for hp in slots.iter_mut() {
                hp.pack(&mut buf);
                self.file.write_all(&buf)?;
                self.pos_plus(PAIR_SIZE)?;
                *hp = EMPTY;
            }
        }

        self.file.flush()?;
        self.file.seek(io::SeekFrom::Start(0))?;
        self.file.write_all(&header)?;
        self.file.seek(io::SeekFrom::End(0))?;
        self.file.flush()?;
        debug!(size = self.pos, "finished cdb");
        self.file.into_inner().map_err(|e| e.into_error().into())
    }
}

impl CDBMake<fs::File> {
    /// Set the permissions on the underlying file.
    pub fn set_permissions(&self, perm: fs::Permissions) -> Result<()> {
        self.file.get_ref().set_permissions(perm)?;
        Ok(())
    }
}

/// Encode every record of `map` into `sink` as a complete cdb file.
///
/// Records are laid out in the map's iteration order. On error the sink is
/// left partially written and should be discarded.
pub fn encode<W: Write + Seek>(map: &MultiMap, sink: W) -> Result<W> {
    let mut cdb = CDBMake::new(sink)?;
    for (key, value) in map.records() {
        cdb.add(key, value)?;
    }
    cdb.finish()
}

/// A CDB file writer which handles atomic updating.
///
/// Using this type, a CDB file is safely written by first creating a
/// temporary file, building the CDB structure into that temporary file,
/// and finally renaming that temporary file over the final file name.
/// If the temporary file is not properly finished (ie due to an error),
/// the temporary file is deleted when this writer is dropped.
///
/// # Example
///
/// ```no_run
/// use cdbmap::CDBWriter;
///
/// fn main() -> cdbmap::Result<()> {
///     let mut cdb = CDBWriter::create("temporary.cdb")?;
///     cdb.add(b"one", b"Hello")?;
///     cdb.finish()?;
///     Ok(())
/// }
/// ```
pub struct CDBWriter {
    dstname: String,
    tmpname: String,
    cdb: Option<CDBMake<fs::File>>,
}

impl CDBWriter {
    /// Safely create a new CDB file.
    ///
    /// The suffix for the temporary file defaults to `".tmp"`.
    pub fn create<P: AsRef<path::Path> + string::ToString>(filename: P) -> Result<CDBWriter> {
        CDBWriter::with_suffix(filename, ".tmp")
    }

    /// Safely create a new CDB file, using a specific suffix for the temporary file.
    pub fn with_suffix<P: AsRef<path::Path> + string::ToString>(
        filename: P,
        suffix: &str,
    ) -> Result<CDBWriter> {
        let mut tmpname = filename.to_string();
        tmpname.push_str(suffix);
        CDBWriter::with_filenames(filename, &tmpname)
    }

    /// Safely create a new CDB file, using two specific file names.
    ///
    /// Note that the temporary file name must be on the same filesystem
    /// as the destination, or else the final rename will fail.
    pub fn with_filenames<
        P: AsRef<path::Path> + string::ToString,
        Q: AsRef<path::Path> + string::ToString,
    >(
        filename: P,
        tmpname: Q,
    ) -> Result<CDBWriter> {
        let file = fs::File::create(&tmpname)?;
        let cdb = CDBMake::new(file)?;
        Ok(CDBWriter {
            dstname: filename.to_string(),
            tmpname: tmpname.to_string(),
            cdb: Some(cdb),
        })
    }

    /// Atomically replace `filename` with a CDB holding every record of `map`.
    pub fn write_map<P: AsRef<path::Path> + string::ToString>(
        filename: P,
        map: &MultiMap,
    ) -> Result<()> {
        let mut cdb = CDBWriter::create(filename)?;
        for (key, value) in map.records() {
            cdb.add(key, value)?;
        }
        cdb.finish()
    }

    fn maker(&mut self) -> &mut CDBMake<fs::File> {
        // The internal cdb is only ever None once finish() has taken it.
        match self.cdb.as_mut() {
            Some(cdb) => cdb,
            None => unreachable!("CDBWriter used after finish"),
        }
    }

    /// Add a record to the CDB file.
    pub fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        self.maker().add(key, data)
    }

    /// Set permissions on the temporary file.
    ///
    /// This must be done before the file is finished, as the temporary
    /// file will no longer exist at that point.
    pub fn set_permissions(&mut self, perm: fs::Permissions) -> Result<()> {
        self.maker().set_permissions(perm)
    }

    /// Complete the temporary file and rename it over the destination.
    pub fn finish(mut self) -> Result<()> {
        if let Some(cdb) = self.cdb.take() {
            if let Err(e) = self.commit(cdb) {
                let _ = fs::remove_file(&self.tmpname);
                return Err(e);
            }
            debug!(path = %self.dstname, "replaced cdb");
        }
        Ok(())
    }

    fn commit(&self, cdb: CDBMake<fs::File>) -> Result<()> {
        let file = cdb.finish()?;
        file.sync_all()?;
        fs::rename(&self.tmpname, &self.dstname)?;
        Ok(())
    }
}

impl Drop for CDBWriter {
    fn drop(&mut self) {
        if self.cdb.is_some() {
            let _ = fs::remove_file(&self.tmpname);
        }
    }
}
