//! This crate provides support for reading and writing
//! [CDB](https://cr.yp.to/cdb.html) files as whole multi-maps. A CDB is a
//! "constant database" that acts as an on-disk associative array mapping
//! keys to values, allowing multiple values for each key. It provides for
//! fast lookups and low overheads. A constant database has no provision for
//! updating, only rewriting from scratch.
//!
//! # Examples
//!
//! Encoding a map and loading it back:
//!
//! ```
//! fn main() -> cdbmap::Result<()> {
//!     let mut map = cdbmap::MultiMap::new();
//!     map.insert("one", "Hello, ");
//!     map.insert("one", "world!\n");
//!     map.insert("two", vec![1u8, 2, 3, 4]);
//!
//!     let file = cdbmap::encode(&map, std::io::Cursor::new(Vec::new()))?;
//!     let decoded = cdbmap::decode(file.into_inner())?;
//!     assert_eq!(decoded, map);
//!     Ok(())
//! }
//! ```
//!
//! Creating a database with safe atomic updating:
//!
//! ```no_run
//! fn main() -> cdbmap::Result<()> {
//!     let mut cdb = cdbmap::CDBWriter::create("temporary.cdb")?;
//!     cdb.add(b"one", b"Hello, ")?;
//!     cdb.add(b"one", b"world!\n")?;
//!     cdb.add(b"two", &[1, 2, 3, 4])?;
//!     cdb.finish()?;
//!
//!     let cdb = cdbmap::CDB::open("temporary.cdb")?;
//!     for result in cdb.find(b"one") {
//!         println!("{:?}", result?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # References
//!
//!  * [D. J. Bernstein's original software](https://cr.yp.to/cdb.html)
//!  * [Constant Database (cdb) Internals](https://www.unixuser.org/~euske/doc/cdbinternals/index.html)
//!  * [Wikipedia](https://en.wikipedia.org/wiki/Cdb_(software))

mod error;
pub mod format;
pub mod hash;
mod multimap;
mod reader;
mod source;
pub mod text;
mod uint32;
mod writer;

pub use error::{Error, Result};
pub use multimap::MultiMap;
pub use reader::{decode, CDBIter, CDBKeyValueIter, CDBValueIter, CDB};
pub use source::ReadAt;
pub use writer::{encode, CDBMake, CDBWriter};
