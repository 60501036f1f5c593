use std::fs;

use cdbmap::{CDBWriter, MultiMap, CDB};

macro_rules! noerr {
    ( $e:expr ) => {
        if let Err(x) = $e {
            panic!("{}", x);
        }
    };
}

#[test]
fn test_make() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("make.cdb");
    let filename = filename.to_str().unwrap();

    let mut cdb = CDBWriter::create(filename).unwrap();
    noerr!(cdb.add(b"one", b"Hello"));
    noerr!(cdb.add(b"two", b"Goodbye"));
    noerr!(cdb.add(b"one", b", World!"));
    noerr!(cdb.add(b"this key will be split across two reads", b"Got it."));
    noerr!(cdb.finish());
    assert!(!dir.path().join("make.cdb.tmp").exists());

    let cdb = CDB::open(filename).unwrap();
    assert_eq!(cdb.find(b"two").next().unwrap().unwrap(), b"Goodbye");
    assert_eq!(
        cdb.find(b"this key will be split across two reads")
            .next()
            .unwrap()
            .unwrap(),
        b"Got it."
    );
    let mut i = cdb.find(b"one");
    assert_eq!(i.next().unwrap().unwrap(), b"Hello");
    assert_eq!(i.next().unwrap().unwrap(), b", World!");
    assert!(i.next().is_none());

    let mut i = cdb.iter();
    let next = i.next().unwrap().unwrap();
    assert_eq!(next.0, b"one");
    assert_eq!(next.1, b"Hello");
    let next = i.next().unwrap().unwrap();
    assert_eq!(next.0, b"two");
    assert_eq!(next.1, b"Goodbye");
    let next = i.next().unwrap().unwrap();
    assert_eq!(next.0, b"one");
    assert_eq!(next.1, b", World!");
    let next = i.next().unwrap().unwrap();
    assert_eq!(&next.0[..], &b"this key will be split across two reads"[..]);
    assert_eq!(next.1, b"Got it.");
    assert!(i.next().is_none());
}

#[test]
fn test_write_map_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("map.cdb");
    let filename = filename.to_str().unwrap();
    fs::write(filename, b"old contents").unwrap();

    let mut map = MultiMap::new();
    map.insert("alpha", "1");
    map.insert("beta", "2");
    map.insert("alpha", "3");
    noerr!(CDBWriter::write_map(filename, &map));

    let cdb = CDB::open(filename).unwrap();
    assert_eq!(cdb.to_map().unwrap(), map);
}

#[test]
fn test_unfinished_writer_removes_temporary() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("dropped.cdb");
    let tmpname = dir.path().join("dropped.cdb.part");
    {
        let mut cdb = CDBWriter::with_filenames(
            filename.to_str().unwrap(),
            tmpname.to_str().unwrap(),
        )
        .unwrap();
        noerr!(cdb.add(b"key", b"value"));
        assert!(tmpname.exists());
    }
    assert!(!tmpname.exists());
    assert!(!filename.exists());
}

#[cfg(unix)]
#[test]
fn test_set_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("perm.cdb");
    let filename = filename.to_str().unwrap();
    let mut cdb = CDBWriter::create(filename).unwrap();
    noerr!(cdb.set_permissions(fs::Permissions::from_mode(0o600)));
    noerr!(cdb.finish());
    let mode = fs::metadata(filename).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
