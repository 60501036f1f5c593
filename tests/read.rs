use std::fs;
use std::io::Cursor;

use cdbmap::{decode, encode, Error, MultiMap, CDB};

fn sample() -> MultiMap {
    let mut map = MultiMap::new();
    map.insert("one", "Hello");
    map.insert("two", "Goodbye");
    map.insert("one", ", World!");
    map.insert("this key will be split across two reads", "Got it.");
    map
}

fn sample_file() -> Vec<u8> {
    encode(&sample(), Cursor::new(Vec::new()))
        .unwrap()
        .into_inner()
}

#[test]
fn test_one() {
    let cdb = CDB::new(sample_file());
    let mut i = cdb.find(b"one");
    assert_eq!(i.next().unwrap().unwrap(), b"Hello");
    assert_eq!(i.next().unwrap().unwrap(), b", World!");
}

#[test]
fn test_two() {
    let cdb = CDB::new(sample_file());
    assert_eq!(cdb.find(b"two").next().unwrap().unwrap(), b"Goodbye");
    assert_eq!(
        cdb.find(b"this key will be split across two reads")
            .next()
            .unwrap()
            .unwrap(),
        b"Got it."
    );
}

#[cfg(unix)]
#[test]
fn test_file_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.cdb");
    fs::write(&path, sample_file()).unwrap();

    let map = decode(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(map, sample());
    let cdb = CDB::open(&path).unwrap();
    assert_eq!(cdb.to_map().unwrap(), sample());
}

#[test]
fn test_open_rejects_short_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.cdb");
    fs::write(&path, [0u8; 100]).unwrap();
    match CDB::open(&path) {
        Err(Error::Malformed(_)) => (),
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("opened a 100 byte file"),
    }
}

#[test]
fn test_truncated_mid_record() {
    let data = sample_file();
    // Cut inside the value of the first record.
    for len in &[2048 + 4, 2048 + 8, 2048 + 8 + 3 + 2] {
        let truncated = &data[..*len];
        match decode(truncated) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result for {} bytes: {:?}", len, other),
        }
    }
}
