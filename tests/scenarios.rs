use seekstream::streams::{ChannelStream, FileStream, MemoryStream, OpenMode};
use seekstream::{SharedStream, Stream, StreamError};
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

const TEXT: &[u8; 45] = b"Lorem ipsum dolor sit amet, consectetur elit.";

#[test]
fn memory_fixed_capacity() {
    let mut stream = MemoryStream::from(b"hello".to_vec()).fixed_capacity();
    assert_eq!(stream.write_at(0, b"adios").unwrap(), 5);
    assert_eq!(stream.contents(), b"adios");
    assert!(matches!(
        stream.write_at(2, b"wwww"),
        Err(StreamError::ShortWrite {
            attempted: 4,
            actual: 3
        })
    ));
    assert_eq!(stream.contents(), b"adwww");
}

#[test]
fn file_window() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(TEXT).unwrap();

    let mut stream =
        FileStream::open_range(file.path(), OpenMode::ReadWrite, 0, 45)
            .unwrap();
    assert!(stream.seek(2).unwrap());
    assert_eq!(stream.read(2, false).unwrap(), TEXT[2..4].to_vec());

    assert_eq!(stream.write_at(2, b"ABCDE").unwrap(), 5);
    assert_eq!(
        stream.read_from(0, 7, true).unwrap(),
        b"LoABCDE".to_vec()
    );
    stream.close().unwrap();
    assert_eq!(&std::fs::read(file.path()).unwrap()[..7], b"LoABCDE");
}

#[test]
fn nested_substreams_resolve_to_backend() {
    let data: Vec<u8> = (0u8..100).collect();
    let backend = SharedStream::new(MemoryStream::from(data));
    let outer = backend.substream(Some(10), Some(50)).unwrap();
    let mut inner = outer.substream(Some(5), Some(20)).unwrap();
    assert_eq!(inner.range(), (15, Some(30)));
    assert_eq!(inner.read(15, true).unwrap(), (15u8..30).collect::<Vec<_>>());

    let mut deepest = inner.substream(Some(1), Some(3)).unwrap();
    assert_eq!(deepest.range(), (16, Some(18)));
    assert_eq!(deepest.read(10, false).unwrap(), vec![16u8, 17]);
}

#[test]
fn substream_reads_like_source() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(TEXT).unwrap();
    let mut backend = SharedStream::new(
        FileStream::open(file.path(), OpenMode::ReadWrite).unwrap(),
    );

    for from in [0u64, 6, 12, 40] {
        let mut sub = backend.substream(Some(from), None).unwrap();
        assert_eq!(sub.position(), 0);
        let n = 5;
        assert_eq!(
            sub.read(n, true).unwrap(),
            backend.read_from(from, n, true).unwrap()
        );
    }
}

#[test]
fn round_trip_on_every_seekable_backend() {
    let file = NamedTempFile::new().unwrap();
    let memory = SharedStream::new(MemoryStream::zeroed(64));
    let disk = SharedStream::new(
        FileStream::open(file.path(), OpenMode::ReadWrite).unwrap(),
    );
    let mut streams: Vec<Box<dyn Stream>> = vec![
        Box::new(MemoryStream::zeroed(64)),
        Box::new(memory.substream(Some(8), Some(40)).unwrap()),
        Box::new(disk.clone()),
        Box::new(disk.substream(Some(0), None).unwrap()),
    ];

    for stream in streams.iter_mut() {
        for p in [0u64, 3, 8] {
            assert_eq!(stream.write_at(p, b"round").unwrap(), 5);
            assert!(stream.seek(p).unwrap());
            assert_eq!(stream.position(), p);
            assert_eq!(stream.read(5, true).unwrap(), b"round".to_vec());
        }
    }
}

#[test]
fn cascading_close() {
    let mut backend = SharedStream::new(MemoryStream::zeroed(32));
    let mut a = backend.substream(Some(0), Some(16)).unwrap();
    let mut b = backend.substream(Some(16), None).unwrap();
    let mut nested = a.substream(Some(4), Some(8)).unwrap();

    // Closing a substream leaves its source and siblings alone.
    a.close().unwrap();
    assert!(!nested.is_open());
    assert!(backend.is_open());
    assert!(b.is_open());
    assert!(matches!(nested.read(1, false), Err(StreamError::NotOpen)));

    backend.close().unwrap();
    backend.close().unwrap();
    assert!(!b.is_open());
    assert!(matches!(b.seek(0), Err(StreamError::NotOpen)));
    assert!(matches!(b.write(b"x"), Err(StreamError::NotOpen)));
    assert!(matches!(b.resize(0), Err(StreamError::NotOpen)));
}

#[test]
fn seek_boundaries() {
    let backend = SharedStream::new(MemoryStream::zeroed(10));
    let mut sub = backend.substream(Some(2), Some(7)).unwrap();
    assert!(sub.seek(5).unwrap());
    assert_eq!(sub.position(), 5);
    assert!(!sub.seek(6).unwrap());
    assert_eq!(sub.position(), 5);
    assert!(sub.seek(0).unwrap());
    assert!(!sub.seek_relative(-1).unwrap());
    assert_eq!(sub.position(), 0);
}

#[test]
fn channel_stream_is_not_seekable() {
    let mut input = ChannelStream::from_reader(Cursor::new(TEXT.to_vec()));
    assert!(input.can_read() && !input.can_seek() && !input.can_write());
    assert!(matches!(
        input.seek(0),
        Err(StreamError::Unsupported { .. })
    ));

    let mut read = Vec::new();
    loop {
        let chunk = input.read(16, false).unwrap();
        if chunk.is_empty() {
            break;
        }
        read.extend(chunk);
    }
    assert_eq!(read, TEXT.to_vec());
    assert_eq!(input.position(), input.length());
    input.close().unwrap();
    input.close().unwrap();
}
