use ptr_guard::guard::{Builder, Pinning};
use ptr_guard::{Error, Iovec};

use std::thread;

#[test]
fn three_buffers() {
    let bufs = [vec![1u8; 10], vec![2u8; 64], vec![3u8; 15]];
    let addrs: Vec<*const u8> = bufs.iter().map(|b| b.as_ptr()).collect();

    let mut iov = Iovec::new(3).unwrap();
    for (i, buf) in bufs.into_iter().enumerate() {
        iov.set(i, buf).unwrap();
    }
    assert_eq!(iov.len(), 3);
    assert_eq!(iov.populated(), 3);

    // Read the records back through the raw pointer, as foreign code would.
    let records = unsafe { std::slice::from_raw_parts(iov.as_ptr(), 3) };
    let lens: Vec<usize> = records.iter().map(|r| r.iov_len).collect();
    let bases: Vec<*const u8> = records.iter().map(|r| r.iov_base as *const u8).collect();
    assert_eq!(lens, [10, 64, 15]);
    assert_eq!(bases, addrs);
    assert!(bases.iter().all(|b| !b.is_null()));

    iov.release();
    assert!(iov.is_released());
    assert!(iov.as_ptr().is_null());
    assert_eq!(iov.guards().count(), 3);
    assert!(iov.guards().all(|g| g.is_released()));

    // Releasing again has no effect.
    iov.release();
    let bufs = iov.into_bufs();
    assert_eq!(bufs.iter().map(Vec::len).collect::<Vec<_>>(), [10, 64, 15]);
}

#[test]
fn boxed_slices_map_whole_slice() {
    let bufs: Vec<Box<[u8]>> = vec![
        vec![7u8; 12].into_boxed_slice(),
        vec![8u8; 3].into_boxed_slice(),
    ];
    let addrs: Vec<*const u8> = bufs.iter().map(|b| b.as_ptr()).collect();

    let iov = Iovec::from_bufs(bufs).unwrap();
    let records = iov.iovecs();
    assert_eq!(records[0].iov_base as *const u8, addrs[0]);
    assert_eq!(records[0].iov_len, 12);
    assert_eq!(records[1].iov_base as *const u8, addrs[1]);
    assert_eq!(records[1].iov_len, 3);

    let bufs = iov.into_bufs();
    assert_eq!(bufs[0].as_ptr(), addrs[0]);
    assert_eq!(&bufs[1][..], [8u8; 3]);
}

#[test]
fn from_bufs_in_order() {
    let bufs: Vec<&'static str> = vec!["alpha", "beta", "gamma", "delta"];
    let iov = Iovec::from_bufs(bufs.clone()).unwrap();

    for (record, buf) in iov.iovecs().iter().zip(&bufs) {
        assert_eq!(record.iov_base as *const u8, buf.as_ptr());
        assert_eq!(record.iov_len, buf.len());
    }
    assert_eq!(iov.into_bufs(), bufs);
}

#[test]
fn from_bufs_rejects_empty_buffer() {
    let err = Iovec::from_bufs(vec![b"ok".to_vec(), Vec::new()]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { name: "buf", .. }));
}

#[test]
fn io_error_conversion() {
    let mut iov = Iovec::new(1).unwrap();
    let err: std::io::Error = iov.set(5, vec![1u8]).unwrap_err().into();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn capacity_overflow_is_allocation_error() {
    let res = Iovec::<Vec<u8>>::new(usize::MAX / 2);
    assert!(matches!(res, Err(Error::Allocation { .. })));
}

#[test]
fn sparse_population() {
    let mut iov = Iovec::new(5).unwrap();
    iov.set(1, b"one".to_vec()).unwrap();
    iov.set(3, b"three".to_vec()).unwrap();

    let records = iov.iovecs();
    assert!(records[0].iov_base.is_null());
    assert_eq!(records[1].iov_len, 3);
    assert!(records[2].iov_base.is_null());
    assert_eq!(records[3].iov_len, 5);
    assert_eq!(records[4].iov_len, 0);
    assert_eq!(iov.populated(), 2);

    let slots = iov.into_slots();
    assert_eq!(slots.len(), 5);
    assert_eq!(slots[3].as_deref(), Some(&b"three"[..]));
}

#[test]
fn moves_to_another_thread() {
    let builder = Builder::new().pinning(Pinning::Thread).thread_name("iov");
    let mut iov = builder.iovec(2).unwrap();
    iov.set(0, b"sent".to_vec()).unwrap();
    iov.set(1, b"across".to_vec()).unwrap();

    let bufs = thread::spawn(move || iov.into_bufs()).join().unwrap();
    assert_eq!(bufs, [b"sent".to_vec(), b"across".to_vec()]);
}

#[test]
fn debug_output() {
    let iov: Iovec<Vec<u8>> = Iovec::new(2).unwrap();
    let s = format!("{:?}", iov);
    assert!(s.contains("length: 2"));
    assert!(s.contains("populated: 0"));
}
