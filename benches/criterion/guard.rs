/// Benchmark the cost of pinning a buffer into a foreign slot.
///
/// With thread pinning every guard spawns, parks and joins an OS thread, and
/// each handshake step is a rendezvous between two threads. Direct pinning is
/// the floor: two pointer writes. The iovec benchmark shows how the cost
/// scales with the number of records, since each record owns its own guard.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ptr_guard::guard::{Builder, Pinning};
use std::ptr;

fn bench_guard(c: &mut Criterion) {
    let mut group = c.benchmark_group("guard");

    for pinning in [Pinning::Thread, Pinning::Direct] {
        let builder = Builder::new().pinning(pinning);
        group.bench_function(BenchmarkId::new("create_release", format!("{:?}", pinning)), |b| {
            let mut slot: *mut libc::c_void = ptr::null_mut();
            b.iter(|| {
                let buf = black_box(vec![0u8; 64]);
                let guard = unsafe { builder.guard(&mut slot, buf) }.unwrap();
                black_box(guard.into_inner().unwrap());
            })
        });
    }

    group.finish();
}

fn bench_iovec(c: &mut Criterion) {
    let mut group = c.benchmark_group("iovec");

    for records in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::new("populate_release", records), &records, |b, &n| {
            let builder = Builder::new();
            b.iter(|| {
                let mut iov = builder.iovec(n).unwrap();
                for i in 0..n {
                    iov.set(i, vec![0u8; 512]).unwrap();
                }
                black_box(iov.into_bufs());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_guard, bench_iovec);
criterion_main!(benches);
