//! Tunable constants of the sieve.
//!
//! The defaults are sized for a CPU with 32 kilobytes of L1 data
//! cache per core; the segment size and the EratSmall/EratMedium
//! factors are the main knobs worth adjusting for other hardware.

/// L1 data cache size per core in kilobytes.
pub const L1_DCACHE_SIZE: usize = 32;

/// Default segment size in kilobytes; requests are clamped to a
/// power of two in [1, 8192].
pub const PRIMESIEVE_SIEVESIZE: usize = L1_DCACHE_SIZE;

/// Multiples of primes up to this limit are crossed off by copying
/// a precomputed template into each segment rather than by sieving.
/// Limit 19 uses a 315.7 kilobyte template; 13 uses 1001 bytes.
pub const PRIMESIEVE_PRESIEVE_LIMIT: u64 = 19;

/// Presieve limit of the sieving prime generator; a larger value
/// uses more memory without noticeable speed up.
pub const GENERATOR_PRESIEVE_LIMIT: u64 = 13;

/// Each worker thread sieves at least an interval of this size.
pub const MIN_THREAD_INTERVAL: u64 = 100_000_000;

/// Sieving primes with p/30 <= segment bytes * ERATSMALL_FACTOR
/// cross off several times per segment and go to EratSmall.
pub const ERATSMALL_FACTOR: f64 = 1.5;

/// Sieving primes with p/30 <= segment bytes * ERATMEDIUM_FACTOR
/// (and above the EratSmall limit) go to EratMedium, the rest to
/// EratBig. 9 is tuned for commodity DDR memory.
pub const ERATMEDIUM_FACTOR: usize = 9;

/// WheelPrimes per bucket in EratBig.
pub const ERATBIG_BUCKETSIZE: usize = 1 << 10;

/// EratBig grows its arena by slabs of this many bytes to keep
/// allocator traffic low.
pub const ERATBIG_MEMORY_PER_ALLOC: usize = (1 << 20) * 4;

/// Largest supported stop: (2^64 - 1) - (2^32 - 1) * 10.
///
/// Sieving primes are below 2^32 and the wheel advances a multiple
/// by at most 10 * p, so this bound keeps all multiple arithmetic
/// inside u64.
pub const MAX_STOP: u64 = u64::MAX - (u32::MAX as u64) * 10;

/// Clamp a segment size request (in kilobytes) to a power of two
/// in [1, 8192] and return it in bytes.
pub fn segment_bytes(kilobytes: usize) -> usize {
    let kb = kilobytes.clamp(1, 8192).next_power_of_two().min(8192);
    kb * 1024
}

/// Segment size used by the sieving prime generator.
pub fn generator_bytes(stop: u64) -> usize {
    // The generator covers [7, isqrt(stop)]; below ~2 million a full
    // L1 segment is overkill and a smaller one keeps startup cheap.
    let bytes = segment_bytes(PRIMESIEVE_SIEVESIZE);
    let span = (stop / 30 + 1) as usize;
    if span < bytes {
        segment_bytes(span.div_ceil(1024).max(1))
    } else {
        bytes
    }
}

#[test]
fn test_segment_bytes() {
    assert_eq!(segment_bytes(32), 32 * 1024);
    assert_eq!(segment_bytes(0), 1024);
    assert_eq!(segment_bytes(33), 64 * 1024);
    assert_eq!(segment_bytes(1 << 20), 8192 * 1024);
}

#[test]
fn test_max_stop() {
    assert_eq!(MAX_STOP, 18446744030759878665);
}
