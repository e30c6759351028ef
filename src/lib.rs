//! eratos is a library for fast generation of prime numbers and
//! prime k-tuplets using a segmented, wheel-factorized sieve of
//! Eratosthenes.
//!
//! Numbers are packed 30 per byte and composites are crossed off by
//! three engines specialized by sieving prime size, fed by a
//! recursive generator for the primes up to sqrt(stop). Intervals
//! above 10^8 numbers can be counted on multiple cores.
//!
//! The free functions mirror a C-style surface and return the
//! sentinel [`PRIMESIEVE_ERROR`] on failure; [`PrimeSieve`] exposes
//! the same operations with `Result`s and configurable
//! [`Preferences`].
//!
//! ```
//! assert_eq!(eratos::count_primes(0, 100), 25);
//! assert_eq!(eratos::nth_prime(25, 0), 97);
//! ```

use std::fmt;
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;

pub mod params;

mod bucket;
mod erat_big;
mod erat_medium;
mod erat_small;
mod finder;
mod generate;
mod nth;
mod parallel;
mod presieve;
mod sieve;
mod wheel;

use finder::{sieve_interval, Mode};

/// Value returned by the sentinel-style functions on any failure.
pub const PRIMESIEVE_ERROR: u64 = u64::MAX;

/// Largest valid stop number: (2^64 - 1) - (2^32 - 1) * 10.
pub fn max_stop() -> u64 {
    params::MAX_STOP
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// stop exceeds max_stop().
    InvalidRange,
    /// nth_prime called with n = 0 or the search left [2, max_stop()].
    InvalidNth,
    /// A sieve buffer or bucket slab could not be allocated.
    OutOfMemory,
    /// The user callback panicked; sieving was abandoned.
    Callback,
    /// Writing to the output sink failed.
    Io,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRange => write!(f, "stop exceeds max_stop()"),
            Error::InvalidNth => write!(f, "no such nth prime"),
            Error::OutOfMemory => write!(f, "out of memory"),
            Error::Callback => write!(f, "user callback panicked"),
            Error::Io => write!(f, "write to output failed"),
        }
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent,
    Info,
    Verbose,
    Debug,
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(Verbosity::Silent),
            "info" => Ok(Verbosity::Info),
            "verbose" => Ok(Verbosity::Verbose),
            "debug" => Ok(Verbosity::Debug),
            _ => Err(format!("invalid verbosity {}", s)),
        }
    }
}

/// User preferences for sieving.
#[derive(Clone, Debug)]
pub struct Preferences {
    /// Segment size in kilobytes, clamped to a power of two in
    /// [1, 8192]. The default fits the L1 data cache.
    pub sieve_size: usize,
    /// Multiples of primes up to this limit (in [11, 23]) are
    /// removed by template copy instead of sieving.
    pub presieve_limit: u64,
    /// Worker threads for the parallel operations, 0 = all cores.
    pub threads: usize,
    pub verbosity: Verbosity,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            sieve_size: params::PRIMESIEVE_SIEVESIZE,
            presieve_limit: params::PRIMESIEVE_PRESIEVE_LIMIT,
            threads: 0,
            verbosity: Verbosity::Silent,
        }
    }
}

impl Preferences {
    pub fn verbose(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }
}

/// A configured sieve. All operations cover the closed interval
/// [start, stop]; tuplet counts are indexed by their smallest
/// member.
#[derive(Clone, Debug, Default)]
pub struct PrimeSieve {
    pub prefs: Preferences,
}

impl PrimeSieve {
    pub fn new() -> PrimeSieve {
        PrimeSieve { prefs: Preferences::default() }
    }

    pub fn with_preferences(prefs: Preferences) -> PrimeSieve {
        PrimeSieve { prefs }
    }

    pub fn count_primes(&self, start: u64, stop: u64) -> Result<u64, Error> {
        sieve_interval(start, stop, &self.prefs, &mut Mode::Count)
    }

    /// Counts k-tuplets for k in 2..=7 (twins through septuplets).
    pub fn count_tuplets(&self, k: usize, start: u64, stop: u64) -> Result<u64, Error> {
        assert!((2..=7).contains(&k), "tuplet size must be in 2..=7");
        sieve_interval(start, stop, &self.prefs, &mut Mode::CountTuplets(k))
    }

    pub fn parallel_count_primes(&self, start: u64, stop: u64, threads: usize) -> Result<u64, Error> {
        parallel::dispatch_count(start, stop, threads, &self.prefs, 1)
    }

    pub fn parallel_count_tuplets(
        &self,
        k: usize,
        start: u64,
        stop: u64,
        threads: usize,
    ) -> Result<u64, Error> {
        assert!((2..=7).contains(&k), "tuplet size must be in 2..=7");
        parallel::dispatch_count(start, stop, threads, &self.prefs, k)
    }

    /// Writes the primes of [start, stop] in decimal, one per line.
    pub fn print_primes_to(&self, start: u64, stop: u64, w: &mut dyn Write) -> Result<(), Error> {
        sieve_interval(start, stop, &self.prefs, &mut Mode::Print(w)).map(|_| ())
    }

    /// Writes k-tuplets as parenthesized lists, one per line.
    pub fn print_tuplets_to(
        &self,
        k: usize,
        start: u64,
        stop: u64,
        w: &mut dyn Write,
    ) -> Result<(), Error> {
        assert!((2..=7).contains(&k), "tuplet size must be in 2..=7");
        sieve_interval(start, stop, &self.prefs, &mut Mode::PrintTuplets(k, w)).map(|_| ())
    }

    /// Calls `f` for every prime of [start, stop] in ascending
    /// order. A panic in `f` aborts sieving and returns
    /// [`Error::Callback`].
    pub fn callback_primes(
        &self,
        start: u64,
        stop: u64,
        mut f: impl FnMut(u64),
    ) -> Result<(), Error> {
        catch_unwind(AssertUnwindSafe(|| {
            sieve_interval(start, stop, &self.prefs, &mut Mode::Callback(&mut f))
        }))
        .map_err(|_| Error::Callback)?
        .map(|_| ())
    }

    /// Calls `f(prime, thread_id)` from multiple workers. Primes are
    /// not delivered in arithmetic order across workers; `f` must be
    /// thread-safe.
    pub fn parallel_callback_primes(
        &self,
        start: u64,
        stop: u64,
        f: impl Fn(u64, usize) + Sync,
        threads: usize,
    ) -> Result<(), Error> {
        catch_unwind(AssertUnwindSafe(|| {
            parallel::dispatch_callback(start, stop, threads, &self.prefs, &f)
        }))
        .map_err(|_| Error::Callback)?
    }

    /// Returns the n-th prime after `start` (before it for n < 0).
    pub fn nth_prime(&self, n: i64, start: u64) -> Result<u64, Error> {
        nth::nth_prime(n, start, &self.prefs, 1)
    }

    pub fn parallel_nth_prime(&self, n: i64, start: u64, threads: usize) -> Result<u64, Error> {
        nth::nth_prime(n, start, &self.prefs, threads)
    }
}

fn count_or_sentinel(r: Result<u64, Error>) -> u64 {
    r.unwrap_or(PRIMESIEVE_ERROR)
}

/// Counts the primes within [start, stop].
pub fn count_primes(start: u64, stop: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().count_primes(start, stop))
}

/// Counts the twin primes (p, p+2) within [start, stop].
pub fn count_twins(start: u64, stop: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().count_tuplets(2, start, stop))
}

/// Counts the prime triplets within [start, stop].
pub fn count_triplets(start: u64, stop: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().count_tuplets(3, start, stop))
}

/// Counts the prime quadruplets within [start, stop].
pub fn count_quadruplets(start: u64, stop: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().count_tuplets(4, start, stop))
}

/// Counts the prime quintuplets within [start, stop].
pub fn count_quintuplets(start: u64, stop: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().count_tuplets(5, start, stop))
}

/// Counts the prime sextuplets within [start, stop].
pub fn count_sextuplets(start: u64, stop: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().count_tuplets(6, start, stop))
}

/// Counts the prime septuplets within [start, stop].
pub fn count_septuplets(start: u64, stop: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().count_tuplets(7, start, stop))
}

/// Counts primes on up to `threads` cores (0 = all).
pub fn parallel_count_primes(start: u64, stop: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_count_primes(start, stop, threads))
}

pub fn parallel_count_twins(start: u64, stop: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_count_tuplets(2, start, stop, threads))
}

pub fn parallel_count_triplets(start: u64, stop: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_count_tuplets(3, start, stop, threads))
}

pub fn parallel_count_quadruplets(start: u64, stop: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_count_tuplets(4, start, stop, threads))
}

pub fn parallel_count_quintuplets(start: u64, stop: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_count_tuplets(5, start, stop, threads))
}

pub fn parallel_count_sextuplets(start: u64, stop: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_count_tuplets(6, start, stop, threads))
}

pub fn parallel_count_septuplets(start: u64, stop: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_count_tuplets(7, start, stop, threads))
}

fn print_k(k: usize, start: u64, stop: u64) {
    let stdout = std::io::stdout();
    let mut w = std::io::BufWriter::new(stdout.lock());
    let sieve = PrimeSieve::new();
    let _ = if k == 1 {
        sieve.print_primes_to(start, stop, &mut w)
    } else {
        sieve.print_tuplets_to(k, start, stop, &mut w)
    };
    let _ = w.flush();
}

/// Prints the primes within [start, stop] to standard output.
pub fn print_primes(start: u64, stop: u64) {
    print_k(1, start, stop)
}

/// Prints the twin primes within [start, stop] to standard output.
pub fn print_twins(start: u64, stop: u64) {
    print_k(2, start, stop)
}

pub fn print_triplets(start: u64, stop: u64) {
    print_k(3, start, stop)
}

pub fn print_quadruplets(start: u64, stop: u64) {
    print_k(4, start, stop)
}

pub fn print_quintuplets(start: u64, stop: u64) {
    print_k(5, start, stop)
}

pub fn print_sextuplets(start: u64, stop: u64) {
    print_k(6, start, stop)
}

pub fn print_septuplets(start: u64, stop: u64) {
    print_k(7, start, stop)
}

// Printed output must come out in arithmetic order, so the parallel
// print variants delegate to the serial ones.

pub fn parallel_print_primes(start: u64, stop: u64, _threads: usize) {
    print_primes(start, stop)
}

pub fn parallel_print_twins(start: u64, stop: u64, _threads: usize) {
    print_twins(start, stop)
}

pub fn parallel_print_triplets(start: u64, stop: u64, _threads: usize) {
    print_triplets(start, stop)
}

pub fn parallel_print_quadruplets(start: u64, stop: u64, _threads: usize) {
    print_quadruplets(start, stop)
}

pub fn parallel_print_quintuplets(start: u64, stop: u64, _threads: usize) {
    print_quintuplets(start, stop)
}

pub fn parallel_print_sextuplets(start: u64, stop: u64, _threads: usize) {
    print_sextuplets(start, stop)
}

pub fn parallel_print_septuplets(start: u64, stop: u64, _threads: usize) {
    print_septuplets(start, stop)
}

/// Calls `f` for every prime of [start, stop] in ascending order.
pub fn callback_primes(start: u64, stop: u64, f: impl FnMut(u64)) {
    let _ = PrimeSieve::new().callback_primes(start, stop, f);
}

/// Calls `f(prime, thread_id)` for every prime of [start, stop]
/// from multiple workers, in arbitrary cross-thread order.
pub fn parallel_callback_primes(
    start: u64,
    stop: u64,
    f: impl Fn(u64, usize) + Sync,
    threads: usize,
) {
    let _ = PrimeSieve::new().parallel_callback_primes(start, stop, f, threads);
}

/// Finds the n-th prime after `start` (before it for n < 0).
pub fn nth_prime(n: i64, start: u64) -> u64 {
    count_or_sentinel(PrimeSieve::new().nth_prime(n, start))
}

pub fn parallel_nth_prime(n: i64, start: u64, threads: usize) -> u64 {
    count_or_sentinel(PrimeSieve::new().parallel_nth_prime(n, start, threads))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_reference_counts() {
        assert_eq!(count_primes(0, 10), 4);
        assert_eq!(count_primes(1, 100), 25);
        assert_eq!(count_primes(0, 1000), 168);
        assert_eq!(count_primes(0, 1_000_000), 78498);
    }

    #[test]
    fn test_tuplet_counts() {
        assert_eq!(count_twins(1, 1_000_000), 8169);
        // Sextuplets up to 10^6: 7, 97, 16057, 19417, 43777.
        assert_eq!(count_sextuplets(1, 1_000_000), 5);
        assert_eq!(count_septuplets(1, 100_000), 1);
        // (5, 7, 11, 13) and (11, 13, 17, 19).
        assert_eq!(count_quadruplets(1, 100), 2);
    }

    #[test]
    fn test_additivity() {
        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            let a = rng.gen_range(0u64..1_000_000);
            let c = rng.gen_range(a + 2..2_000_000);
            let b = rng.gen_range(a..c);
            assert_eq!(
                count_primes(a, c),
                count_primes(a, b) + count_primes(b + 1, c),
                "a={} b={} c={}",
                a,
                b,
                c
            );
        }
    }

    #[test]
    fn test_segment_size_invariance() {
        let reference = PrimeSieve::new().count_primes(999_000_000, 1_001_000_000).unwrap();
        for kb in [1usize, 4, 32, 256, 8192] {
            let mut prefs = Preferences::default();
            prefs.sieve_size = kb;
            let sieve = PrimeSieve::with_preferences(prefs);
            assert_eq!(sieve.count_primes(0, 1_000_000).unwrap(), 78498, "{}K", kb);
            assert_eq!(
                sieve.count_primes(999_000_000, 1_001_000_000).unwrap(),
                reference,
                "{}K",
                kb
            );
        }
    }

    #[test]
    fn test_presieve_invariance() {
        for limit in [11u64, 13, 19, 23] {
            let mut prefs = Preferences::default();
            prefs.presieve_limit = limit;
            let sieve = PrimeSieve::with_preferences(prefs);
            assert_eq!(sieve.count_primes(0, 1_000_000).unwrap(), 78498, "limit {}", limit);
            assert_eq!(sieve.count_tuplets(2, 0, 1_000_000).unwrap(), 8169, "limit {}", limit);
        }
    }

    #[test]
    fn test_callback_completeness() {
        let mut serial = vec![];
        callback_primes(0, 500_000, |p| serial.push(p));
        assert!(serial.windows(2).all(|w| w[0] < w[1]));
        let parallel = std::sync::Mutex::new(vec![]);
        parallel_callback_primes(0, 500_000, |p, _| parallel.lock().unwrap().push(p), 4);
        let mut parallel = parallel.into_inner().unwrap();
        parallel.sort();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_callback_panic() {
        let sieve = PrimeSieve::new();
        let r = sieve.callback_primes(0, 1000, |p| {
            if p > 100 {
                panic!("user bug");
            }
        });
        assert_eq!(r, Err(Error::Callback));
    }

    #[test]
    fn test_nth_prime_literals() {
        assert_eq!(nth_prime(1, 0), 2);
        assert_eq!(nth_prime(25, 0), 97);
        assert_eq!(nth_prime(1_000_000, 0), 15_485_863);
        assert_eq!(nth_prime(0, 0), PRIMESIEVE_ERROR);
    }

    #[test]
    fn test_sentinel_and_max_stop() {
        assert_eq!(max_stop(), 18446744030759878665);
        assert_eq!(count_primes(0, u64::MAX), PRIMESIEVE_ERROR);
        assert_eq!(parallel_count_twins(0, u64::MAX, 4), PRIMESIEVE_ERROR);
        // Empty ranges count zero.
        assert_eq!(count_primes(100, 10), 0);
        assert_eq!(count_primes(20, 22), 0);
    }

    #[test]
    fn test_print_output() {
        let sieve = PrimeSieve::new();
        let mut out = Vec::new();
        sieve.print_primes_to(90, 110, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "97\n101\n103\n107\n109\n");
        let mut out = Vec::new();
        sieve.print_tuplets_to(2, 1, 31, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "(3, 5)\n(5, 7)\n(11, 13)\n(17, 19)\n(29, 31)\n"
        );
    }

    // The remaining reference values need optimized builds to finish
    // in reasonable time: run with
    // cargo test --release -- --ignored

    #[test]
    #[ignore]
    fn test_count_1e9() {
        assert_eq!(count_primes(0, 1_000_000_000), 50_847_534);
        assert_eq!(count_sextuplets(1, 1_000_000_000), 1259);
    }

    #[test]
    #[ignore]
    fn test_count_beyond_1e12() {
        let c = parallel_count_primes(1_000_000_000_000, 1_001_000_000_000, 0);
        assert_eq!(c, 36_190_991);
    }

    #[test]
    #[ignore]
    fn test_nth_prime_1e7() {
        assert_eq!(nth_prime(10_000_000, 0), 179_424_673);
        assert_eq!(count_primes(0, 179_424_673), 10_000_000);
    }
}
