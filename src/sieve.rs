// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Segmented sieve of Eratosthenes driver.
//!
//! The sieve walks [start, stop] in cache-sized segments of `bytes`
//! bytes, 30 numbers per byte. Each segment starts as a copy of the
//! presieve template, the three cross-off engines then clear the
//! remaining composites, and the finished segment is handed to the
//! caller. Sieving primes are classified by their ratio to the
//! segment size: small primes hit many times per segment, medium
//! primes a few times, big primes less than once (those go through
//! the bucket ring).
//!
//! The numbers 2, 3, 5 have no bit in the wheel layout; consumers
//! emit them separately. The first segment masks the bits below
//! `start`, the last segment the bits above `stop`.

use crate::erat_big::EratBig;
use crate::erat_medium::EratMedium;
use crate::erat_small::EratSmall;
use crate::params::{ERATMEDIUM_FACTOR, ERATSMALL_FACTOR};
use crate::presieve::PreSieve;
use crate::wheel::{BIT_VALUES, BIT_VALUES_32};
use crate::Error;

pub struct Erat {
    start: u64,
    stop: u64,
    bytes: usize,
    // Byte offsets of the next and of the last segment.
    low: u64,
    bytes_left: u64,
    first: bool,
    sieve: Vec<u8>,
    presieve: PreSieve,
    small: EratSmall,
    medium: EratMedium,
    big: EratBig,
    // Classification thresholds on p / 30.
    small_limit: u64,
    medium_limit: u64,
}

impl Erat {
    /// Prepares a sieve of [start, stop] with the given segment size
    /// in bytes (a power of two) and presieve limit. Sieving primes
    /// must be installed by the caller with `add_sieving_prime`
    /// before the segment containing their square is requested.
    pub fn new(start: u64, stop: u64, bytes: usize, presieve_limit: u64) -> Result<Erat, Error> {
        assert!(bytes.is_power_of_two());
        let start_eff = start.max(7);
        // Align the first segment so that start is representable:
        // byte 0 holds low + 7 .. low + 31.
        let low = if stop >= 7 { (start_eff - 7) / 30 * 30 } else { 0 };
        let bytes_left = if stop >= start_eff { (stop - 7 - low) / 30 + 1 } else { 0 };
        let mut sieve = Vec::new();
        sieve.try_reserve_exact(bytes).map_err(|_| Error::OutOfMemory)?;
        sieve.resize(bytes, 0);
        let sqrt_stop = num_integer::sqrt(stop);
        Ok(Erat {
            start,
            stop,
            bytes,
            low,
            bytes_left,
            first: true,
            sieve,
            presieve: PreSieve::new(presieve_limit)?,
            small: EratSmall::new(),
            medium: EratMedium::new(),
            big: EratBig::new(bytes, sqrt_stop),
            small_limit: (bytes as f64 * ERATSMALL_FACTOR) as u64,
            medium_limit: (bytes * ERATMEDIUM_FACTOR) as u64,
        })
    }

    pub fn presieve_limit(&self) -> u64 {
        self.presieve.limit()
    }

    /// Largest value covered by the next segment.
    pub fn segment_high(&self) -> u64 {
        let span = 30 * (self.bytes as u64).min(self.bytes_left);
        (self.low + span + 1).min(self.stop)
    }

    pub fn finished(&self) -> bool {
        self.bytes_left == 0
    }

    /// Files a sieving prime with the engine matching its size.
    /// Primes at or below the presieve limit must not be added.
    pub fn add_sieving_prime(&mut self, p: u64) -> Result<(), Error> {
        debug_assert!(p > self.presieve.limit());
        let s = p / 30;
        if s <= self.small_limit {
            self.small.add(p, self.low, self.stop);
        } else if s <= self.medium_limit {
            self.medium.add(p, self.low, self.stop);
        } else {
            self.big.add(p, self.low, self.stop)?;
        }
        Ok(())
    }

    /// Sieves the next segment and returns its bytes and low offset,
    /// or None once stop has been passed.
    pub fn next_segment(&mut self) -> Result<Option<(&[u8], u64)>, Error> {
        if self.bytes_left == 0 {
            return Ok(None);
        }
        let used = (self.bytes as u64).min(self.bytes_left) as usize;
        let low = self.low;
        self.presieve.apply(&mut self.sieve, low);
        if self.first {
            self.first = false;
            let start = self.start.max(7);
            // Only byte 0 can hold values below start.
            for (b, &v) in BIT_VALUES.iter().enumerate() {
                if low + v < start {
                    self.sieve[0] &= !(1u8 << b);
                }
            }
        }
        self.small.cross_off(&mut self.sieve);
        self.medium.cross_off(&mut self.sieve);
        self.big.cross_off(&mut self.sieve)?;
        if used < self.bytes || self.bytes_left <= self.bytes as u64 {
            // Last segment: clear everything above stop.
            let last = used - 1;
            for (b, &v) in BIT_VALUES.iter().enumerate() {
                if low + 30 * last as u64 + v > self.stop {
                    self.sieve[last] &= !(1u8 << b);
                }
            }
        }
        self.low += 30 * self.bytes as u64;
        self.bytes_left -= used as u64;
        Ok(Some((&self.sieve[..used], low)))
    }
}

/// Calls `f` for every prime left in a sieved segment, in order.
/// The segment is scanned one u32 word at a time with a bit scan,
/// clearing each bit as it is consumed.
pub fn for_each_prime(segment: &[u8], low: u64, f: &mut impl FnMut(u64)) {
    let mut chunks = segment.chunks_exact(4);
    let mut base = low;
    for chunk in &mut chunks {
        let mut word = u32::from_le_bytes(chunk.try_into().unwrap());
        while word != 0 {
            let bit = word.trailing_zeros();
            f(base + BIT_VALUES_32[bit as usize]);
            word &= word - 1;
        }
        base += 30 * 4;
    }
    for &byte in chunks.remainder() {
        let mut byte = byte;
        while byte != 0 {
            let bit = byte.trailing_zeros();
            f(base + BIT_VALUES[bit as usize]);
            byte &= byte - 1;
        }
        base += 30;
    }
}

/// Number of bits set in a sieved segment.
pub fn count_bits(segment: &[u8]) -> u64 {
    let chunks = segment.chunks_exact(8);
    let tail = chunks.remainder();
    let mut count: u64 = chunks
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()).count_ones() as u64)
        .sum();
    for &b in tail {
        count += b.count_ones() as u64;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::small_primes;

    // Reference sieve driven without a generator: install all
    // sieving primes up front from the plain small sieve.
    fn primes_between(start: u64, stop: u64) -> Vec<u64> {
        let mut erat = Erat::new(start, stop, 1024, 13).unwrap();
        for p in small_primes(num_integer::sqrt(stop)) {
            if p > erat.presieve_limit() {
                erat.add_sieving_prime(p).unwrap();
            }
        }
        let mut primes = vec![];
        for p in [2u64, 3, 5] {
            if start <= p && p <= stop {
                primes.push(p);
            }
        }
        while let Some((seg, low)) = erat.next_segment().unwrap() {
            for_each_prime(seg, low, &mut |p| primes.push(p));
        }
        primes
    }

    #[test]
    fn test_small_ranges() {
        let reference = small_primes(20_000);
        for (start, stop) in [(0u64, 20_000u64), (1, 100), (90, 120), (7, 7), (8, 10), (0, 1)] {
            let expect: Vec<u64> =
                reference.iter().copied().filter(|&p| start <= p && p <= stop).collect();
            assert_eq!(primes_between(start, stop), expect, "[{}, {}]", start, stop);
        }
    }

    #[test]
    fn test_segment_boundaries() {
        // Boundaries falling on and around wheel bytes.
        let reference = small_primes(200_000);
        for (start, stop) in [(29u64, 31u64), (30, 30), (31, 37), (113, 127), (100_003, 100_019)] {
            let expect: Vec<u64> =
                reference.iter().copied().filter(|&p| start <= p && p <= stop).collect();
            assert_eq!(primes_between(start, stop), expect, "[{}, {}]", start, stop);
        }
    }

    #[test]
    fn test_count_matches_enumeration() {
        let mut erat = Erat::new(0, 100_000, 2048, 19).unwrap();
        for p in small_primes(317) {
            if p > 19 {
                erat.add_sieving_prime(p).unwrap();
            }
        }
        let mut count = 3; // 2, 3, 5
        let mut listed = 3;
        while let Some((seg, low)) = erat.next_segment().unwrap() {
            count += count_bits(seg);
            let mut n = 0;
            for_each_prime(seg, low, &mut |_| n += 1);
            listed += n;
        }
        assert_eq!(count, 9592); // pi(10^5)
        assert_eq!(listed, 9592);
    }
}
