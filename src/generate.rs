// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Generation of sieving primes.
//!
//! The outer sieve needs every prime up to sqrt(stop). Those are
//! produced by a second, smaller wheel sieve over [7, sqrt(stop)]
//! whose own sieving primes (up to sqrt(sqrt(stop)) <= 2^16) come
//! from a plain odd-number sieve, closing the recursion. Primes are
//! extracted segment by segment and handed out in ascending order,
//! so the caller can install them lazily as their squares come into
//! range.

use crate::params::{generator_bytes, GENERATOR_PRESIEVE_LIMIT};
use crate::sieve::{for_each_prime, Erat};
use crate::Error;

/// Simple sieve of the primes up to `limit` (inclusive).
pub fn small_primes(limit: u64) -> Vec<u64> {
    let mut primes = vec![];
    if limit >= 2 {
        primes.push(2);
    }
    // sieve[i] says that 2i+1 is composite.
    let size = (limit as usize + 1) / 2;
    let mut sieve = vec![false; size];
    for i in 1..size {
        if !sieve[i] {
            let p = 2 * i + 1;
            primes.push(p as u64);
            // First odd multiple not yet crossed is p*p.
            let mut k = 2 * i * (i + 1);
            while k < size {
                sieve[k] = true;
                k += p;
            }
        }
    }
    primes
}

/// Ascending stream of the primes in [7, stop], used to feed an
/// outer sieve with sieving primes.
pub struct SievingPrimes {
    erat: Erat,
    buffer: Vec<u64>,
    pos: usize,
}

impl SievingPrimes {
    pub fn new(stop: u64) -> Result<SievingPrimes, Error> {
        let mut erat = Erat::new(7, stop, generator_bytes(stop), GENERATOR_PRESIEVE_LIMIT)?;
        for p in small_primes(num_integer::sqrt(stop)) {
            if p > erat.presieve_limit() {
                erat.add_sieving_prime(p)?;
            }
        }
        Ok(SievingPrimes { erat, buffer: vec![], pos: 0 })
    }

    pub fn next_prime(&mut self) -> Result<Option<u64>, Error> {
        while self.pos == self.buffer.len() {
            self.buffer.clear();
            self.pos = 0;
            match self.erat.next_segment()? {
                None => return Ok(None),
                Some((seg, low)) => {
                    let buffer = &mut self.buffer;
                    for_each_prime(seg, low, &mut |p| buffer.push(p));
                }
            }
        }
        let p = self.buffer[self.pos];
        self.pos += 1;
        Ok(Some(p))
    }
}
