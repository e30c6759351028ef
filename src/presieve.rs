// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Presieving of small prime multiples.
//!
//! Multiples of the primes in [7, limit] repeat with period
//! product(primes) sieve bytes, so they are crossed off once into a
//! template buffer which is then copied into each fresh segment.
//! Sieving proper only has to handle primes above the limit.

use crate::wheel::BIT_VALUES;
use crate::Error;

const PRESIEVE_PRIMES: [u64; 6] = [7, 11, 13, 17, 19, 23];

/// Quotient deltas between consecutive numbers coprime to 30,
/// starting from 7.
const DELTAS: [u64; 8] = [4, 2, 4, 2, 4, 6, 2, 6];

pub struct PreSieve {
    limit: u64,
    // Template of product(primes <= limit) bytes; byte i holds the
    // values 30*i + BIT_VALUES[b] with small multiples cleared.
    template: Vec<u8>,
}

impl PreSieve {
    pub fn new(limit: u64) -> Result<Self, Error> {
        assert!((11..=23).contains(&limit), "presieve limit out of range");
        let product: u64 = PRESIEVE_PRIMES.iter().filter(|&&p| p <= limit).product();
        let size = product as usize;
        let mut template = Vec::new();
        template.try_reserve_exact(size).map_err(|_| Error::OutOfMemory)?;
        template.resize(size, 0xffu8);

        for &p in PRESIEVE_PRIMES.iter().filter(|&&p| p <= limit) {
            // Cross off p*q for q coprime to 30, q >= 7; the prime
            // itself (q = 1) stays set. Each composite position of
            // the template period is visited exactly once.
            let mut q = 7u64;
            let mut d = 0usize;
            loop {
                let m = p * q;
                let byte = ((m - 7) / 30) as usize;
                if byte >= size {
                    break;
                }
                template[byte] &= !(1u8 << bit_of(m % 30));
                q += DELTAS[d];
                d = (d + 1) % 8;
            }
        }
        Ok(PreSieve { limit, template })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Copies the template into `sieve` for the segment starting at
    /// `low` (a multiple of 30), wrapping around the template period.
    pub fn apply(&self, sieve: &mut [u8], low: u64) {
        debug_assert!(low % 30 == 0);
        let size = self.template.len();
        let mut off = ((low / 30) % size as u64) as usize;
        let mut i = 0;
        while i < sieve.len() {
            let n = (size - off).min(sieve.len() - i);
            sieve[i..i + n].copy_from_slice(&self.template[off..off + n]);
            i += n;
            off = 0;
        }
    }
}

fn bit_of(rem: u64) -> u32 {
    BIT_VALUES.iter().position(|&v| v % 30 == rem).unwrap() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template() {
        let ps = PreSieve::new(13).unwrap();
        assert_eq!(ps.template.len(), 7 * 11 * 13);
        // Every bit of the template agrees with trial division,
        // except the presieved primes themselves which stay set.
        for (i, &byte) in ps.template.iter().enumerate() {
            for (b, &v) in BIT_VALUES.iter().enumerate() {
                let n = 30 * i as u64 + v;
                let composite = [7u64, 11, 13].iter().any(|&p| n % p == 0 && n != p);
                assert_eq!(byte & (1 << b) == 0, composite, "n={}", n);
            }
        }
    }

    #[test]
    fn test_apply_wraps() {
        let ps = PreSieve::new(11).unwrap();
        let size = ps.template.len() as u64;
        // A segment starting deep into the period must see the same
        // bits as one starting at the matching offset.
        let mut a = vec![0u8; 64];
        let mut b = vec![0u8; 64];
        ps.apply(&mut a, 30 * (3 * size + 5));
        ps.apply(&mut b, 30 * 5);
        assert_eq!(a, b);
        // Wrap in the middle of a segment.
        let mut c = vec![0u8; 100];
        ps.apply(&mut c, 30 * (size - 3));
        assert_eq!(&c[..3], &ps.template[size as usize - 3..]);
        assert_eq!(&c[3..], &ps.template[..97]);
    }
}
