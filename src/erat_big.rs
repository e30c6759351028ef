// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Cross-off engine for big sieving primes.
//!
//! A big prime hits at most once per segment, so scanning a flat
//! list would waste almost every lookup. Instead the records are
//! kept in a ring of bucket lists indexed by the segment of their
//! next multiple: crossing off a segment only touches the list at
//! the current ring slot, and each record is re-filed into the slot
//! of its following multiple. Bucket memory comes from the slab
//! arena and emptied buckets are recycled immediately.

use crate::bucket::{Arena, NIL};
use crate::wheel::{first_multiple, WheelPrime, INIT210, WHEEL210};
use crate::Error;

pub struct EratBig {
    arena: Arena,
    // Ring of bucket list heads, one slot per future segment.
    lists: Vec<u32>,
    cur: usize,
    log2_bytes: u32,
    byte_mask: u64,
    slot_mask: usize,
}

impl EratBig {
    pub fn new(bytes: usize, sqrt_stop: u64) -> Self {
        assert!(bytes.is_power_of_two());
        let max_prime = sqrt_stop / 30 + 1;
        // The first multiple of a freshly added prime lies at most
        // ~11p/30 bytes ahead, a wheel step moves at most 10*p/30 + 9
        // bytes; size the ring to cover whichever is larger.
        let max_dist = 11 * max_prime as usize + 12 + bytes;
        let slots = (max_dist / bytes + 2).next_power_of_two();
        EratBig {
            arena: Arena::new(),
            lists: vec![NIL; slots],
            cur: 0,
            log2_bytes: bytes.trailing_zeros(),
            byte_mask: bytes as u64 - 1,
            slot_mask: slots - 1,
        }
    }

    pub fn add(&mut self, p: u64, low: u64, stop: u64) -> Result<(), Error> {
        if let Some((idx, wi)) = first_multiple(p, low, stop, &INIT210) {
            let wp = WheelPrime {
                prime: (p / 30) as u32,
                idx: (idx & self.byte_mask) as u32,
                wi,
            };
            let slot = (self.cur + (idx >> self.log2_bytes) as usize) & self.slot_mask;
            self.lists[slot] = self.arena.push(self.lists[slot], wp)?;
        }
        Ok(())
    }

    pub fn cross_off(&mut self, sieve: &mut [u8]) -> Result<(), Error> {
        debug_assert_eq!(sieve.len(), 1 << self.log2_bytes);
        let mut b = self.lists[self.cur];
        self.lists[self.cur] = NIL;
        while b != NIL {
            let next = self.arena.next(b);
            for i in 0..self.arena.len(b) {
                let mut wp = self.arena.get(b, i);
                let e = &WHEEL210[wp.wi as usize];
                sieve[wp.idx as usize] &= e.unset_bit;
                // A big prime advances past the segment end, into a
                // future ring slot.
                let idx = wp.idx as u64
                    + wp.prime as u64 * e.next_factor as u64
                    + e.correct as u64;
                wp.idx = (idx & self.byte_mask) as u32;
                wp.wi = (wp.wi as i32 + e.next as i32) as u16;
                let slot = (self.cur + (idx >> self.log2_bytes) as usize) & self.slot_mask;
                debug_assert_ne!(slot, self.cur);
                self.lists[slot] = self.arena.push(self.lists[slot], wp)?;
            }
            self.arena.free(b);
            b = next;
        }
        self.cur = (self.cur + 1) & self.slot_mask;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erat_medium::EratMedium;

    #[test]
    fn test_agrees_with_medium() {
        // Both engines run the same modulo 210 wheel; the ring only
        // changes the order of work. 1024-byte segments high above
        // the squares of these primes make every one of them "big".
        let bytes = 1024usize;
        let segments = 64usize;
        let low = 12_000_000_000u64;
        let stop = low + 30 * (bytes * segments) as u64 + 6;
        let primes = [49999u64, 65537, 99991, 104729];
        let mut big = EratBig::new(bytes, 104729);
        let mut medium = EratMedium::new();
        for &p in &primes {
            big.add(p, low, stop).unwrap();
            medium.add(p, low, stop);
        }
        let mut crossed = 0usize;
        for seg in 0..segments {
            let mut a = vec![0xffu8; bytes];
            big.cross_off(&mut a).unwrap();
            let mut b = vec![0xffu8; bytes];
            medium.cross_off(&mut b);
            assert_eq!(a, b, "segment {}", seg);
            crossed += a.iter().filter(|&&x| x != 0xff).count();
        }
        // Multiples of all four primes fall in the window.
        assert!(crossed > 10, "only {} bytes crossed", crossed);
    }
}
