// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Cross-off engine for small sieving primes.
//!
//! Small primes hit a segment many times, so the inner loop is the
//! hottest spot of the whole sieve. For each prime the 8 (mask, byte
//! stride) pairs of a full wheel rotation are hoisted into locals and
//! applied as straight-line code, which removes the wheel table
//! lookup from all but the trailing iterations.

use crate::wheel::{first_multiple, WheelPrime, CLASSES, INIT30, WHEEL30};

pub struct EratSmall {
    primes: Vec<WheelPrime>,
}

impl EratSmall {
    pub fn new() -> Self {
        EratSmall { primes: vec![] }
    }

    pub fn add(&mut self, p: u64, low: u64, stop: u64) {
        if let Some((idx, wi)) = first_multiple(p, low, stop, &INIT30) {
            self.primes.push(WheelPrime { prime: (p / 30) as u32, idx: idx as u32, wi });
        }
    }

    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let bytes = sieve.len();
        for wp in &mut self.primes {
            let s = wp.prime as usize;
            let mut idx = wp.idx as usize;
            let mut wi = wp.wi as usize;
            // A full rotation advances the multiple by 30*p, i.e. by
            // p bytes, whatever the current phase.
            let rotation = 30 * s + CLASSES[wi / 8] as usize;
            let mut masks = [0u8; 8];
            let mut strides = [0usize; 8];
            let mut w = wi;
            for k in 0..8 {
                let e = &WHEEL30[w];
                masks[k] = e.unset_bit;
                strides[k] = s * e.next_factor as usize + e.correct as usize;
                w = (w as i32 + e.next as i32) as usize;
            }
            debug_assert_eq!(w, wi);
            debug_assert_eq!(strides.iter().sum::<usize>(), rotation);

            while idx + rotation < bytes {
                // All 8 writes stay below idx + rotation.
                unsafe {
                    for k in 0..8 {
                        *sieve.get_unchecked_mut(idx) &= masks[k];
                        idx += strides[k];
                    }
                }
            }
            while idx < bytes {
                let e = &WHEEL30[wi];
                sieve[idx] &= e.unset_bit;
                idx += s * e.next_factor as usize + e.correct as usize;
                wi = (wi as i32 + e.next as i32) as usize;
            }
            wp.idx = (idx - bytes) as u32;
            wp.wi = wi as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_off_segmented() {
        // Crossing two segments must clear the same bits as one
        // segment of double size.
        let stop = 30 * 2048 + 6;
        let mut one = EratSmall::new();
        let mut two = EratSmall::new();
        for p in [13u64, 23, 31, 97, 541, 1499] {
            one.add(p, 0, stop);
            two.add(p, 0, stop);
        }
        let mut big = vec![0xffu8; 2048];
        one.cross_off(&mut big);
        let mut seg = vec![0xffu8; 1024];
        two.cross_off(&mut seg);
        assert_eq!(&big[..1024], &seg[..]);
        let first = seg.clone();
        seg.fill(0xff);
        two.cross_off(&mut seg);
        assert_eq!(&big[1024..], &seg[..]);
        assert_ne!(first, seg);
    }
}
