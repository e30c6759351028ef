// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Cross-off engine for medium sieving primes.
//!
//! Medium primes fire a handful of times per segment, so a plain
//! table-driven loop over the modulo 210 wheel amortizes well and
//! unrolling would only bloat the code. The wheel skips quotients
//! divisible by 7 on top of 2, 3, 5.

use crate::wheel::{first_multiple, WheelPrime, INIT210, WHEEL210};

pub struct EratMedium {
    primes: Vec<WheelPrime>,
}

impl EratMedium {
    pub fn new() -> Self {
        EratMedium { primes: vec![] }
    }

    pub fn add(&mut self, p: u64, low: u64, stop: u64) {
        if let Some((idx, wi)) = first_multiple(p, low, stop, &INIT210) {
            self.primes.push(WheelPrime { prime: (p / 30) as u32, idx: idx as u32, wi });
        }
    }

    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let bytes = sieve.len();
        for wp in &mut self.primes {
            let s = wp.prime as usize;
            let mut idx = wp.idx as usize;
            let mut wi = wp.wi as usize;
            while idx < bytes {
                let e = &WHEEL210[wi];
                // idx < bytes was just checked.
                unsafe { *sieve.get_unchecked_mut(idx) &= e.unset_bit };
                idx += s * e.next_factor as usize + e.correct as usize;
                wi = (wi as i32 + e.next as i32) as usize;
            }
            wp.idx = (idx - bytes) as u32;
            wp.wi = wi as u16;
        }
    }
}
