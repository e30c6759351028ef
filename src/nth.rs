// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Locating the n-th prime after (or before) an offset.
//!
//! The prime counting function is approximated through the average
//! gap ln x, giving a window expected to hold the n remaining
//! primes with some margin. Windows are counted (in parallel for
//! the parallel variant) until the target is bracketed, then the
//! final window is walked with a per-prime visitor.

use crate::finder::{sieve_interval, Mode};
use crate::parallel::dispatch_count;
use crate::params::MAX_STOP;
use crate::{Error, Preferences, Verbosity};

/// Returns the n-th prime strictly greater than `start` for n > 0,
/// the |n|-th prime strictly smaller than `start` for n < 0.
/// n = 0 is invalid, as is a search leaving [2, max_stop()].
pub fn nth_prime(n: i64, start: u64, prefs: &Preferences, threads: usize) -> Result<u64, Error> {
    if n == 0 || start > MAX_STOP {
        return Err(Error::InvalidNth);
    }
    if n > 0 {
        nth_prime_forward(n as u64, start, prefs, threads)
    } else {
        nth_prime_backward(n.unsigned_abs(), start, prefs, threads)
    }
}

fn nth_prime_forward(n: u64, start: u64, prefs: &Preferences, threads: usize) -> Result<u64, Error> {
    let mut remaining = n;
    let mut low = start;
    loop {
        let high = low.saturating_add(window(remaining, low)).min(MAX_STOP);
        let count = dispatch_count(low + 1, high, threads, prefs, 1)?;
        if prefs.verbose(Verbosity::Verbose) {
            eprintln!("Window ({}, {}] holds {} primes, {} to go", low, high, count, remaining);
        }
        if count < remaining {
            if high == MAX_STOP {
                return Err(Error::InvalidNth);
            }
            remaining -= count;
            low = high;
            continue;
        }
        // The target is inside (low, high]: visit and count down.
        let mut k = remaining;
        let mut answer = 0u64;
        sieve_interval(low + 1, high, prefs, &mut Mode::Callback(&mut |p| {
            if k > 0 {
                k -= 1;
                if k == 0 {
                    answer = p;
                }
            }
        }))?;
        return Ok(answer);
    }
}

fn nth_prime_backward(n: u64, start: u64, prefs: &Preferences, threads: usize) -> Result<u64, Error> {
    let mut remaining = n;
    let mut high = start;
    loop {
        if high <= 2 {
            return Err(Error::InvalidNth);
        }
        let low = high.saturating_sub(window(remaining, high));
        let count = dispatch_count(low, high - 1, threads, prefs, 1)?;
        if prefs.verbose(Verbosity::Verbose) {
            eprintln!("Window [{}, {}) holds {} primes, {} to go", low, high, count, remaining);
        }
        if count < remaining {
            if low == 0 {
                return Err(Error::InvalidNth);
            }
            remaining -= count;
            high = low;
            continue;
        }
        let mut primes = vec![];
        sieve_interval(low, high - 1, prefs, &mut Mode::Callback(&mut |p| primes.push(p)))?;
        return Ok(primes[primes.len() - remaining as usize]);
    }
}

/// Width of an interval past x expected to hold n primes, with
/// enough margin that one or two windows normally suffice.
fn window(n: u64, x: u64) -> u64 {
    let n = n.max(8) as f64;
    let x = (x as f64).max(8.0);
    // Primes near the target are spaced ~ln(target) apart.
    let target = x + n * x.ln();
    let gap = target.ln() + target.ln().ln();
    (n * gap * 1.1 + 10_000.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nth(n: i64, start: u64) -> u64 {
        nth_prime(n, start, &Preferences::default(), 1).unwrap()
    }

    #[test]
    fn test_nth_prime() {
        assert_eq!(nth(1, 0), 2);
        assert_eq!(nth(2, 0), 3);
        assert_eq!(nth(25, 0), 97);
        assert_eq!(nth(10_000, 0), 104_729);
        // Search starts strictly after the offset.
        assert_eq!(nth(1, 2), 3);
        assert_eq!(nth(3, 10), 17);
    }

    #[test]
    fn test_nth_prime_backward() {
        assert_eq!(nth(-1, 100), 97);
        assert_eq!(nth(-2, 100), 89);
        // pi(97) = 25, so 25 primes below 98 end at 2.
        assert_eq!(nth(-25, 98), 2);
        assert_eq!(nth(-1229, 10_007), 2);
    }

    #[test]
    fn test_nth_prime_invalid() {
        let prefs = Preferences::default();
        assert_eq!(nth_prime(0, 0, &prefs, 1), Err(Error::InvalidNth));
        assert_eq!(nth_prime(-1, 2, &prefs, 1), Err(Error::InvalidNth));
        assert_eq!(nth_prime(-5, 11, &prefs, 1), Err(Error::InvalidNth));
        assert_eq!(nth_prime(1, u64::MAX, &prefs, 1), Err(Error::InvalidNth));
    }

    #[test]
    fn test_count_inverse() {
        // count_primes(0, nth(k)) == k and nth(k) is prime.
        let prefs = Preferences::default();
        for k in [1i64, 2, 10, 100, 168, 1000] {
            let p = nth(k, 0);
            let c = sieve_interval(0, p, &prefs, &mut Mode::Count).unwrap();
            assert_eq!(c, k as u64);
            let above = sieve_interval(p, p, &prefs, &mut Mode::Count).unwrap();
            assert_eq!(above, 1);
        }
    }
}
