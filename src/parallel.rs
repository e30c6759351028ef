// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Parallel dispatch over sub-intervals.
//!
//! An interval is split into per-thread chunks of at least
//! MIN_THREAD_INTERVAL numbers, with all interior boundaries on
//! multiples of 30 so that every worker sieves wheel-aligned
//! segments. Workers run independent sieves with private buckets
//! and presieve buffers; counting reduces by summing, callbacks
//! deliver primes in arbitrary cross-thread order.

use rayon::prelude::*;

use crate::finder::{sieve_interval, Mode};
use crate::params::MIN_THREAD_INTERVAL;
use crate::{Error, Preferences, Verbosity};

/// Number of workers for an interval: enough to keep every chunk at
/// or above MIN_THREAD_INTERVAL, capped by the request and by the
/// machine. 0 means all cores.
pub fn thread_count(start: u64, stop: u64, threads: usize) -> usize {
    let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let threads = if threads == 0 { cores } else { threads.min(cores) };
    let interval = stop.saturating_sub(start) + 1;
    let max = (interval / MIN_THREAD_INTERVAL).max(1);
    threads.min(max as usize)
}

/// Splits [start, stop] into `threads` chunks with interior
/// boundaries aligned to multiples of 30.
pub fn split(start: u64, stop: u64, threads: usize) -> Vec<(u64, u64)> {
    let interval = stop - start + 1;
    let chunk = (interval / threads as u64) / 30 * 30;
    let mut bounds = vec![];
    let mut low = start;
    for i in 0..threads {
        let high = if i + 1 == threads { stop } else { low / 30 * 30 + chunk - 1 };
        bounds.push((low, high));
        low = high + 1;
    }
    bounds
}

/// Runs `count` mode (primes or k-tuplets) in parallel and sums the
/// per-worker results.
pub fn dispatch_count(
    start: u64,
    stop: u64,
    threads: usize,
    prefs: &Preferences,
    k: usize,
) -> Result<u64, Error> {
    if stop > crate::params::MAX_STOP {
        return Err(Error::InvalidRange);
    }
    if start > stop {
        return Ok(0);
    }
    let mode = || if k == 1 { Mode::Count } else { Mode::CountTuplets(k) };
    let threads = thread_count(start, stop, threads);
    if threads <= 1 {
        return sieve_interval(start, stop, prefs, &mut mode());
    }
    let chunks = split(start, stop, threads);
    if prefs.verbose(Verbosity::Verbose) {
        eprintln!(
            "Dispatching {} chunks of ~{} numbers",
            chunks.len(),
            (stop - start + 1) / threads as u64
        );
    }
    let pool = pool(threads)?;
    let last = chunks.len() - 1;
    let counts: Result<Vec<u64>, Error> = pool.install(|| {
        chunks
            .par_iter()
            .enumerate()
            .map(|(i, &(lo, hi))| {
                if k == 1 || i == last {
                    sieve_interval(lo, hi, prefs, &mut mode())
                } else {
                    // Sieve past the boundary so tuplets whose tail
                    // crosses into the next chunk are still counted
                    // with their smallest member.
                    sieve_interval(lo, hi + 20, prefs, &mut Mode::CountTupletsBounded(k, hi))
                }
            })
            .collect()
    });
    Ok(counts?.iter().sum())
}

/// Calls back every prime of [start, stop] from multiple workers.
/// Primes are not delivered in arithmetic order across workers; the
/// callback receives the worker id and must be thread-safe.
pub fn dispatch_callback(
    start: u64,
    stop: u64,
    threads: usize,
    prefs: &Preferences,
    f: &(dyn Fn(u64, usize) + Sync),
) -> Result<(), Error> {
    if stop > crate::params::MAX_STOP {
        return Err(Error::InvalidRange);
    }
    if start > stop {
        return Ok(());
    }
    let threads = thread_count(start, stop, threads);
    if threads <= 1 {
        sieve_interval(start, stop, prefs, &mut Mode::ThreadCallback(f, 0))?;
        return Ok(());
    }
    let chunks = split(start, stop, threads);
    let pool = pool(threads)?;
    let results: Result<Vec<u64>, Error> = pool.install(|| {
        chunks
            .par_iter()
            .map(|&(lo, hi)| {
                let id = rayon::current_thread_index().unwrap_or(0);
                sieve_interval(lo, hi, prefs, &mut Mode::ThreadCallback(f, id))
            })
            .collect()
    });
    results?;
    Ok(())
}

fn pool(threads: usize) -> Result<rayon::ThreadPool, Error> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|_| Error::OutOfMemory)
}
