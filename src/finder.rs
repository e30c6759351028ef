// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Consumers of sieved segments: counting, printing and callbacks
//! for primes and prime k-tuplets.
//!
//! K-tuplets are the densest admissible constellations: twins
//! (p, p+2), triplets (p, p+2, p+6) / (p, p+4, p+6), quadruplets
//! (p, p+2, p+6, p+8), quintuplets (p, p+2, p+6, p+8, p+12) /
//! (p, p+4, p+6, p+10, p+12), sextuplets (p, p+4, p+6, p+10, p+12,
//! p+16) and septuplets (p, p+2, p+6, p+8, p+12, p+18, p+20). Every
//! such pattern above 5 fits inside a single wheel byte, so tuplets
//! are recognized with per-byte bitmasks and counted through a
//! 256-entry lookup table. A tuplet is counted when all its members
//! lie in [start, stop]; the few tuplets containing 2, 3 or 5 are
//! handled separately.

use std::io::Write;

use crate::generate::SievingPrimes;
use crate::params;
use crate::sieve::{count_bits, for_each_prime, Erat};
use crate::wheel::BIT_VALUES;
use crate::{Error, Preferences};

/// Bit patterns of the k-tuplets inside one wheel byte, k = 2..=7.
const TUPLET_MASKS: [&[u8]; 8] = [
    &[],
    &[],
    &[0x06, 0x18, 0xc0],
    &[0x07, 0x0e, 0x1c, 0x38],
    &[0x1e],
    &[0x1f, 0x3e],
    &[0x3f],
    &[0xfe],
];

/// K-tuplets whose smallest member is below the wheel range.
const SPECIAL_TUPLETS: [&[&[u64]]; 8] = [
    &[],
    &[],
    &[&[3, 5], &[5, 7]],
    &[&[5, 7, 11]],
    &[&[5, 7, 11, 13]],
    &[&[5, 7, 11, 13, 17]],
    &[],
    &[],
];

/// What to do with a sieved segment. Counting modes accumulate into
/// the return value of `sieve_interval`.
pub enum Mode<'a> {
    /// Count primes.
    Count,
    /// Count k-tuplets, k in 2..=7.
    CountTuplets(usize),
    /// Count k-tuplets whose smallest member is at most the bound.
    /// Used by the parallel dispatcher, which sieves a little past
    /// each chunk so that tuplets straddling a chunk boundary are
    /// credited to the chunk holding their smallest member.
    CountTupletsBounded(usize, u64),
    /// Write primes in decimal, one per line.
    Print(&'a mut dyn Write),
    /// Write k-tuplets as parenthesized lists, one per line.
    PrintTuplets(usize, &'a mut dyn Write),
    /// Call back every prime in ascending order.
    Callback(&'a mut dyn FnMut(u64)),
    /// Call back every prime together with a worker id.
    ThreadCallback(&'a (dyn Fn(u64, usize) + Sync), usize),
}

/// Sieves [start, stop] and feeds every segment to `mode`.
/// Returns the number of primes or tuplets for the counting modes,
/// 0 otherwise.
pub fn sieve_interval(
    start: u64,
    stop: u64,
    prefs: &Preferences,
    mode: &mut Mode,
) -> Result<u64, Error> {
    if stop > params::MAX_STOP {
        return Err(Error::InvalidRange);
    }
    if start > stop {
        return Ok(0);
    }
    let mut count = 0u64;
    emit_specials(start, stop, mode, &mut count)?;
    if stop < 7 {
        return Ok(count);
    }

    let table = match mode {
        Mode::CountTuplets(k) | Mode::CountTupletsBounded(k, _) => Some(tuplet_table(*k)),
        _ => None,
    };
    let bytes = params::segment_bytes(prefs.sieve_size);
    let mut erat = Erat::new(start, stop, bytes, prefs.presieve_limit)?;
    let sqrt_stop = num_integer::sqrt(stop);
    let mut generator = if sqrt_stop > erat.presieve_limit() {
        Some(SievingPrimes::new(sqrt_stop)?)
    } else {
        None
    };
    let mut pending: Option<u64> = None;

    while !erat.finished() {
        // Install the sieving primes whose square falls within the
        // upcoming segment.
        if let Some(generator) = &mut generator {
            let high = erat.segment_high();
            loop {
                let p = match pending.take() {
                    Some(p) => p,
                    None => match generator.next_prime()? {
                        Some(p) => p,
                        None => break,
                    },
                };
                if p * p > high {
                    pending = Some(p);
                    break;
                }
                if p > erat.presieve_limit() {
                    erat.add_sieving_prime(p)?;
                }
            }
        }
        let Some((seg, low)) = erat.next_segment()? else {
            break;
        };
        match mode {
            Mode::Count => count += count_bits(seg),
            Mode::CountTuplets(_) => {
                let table = table.as_ref().unwrap();
                count += seg.iter().map(|&b| table[b as usize] as u64).sum::<u64>();
            }
            Mode::CountTupletsBounded(_, bound) => {
                // The smallest member of any pattern in a byte lies at
                // byte base + 7 ..= base + 29, so with a 30-aligned
                // bound the cutoff falls between two bytes.
                let table = table.as_ref().unwrap();
                let bound = *bound;
                for (i, &b) in seg.iter().enumerate() {
                    if low + 30 * i as u64 + 29 > bound {
                        break;
                    }
                    count += table[b as usize] as u64;
                }
            }
            Mode::Print(w) => {
                let mut err = false;
                for_each_prime(seg, low, &mut |p| {
                    err = err || writeln!(w, "{}", p).is_err();
                });
                if err {
                    return Err(Error::Io);
                }
            }
            Mode::PrintTuplets(k, w) => print_tuplets(seg, low, *k, w)?,
            Mode::Callback(f) => for_each_prime(seg, low, &mut |p| f(p)),
            Mode::ThreadCallback(f, id) => {
                let id = *id;
                for_each_prime(seg, low, &mut |p| f(p, id));
            }
        }
    }
    Ok(count)
}

/// Primes and tuplets not representable in the wheel layout:
/// everything involving 2, 3 or 5.
fn emit_specials(start: u64, stop: u64, mode: &mut Mode, count: &mut u64) -> Result<(), Error> {
    match mode {
        Mode::Count => {
            *count += [2u64, 3, 5].iter().filter(|&&p| start <= p && p <= stop).count() as u64;
        }
        Mode::CountTuplets(k) => {
            for t in SPECIAL_TUPLETS[*k] {
                if start <= t[0] && *t.last().unwrap() <= stop {
                    *count += 1;
                }
            }
        }
        Mode::CountTupletsBounded(k, bound) => {
            for t in SPECIAL_TUPLETS[*k] {
                if start <= t[0] && t[0] <= *bound && *t.last().unwrap() <= stop {
                    *count += 1;
                }
            }
        }
        Mode::Print(w) => {
            for p in [2u64, 3, 5] {
                if start <= p && p <= stop {
                    writeln!(w, "{}", p).map_err(|_| Error::Io)?;
                }
            }
        }
        Mode::PrintTuplets(k, w) => {
            for t in SPECIAL_TUPLETS[*k] {
                if start <= t[0] && *t.last().unwrap() <= stop {
                    write_tuplet(t, w)?;
                }
            }
        }
        Mode::Callback(f) => {
            for p in [2u64, 3, 5] {
                if start <= p && p <= stop {
                    f(p);
                }
            }
        }
        Mode::ThreadCallback(f, id) => {
            for p in [2u64, 3, 5] {
                if start <= p && p <= stop {
                    f(p, *id);
                }
            }
        }
    }
    Ok(())
}

fn tuplet_table(k: usize) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (b, entry) in table.iter_mut().enumerate() {
        *entry = TUPLET_MASKS[k].iter().filter(|&&m| b as u8 & m == m).count() as u8;
    }
    table
}

fn print_tuplets(seg: &[u8], low: u64, k: usize, w: &mut dyn Write) -> Result<(), Error> {
    for (i, &byte) in seg.iter().enumerate() {
        for &mask in TUPLET_MASKS[k] {
            if byte & mask == mask {
                let base = low + 30 * i as u64;
                let members: Vec<u64> = (0..8)
                    .filter(|b| mask & (1 << b) != 0)
                    .map(|b| base + BIT_VALUES[b as usize])
                    .collect();
                write_tuplet(&members, w)?;
            }
        }
    }
    Ok(())
}

fn write_tuplet(members: &[u64], w: &mut dyn Write) -> Result<(), Error> {
    let mut line = String::from("(");
    for (i, m) in members.iter().enumerate() {
        if i > 0 {
            line.push_str(", ");
        }
        line.push_str(&m.to_string());
    }
    line.push(')');
    writeln!(w, "{}", line).map_err(|_| Error::Io)
}
