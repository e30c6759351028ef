// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::str::FromStr;

use eratos::{Preferences, PrimeSieve, Verbosity};

fn main() {
    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() || arg.orphans.is_empty() || arg.orphans.len() > 2 {
        eprintln!("Usage: eratos [OPTIONS] START [STOP]");
        eprintln!("Count, print or locate primes and prime k-tuplets.");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --help                    show this help");
        eprintln!("  --tuplet K:               work on K-tuplets (1 = primes, 2 = twins, .. 7)");
        eprintln!("  --print:                  print instead of counting");
        eprintln!("  --nth N:                  print the N-th prime after START");
        eprintln!("  --threads N:              use up to N computation threads");
        eprintln!("  --sieve-size KB:          segment size in kilobytes");
        eprintln!("  --verbose silent|info|verbose|debug");
        return;
    }
    let k = arg.get::<usize>("tuplet").unwrap_or(1);
    if !(1..=7).contains(&k) {
        panic!("tuplet size must be in 1..=7");
    }
    let threads = arg.get::<usize>("threads").unwrap_or(0);
    let v = arg.get::<String>("verbose").unwrap_or("info".into());

    let mut prefs = Preferences::default();
    if let Some(kb) = arg.get::<usize>("sieve-size") {
        prefs.sieve_size = kb;
    }
    prefs.threads = threads;
    prefs.verbosity = Verbosity::from_str(&v).unwrap();
    let sieve = PrimeSieve::with_preferences(prefs.clone());

    let start = u64::from_str(&arg.orphans[0]).expect("could not read start");

    if let Some(n) = arg.get::<i64>("nth") {
        let p = sieve.parallel_nth_prime(n, start, threads).expect("nth prime search failed");
        println!("{}", p);
        return;
    }

    let stop = match arg.orphans.get(1) {
        Some(s) => u64::from_str(s).expect("could not read stop"),
        None => {
            // A single number means [0, START].
            let stop = start;
            return run(&sieve, k, 0, stop, threads, arg.get::<bool>("print").is_some(), &prefs);
        }
    };
    run(&sieve, k, start, stop, threads, arg.get::<bool>("print").is_some(), &prefs)
}

fn run(
    sieve: &PrimeSieve,
    k: usize,
    start: u64,
    stop: u64,
    threads: usize,
    print: bool,
    prefs: &Preferences,
) {
    if print {
        let stdout = std::io::stdout();
        let mut w = std::io::BufWriter::new(stdout.lock());
        let res = if k == 1 {
            sieve.print_primes_to(start, stop, &mut w)
        } else {
            sieve.print_tuplets_to(k, start, stop, &mut w)
        };
        res.expect("printing failed");
        return;
    }
    if prefs.verbose(Verbosity::Info) {
        eprintln!("Counting {}-tuplets in [{}, {}]", k, start, stop);
    }
    let count = if k == 1 {
        sieve.parallel_count_primes(start, stop, threads)
    } else {
        sieve.parallel_count_tuplets(k, start, stop, threads)
    };
    println!("{}", count.expect("counting failed"));
}
