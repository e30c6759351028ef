use brunch::Bench;
use eratos::{count_primes, count_twins, nth_prime};

brunch::benches! {
    Bench::new("count primes below 1e6")
    .run_seeded(1_000_000u64, |n| count_primes(0, n)),
    Bench::new("count primes below 1e8")
    .run_seeded(100_000_000u64, |n| count_primes(0, n)),
    // Far interval: dominated by the sieving prime generator.
    Bench::new("count primes in [1e12, 1e12+1e7]")
    .run_seeded(1_000_000_000_000u64, |n| count_primes(n, n + 10_000_000)),
    Bench::new("count twins below 1e7")
    .run_seeded(10_000_000u64, |n| count_twins(0, n)),
    Bench::new("nth prime 1e6")
    .run_seeded(1_000_000i64, |n| nth_prime(n, 0)),
}
