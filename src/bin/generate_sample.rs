use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

const GROUPS: [&str; 4] = ["online_platni", "platni", "sala_platni", "suma_zapisow"];
const YEARS: [i32; 4] = [2023, 2024, 2025, 2026];
const DAYS: i64 = 90;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2025, 6, 1).context("invalid start date")?;

    // Cumulative counts per (group, year); `suma_zapisow` is the sum of the others.
    let paid_groups = &GROUPS[..3];
    let mut totals = vec![[0u64; YEARS.len()]; paid_groups.len()];

    let output_path = "sample_zapisy.csv";
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut header = vec!["dzien_zapisu".to_string()];
    for group in GROUPS {
        for year in YEARS {
            header.push(format!("{group}_{year}"));
        }
    }
    writer.write_record(&header)?;

    for day in 0..DAYS {
        let date = start + Duration::days(day);
        let mut row = vec![date.to_string()];

        for (g, per_year) in totals.iter_mut().enumerate() {
            for (y, total) in per_year.iter_mut().enumerate() {
                // Later editions and on-site sign-ups fill more slowly.
                let rate = 12 - 2 * y as u64 - g as u64;
                *total += rng.below(rate.max(2));
            }
        }

        for per_year in &totals {
            row.extend(per_year.iter().map(|t| t.to_string()));
        }
        for y in 0..YEARS.len() {
            let sum: u64 = totals.iter().map(|per_year| per_year[y]).sum();
            row.push(sum.to_string());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    println!(
        "Wrote {DAYS} days × {} series to {output_path}",
        GROUPS.len() * YEARS.len()
    );
    Ok(())
}
