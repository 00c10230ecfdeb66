//! Synthetic Dataset Generator
//!
//! Writes a creditcard-style CSV (`Time, V1..V28, Amount, Class`) for running
//! the pipeline without the real dataset. Output is fully determined by the seed.

use anyhow::{Context, Result};
use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

const COMPONENTS: usize = 28;

/// Seeded transaction generator
struct TransactionGenerator {
    rng: StdRng,
    clock: f64,
}

impl TransactionGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock: 0.0,
        }
    }

    /// Standard normal sample (Box-Muller)
    fn gaussian(&mut self) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn next_time(&mut self) -> f64 {
        self.clock += self.rng.gen_range(0.0..4.0_f64).floor();
        self.clock
    }

    /// Legitimate transaction: components near zero, modest amount
    fn generate_valid(&mut self) -> Vec<f64> {
        let mut row = Vec::with_capacity(COMPONENTS + 3);
        row.push(self.next_time());
        for _ in 0..COMPONENTS {
            row.push(self.gaussian());
        }
        row.push((self.gaussian() * 0.8 + 3.5).exp().min(5000.0));
        row.push(0.0);
        row
    }

    /// Fraudulent transaction: shifted, wider components and larger amount
    fn generate_fraud(&mut self) -> Vec<f64> {
        let mut row = Vec::with_capacity(COMPONENTS + 3);
        row.push(self.next_time());
        for c in 0..COMPONENTS {
            let shift = if c % 3 == 0 { -4.0 } else { 1.5 };
            row.push(shift + self.gaussian() * 3.0);
        }
        row.push(self.rng.gen_range(200.0..2500.0));
        row.push(1.0);
        row
    }
}

fn header() -> Vec<String> {
    let mut columns = vec!["Time".to_string()];
    columns.extend((1..=COMPONENTS).map(|i| format!("V{}", i)));
    columns.push("Amount".to_string());
    columns.push("Class".to_string());
    columns
}

/// Per-row fraud draw; the rate must be a probability.
fn fraud_distribution(fraud_rate: f64) -> Result<Bernoulli> {
    Bernoulli::new(fraud_rate)
        .with_context(|| format!("fraud_rate {} must be in [0, 1]", fraud_rate))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_dataset=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let path = args.get(1).map(|s| s.as_str()).unwrap_or("data/creditcard.csv");
    let rows: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50_000);
    let fraud_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.0017);
    let seed: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(1);
    let is_fraud = fraud_distribution(fraud_rate)?;

    info!(
        path = %path,
        rows = rows,
        fraud_rate = fraud_rate,
        seed = seed,
        "Generating synthetic dataset"
    );

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to open {}", path))?;
    writer.write_record(header())?;

    let mut generator = TransactionGenerator::new(seed);
    let mut valid_count = 0u64;
    let mut fraud_count = 0u64;

    for _ in 0..rows {
        let row = if is_fraud.sample(&mut generator.rng) {
            fraud_count += 1;
            generator.generate_fraud()
        } else {
            valid_count += 1;
            generator.generate_valid()
        };
        let last = row.len() - 1;
        writer.write_record(row.iter().enumerate().map(|(i, v)| {
            if i == 0 || i == last {
                format!("{}", *v as i64)
            } else {
                format!("{:.6}", v)
            }
        }))?;
    }
    writer.flush()?;

    info!(
        "Completed! Wrote {} transactions ({} valid, {} fraud)",
        rows, valid_count, fraud_count
    );

    Ok(())
}
