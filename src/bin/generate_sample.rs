use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Write a deterministic sample of the cars dataset as CSV.
#[derive(Parser, Debug)]
#[command(version, about = "generate-sample")]
struct Args {
    /// Output file
    #[arg(default_value = "sample_cars.csv")]
    path: PathBuf,
}

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// (manufacturer, origin, model names)
const MAKERS: &[(&str, &str, &[&str])] = &[
    ("chevrolet", "American", &["chevelle", "impala", "nova", "vega"]),
    ("ford", "American", &["torino", "galaxie", "pinto", "maverick"]),
    ("plymouth", "American", &["satellite", "fury", "duster"]),
    ("amc", "American", &["rebel sst", "hornet", "gremlin"]),
    ("toyota", "Japanese", &["corona", "corolla", "celica"]),
    ("datsun", "Japanese", &["pl510", "510", "b210"]),
    ("honda", "Japanese", &["civic", "accord"]),
    ("volkswagen", "European", &["1131 deluxe sedan", "rabbit", "dasher"]),
    ("peugeot", "European", &["504", "304"]),
    ("citroen", "European", &["ds-21 pallas"]),
];

const CYLINDERS: &[u32] = &[4, 6, 8];

const HEADER: [&str; 10] = [
    "Car",
    "Manufacturer",
    "MPG",
    "Cylinders",
    "Displacement",
    "Horsepower",
    "Weight",
    "Acceleration",
    "Model_Year",
    "Origin",
];

/// Format a measurement, occasionally replacing it with the `NA` marker.
fn cell(rng: &mut SimpleRng, value: f64, decimals: usize, missing_rate: f64) -> String {
    if rng.next_f64() < missing_rate {
        "NA".to_string()
    } else {
        format!("{value:.decimals$}")
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let output_path = Args::parse().path;

    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    writer.write_record(HEADER)?;

    let mut rows = 0;
    for year in 70..=82 {
        for &(maker, origin, models) in MAKERS {
            let model = rng.pick(models);
            let cylinders = match origin {
                "American" => *rng.pick(CYLINDERS),
                _ => 4,
            };
            let cyl = cylinders as f64;
            let displacement = cyl * rng.range(22.0, 45.0);
            let horsepower = displacement * rng.range(0.35, 0.6);
            let weight = 1500.0 + cyl * rng.range(250.0, 450.0);
            let era_bonus = (year - 70) as f64 * 0.6;
            let mpg =
                (48.0 - cyl * 3.2 - weight / 400.0 + era_bonus + rng.range(-2.0, 2.0)).max(9.0);
            let acceleration = rng.range(8.0, 24.0);

            writer.write_record([
                format!("{maker} {model}"),
                maker.to_string(),
                cell(&mut rng, mpg, 1, 0.03),
                cylinders.to_string(),
                format!("{displacement:.0}"),
                cell(&mut rng, horsepower, 0, 0.03),
                cell(&mut rng, weight, 0, 0.01),
                format!("{acceleration:.1}"),
                year.to_string(),
                origin.to_string(),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;

    println!("Wrote {rows} cars to {}", output_path.display());
    Ok(())
}
