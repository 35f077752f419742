//! Small timing harness used by the driver binary.
//!
//! The first successful measurement of a `Benchmark` becomes the baseline,
//! later ones are reported with their speedup against it. A routine that
//! returns `SpmvError::NotImplemented` is reported as such and the session
//! carries on.

use std::hint::black_box;
use std::sync::atomic::{fence, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Result, SpmvError};

/// Runs `f` `warmup` times untimed, then `iterations` times timed, and returns
/// the average duration of one timed call.
pub fn benchmark_raw<T, F>(warmup: usize, iterations: usize, mut f: F) -> Result<Duration>
where
    F: FnMut() -> Result<T>,
{
    for _ in 0..warmup {
        black_box(f()?);
    }

    let iterations = iterations.max(1);
    let begin = Instant::now();
    fence(Ordering::SeqCst);
    for _ in 0..iterations {
        black_box(f()?);
        fence(Ordering::SeqCst);
    }

    Ok(average(begin.elapsed(), iterations))
}

fn average(elapsed: Duration, iterations: usize) -> Duration {
    elapsed.div_f64(iterations as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Measured(Duration),
    NotImplemented,
    Failed,
}

#[derive(Debug)]
pub struct Benchmark {
    show_speedup: bool,
    baseline: Option<Duration>,
    name_width: usize,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self {
            show_speedup: true,
            baseline: None,
            name_width: 20,
        }
    }
}

impl Benchmark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_speedup(&mut self) {
        self.show_speedup = true;
    }

    pub fn hide_speedup(&mut self) {
        self.show_speedup = false;
    }

    /// Forgets the baseline.
    pub fn clear(&mut self) {
        self.baseline = None;
        self.name_width = 20;
    }

    pub fn baseline(&self) -> Option<Duration> {
        self.baseline
    }

    /// Times `f` and prints one result line to stdout.
    pub fn run<T, F>(&mut self, description: &str, warmup: usize, iterations: usize, f: F) -> Outcome
    where
        F: FnMut() -> Result<T>,
    {
        let (outcome, line) = self.measure(description, warmup, iterations, f);
        println!("{}", line);
        outcome
    }

    fn measure<T, F>(
        &mut self,
        description: &str,
        warmup: usize,
        iterations: usize,
        f: F,
    ) -> (Outcome, String)
    where
        F: FnMut() -> Result<T>,
    {
        self.name_width = self.name_width.max(description.len());
        let mut line = format!("{:>width$}: ", description, width = self.name_width);

        let duration = match benchmark_raw(warmup, iterations, f) {
            Ok(d) => d,
            Err(SpmvError::NotImplemented) => {
                line.push_str("--- not implemented ---");
                return (Outcome::NotImplemented, line);
            }
            Err(e) => {
                error!("benchmark '{}' failed: {}", description, e);
                line.push_str(&format!("--- failed: {} ---", e));
                return (Outcome::Failed, line);
            }
        };

        let mut speedup = None;
        match self.baseline {
            Some(base) if self.show_speedup => {
                speedup = Some(base.as_secs_f64() / duration.as_secs_f64().max(f64::MIN_POSITIVE))
            }
            Some(_) => {}
            None => self.baseline = Some(duration),
        }

        line.push_str(&format!("{:<10}", format_duration(duration)));
        let mut notes = Vec::new();
        if let Some(s) = speedup {
            notes.push(format!("speedup: {:.2}x", s));
        }
        if iterations > 1 {
            notes.push(format!("{} iterations", iterations));
        }
        if !notes.is_empty() {
            line.push_str(&format!(" ({})", notes.join(", ")));
        }

        (Outcome::Measured(duration), line)
    }
}

/// Microseconds below 1 ms, milliseconds with two decimals below 100 ms,
/// whole milliseconds above.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_millis(1) {
        format!("{} μs", d.as_micros())
    } else if d < Duration::from_millis(100) {
        format!("{:.2} ms", d.as_secs_f64() * 1e3)
    } else {
        format!("{} ms", d.as_millis())
    }
}
