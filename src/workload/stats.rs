use std::fmt;
use std::time::{Duration, Instant};

/// Run `f` and measure its wall time.
pub fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let r = f();
    (r, start.elapsed())
}

/// Parallel against serial timing of one phase.
#[derive(Debug, Clone)]
pub struct PerformanceStats {
    pub operation: String,
    pub data_mb: f64,
    pub parallel: Duration,
    pub serial: Duration,
    pub threads: usize,
}

impl PerformanceStats {
    /// `serial / parallel`. Infinite if the parallel run took no measurable time.
    pub fn speedup(&self) -> f64 {
        self.serial.as_secs_f64() / self.parallel.as_secs_f64()
    }

    /// Speedup per thread, in percent.
    pub fn efficiency(&self) -> f64 {
        self.speedup() / self.threads.max(1) as f64 * 100.
    }
}

impl fmt::Display for PerformanceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.operation)?;
        writeln!(f, "data size:     {:.2} MB", self.data_mb)?;
        writeln!(f, "parallel time: {:.4} s", self.parallel.as_secs_f64())?;
        writeln!(f, "serial time:   {:.4} s", self.serial.as_secs_f64())?;
        writeln!(f, "speedup:       {:.2}x", self.speedup())?;
        writeln!(
            f,
            "efficiency:    {:.2}% ({} threads)",
            self.efficiency(),
            self.threads
        )
    }
}
