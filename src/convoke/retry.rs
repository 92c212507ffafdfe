//! A small retry helper shared by the bot-invoking workflow nodes (§4.9):
//! up to 3 attempts, 2s initial interval, Fibonacci backoff between
//! attempts. Wraps both transport errors and post-processing errors on the
//! assumption that the model may self-correct on the next attempt.

use std::error::Error;
use std::future::Future;
use std::time::Duration;

/// Fibonacci backoff sequence seeded at `2s, 2s, 4s, 6s, 10s, ...`, matching
/// the source material's `FibonacciBackoff(2 * time.Second)`.
fn fibonacci_delay(attempt: u32, base: Duration) -> Duration {
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 0..attempt {
        let next = a + b;
        a = b;
        b = next;
    }
    base * a as u32
}

/// Runs `op` up to `max_attempts` times, sleeping a Fibonacci-backed delay
/// between attempts. Returns the last error if every attempt fails.
pub async fn run_with_retry<F, Fut, T>(
    max_attempts: u32,
    base_interval: Duration,
    mut op: F,
) -> Result<T, Box<dyn Error + Send + Sync>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Box<dyn Error + Send + Sync>>>,
{
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                last_err = Some(e);
                if attempt + 1 < max_attempts {
                    tokio::time::sleep(fibonacci_delay(attempt, base_interval)).await;
                }
            }
        }
    }
    Err(last_err.expect("at least one attempt ran"))
}

/// The retry policy used by bot-scatter, bot-reduce, and bot-with-history:
/// 3 attempts, 2s base interval.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_secs(2);
