//! Timing attack protection for credential checks
//!
//! A failed login for an unknown email would otherwise return faster than
//! one for a known email with a wrong password.

use std::time::{Duration, Instant};

/// Sleep until at least `min_duration` has passed since `start_time`
pub async fn add_auth_delay(start_time: Instant, min_duration: Duration) {
    let elapsed = start_time.elapsed();
    if elapsed < min_duration {
        tokio::time::sleep(min_duration - elapsed).await;
    }
}

/// Authentication timing helper
#[derive(Debug, Clone, Copy)]
pub struct AuthTimer {
    start: Instant,
    min_duration: Duration,
}

impl AuthTimer {
    /// Start a timer with the given floor
    pub fn start(min_duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            min_duration,
        }
    }

    /// Wait until the floor has elapsed
    pub async fn wait(self) {
        add_auth_delay(self.start, self.min_duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auth_timer() {
        let timer = AuthTimer::start(Duration::from_millis(10));
        let start = Instant::now();
        timer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_no_delay_once_elapsed() {
        let start = Instant::now() - Duration::from_millis(50);
        let before = Instant::now();
        add_auth_delay(start, Duration::from_millis(10)).await;
        assert!(before.elapsed() < Duration::from_millis(10));
    }
}
