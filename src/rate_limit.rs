use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Per-IP request limiter over a fixed window.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    /// ip -> (count, window_start)
    entries: DashMap<IpAddr, (u32, Instant)>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            entries: DashMap::new(),
        }
    }

    /// Count a request from `ip`. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), u64> {
        let mut entry = self.entries.entry(ip).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) >= self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= self.max_requests {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed).max(1));
        }

        *count += 1;
        Ok(())
    }

    /// Drop entries whose window has already closed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < self.window);
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = limiter(3, 900);
        let ip: IpAddr = "203.0.113.7".parse().unwrap();
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(ip, now).is_ok());
        }
        let retry_after = limiter.check_at(ip, now).unwrap_err();
        assert!(retry_after > 0 && retry_after <= 900);
    }

    #[test]
    fn limits_are_tracked_per_ip() {
        let limiter = limiter(1, 900);
        let a: IpAddr = "198.51.100.1".parse().unwrap();
        let b: IpAddr = "198.51.100.2".parse().unwrap();
        let now = Instant::now();

        assert!(limiter.check_at(a, now).is_ok());
        assert!(limiter.check_at(a, now).is_err());
        assert!(limiter.check_at(b, now).is_ok());
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = limiter(1, 60);
        let ip: IpAddr = "192.0.2.10".parse().unwrap();
        let start = Instant::now();

        assert!(limiter.check_at(ip, start).is_ok());
        assert!(limiter.check_at(ip, start + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at(ip, start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn cleanup_keeps_open_windows() {
        let limiter = limiter(5, 900);
        limiter.check("192.0.2.1".parse().unwrap()).unwrap();
        limiter.cleanup();
        assert_eq!(limiter.tracked(), 1);
    }
}
