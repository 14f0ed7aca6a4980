use std::time::Duration;
use tokio::time::Instant;

/// Client-side requests-per-minute ceiling.
///
/// A token bucket of one: before each request, sleep whatever is left of the
/// minimum interval since the previous request.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RequestThrottle {
    pub fn per_minute(requests: u32) -> Self {
        if requests == 0 {
            return Self::unlimited();
        }
        Self::with_min_interval(Duration::from_secs(60) / requests)
    }

    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    pub fn unlimited() -> Self {
        Self::with_min_interval(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may be sent, then record it as sent.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_minute_interval() {
        assert_eq!(RequestThrottle::per_minute(60).min_interval(), Duration::from_secs(1));
        assert_eq!(RequestThrottle::per_minute(120).min_interval(), Duration::from_millis(500));
        assert_eq!(RequestThrottle::per_minute(0).min_interval(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_first_request_is_immediate_then_spaced() {
        let mut throttle = RequestThrottle::with_min_interval(Duration::from_millis(50));

        let start = std::time::Instant::now();
        throttle.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));

        throttle.acquire().await;
        throttle.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
