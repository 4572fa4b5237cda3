//! Rate limiting for API requests

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// 레이트 리미터
///
/// CCXT 방식의 간격 기반 스로틀: 요청 사이에 `rate_limit_ms * cost` 만큼의
/// 간격을 보장한다.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// 새로운 레이트 리미터 생성
    ///
    /// # Arguments
    /// * `rate_limit_ms` - 요청 간 최소 간격 (밀리초)
    pub fn new(rate_limit_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(rate_limit_ms),
            next_slot: Mutex::new(None),
        }
    }

    /// 요청 간격 (밀리초)
    pub fn rate_limit_ms(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    /// 토큰 획득 시도 (블로킹 없음)
    pub fn try_acquire(&self, cost: f64) -> bool {
        let Ok(mut slot) = self.next_slot.try_lock() else {
            return false;
        };
        let now = Instant::now();
        match *slot {
            Some(next) if next > now => false,
            _ => {
                *slot = Some(now + self.interval.mul_f64(cost.max(0.0)));
                true
            }
        }
    }

    /// 다음 슬롯까지 대기 후 슬롯 예약
    pub async fn throttle(&self, cost: f64) {
        let mut slot = self.next_slot.lock().await;
        let now = Instant::now();
        let start = match *slot {
            Some(next) if next > now => {
                tokio::time::sleep_until(next).await;
                next
            }
            _ => now,
        };
        *slot = Some(start + self.interval.mul_f64(cost.max(0.0)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_passes() {
        let limiter = RateLimiter::new(100);
        assert!(limiter.try_acquire(1.0));
        assert!(!limiter.try_acquire(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_spaces_requests() {
        let limiter = RateLimiter::new(100);
        let start = Instant::now();
        limiter.throttle(1.0).await;
        limiter.throttle(1.0).await;
        limiter.throttle(1.0).await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
