use rand::Rng;
use std::time::Duration;

/// Exponential backoff with ±30% jitter: `base * 2^attempt`, exponent capped
/// at 10.
pub fn calculate_backoff_delay(attempt: u32, base: Duration) -> Duration {
    let capped_attempt = attempt.min(10);
    let base_ms = base.as_millis().min(u64::MAX as u128) as u64;
    let delay_ms = base_ms.saturating_mul(2_u64.saturating_pow(capped_attempt));

    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    Duration::from_millis((delay_ms as f64 * jitter_factor).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let base = Duration::from_millis(1000);

        let delay0 = calculate_backoff_delay(0, base);
        let delay1 = calculate_backoff_delay(1, base);
        let delay2 = calculate_backoff_delay(2, base);

        assert!(delay0.as_millis() >= 700 && delay0.as_millis() <= 1300);
        assert!(delay1.as_millis() >= 1400 && delay1.as_millis() <= 2600);
        assert!(delay2.as_millis() >= 2800 && delay2.as_millis() <= 5200);
    }

    #[test]
    fn test_backoff_cap() {
        let base = Duration::from_secs(1);
        let high = calculate_backoff_delay(20, base);
        // 1s * 2^10 = 1024s, with jitter
        assert!(high.as_secs() >= 716 && high.as_secs() <= 1332);
    }

    #[test]
    fn test_zero_base_never_waits() {
        assert_eq!(calculate_backoff_delay(3, Duration::ZERO), Duration::ZERO);
    }
}
