use prometheus::IntGauge;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards calls to the database. After `failure_threshold` consecutive
// failures the breaker opens and rejects calls without touching the backend
// until `open_for` has elapsed; it then lets calls through half-open and
// closes again after `success_threshold` successes.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding exported as a Prometheus gauge
    pub fn as_gauge(self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_for: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_for: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    inner: Arc<Mutex<BreakerInner>>,
    config: CircuitBreakerConfig,
    gauge: Option<IntGauge>,
}

struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    CircuitOpen,
    OperationFailed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitBreakerError::CircuitOpen => write!(f, "circuit breaker is open"),
            CircuitBreakerError::OperationFailed(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error> std::error::Error for CircuitBreakerError<E> {}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
            })),
            config,
            gauge: None,
        }
    }

    /// Mirror every state change into `gauge`
    pub fn with_gauge(mut self, gauge: IntGauge) -> Self {
        gauge.set(CircuitState::Closed.as_gauge());
        self.gauge = Some(gauge);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        inner.state = to;
        if let Some(gauge) = &self.gauge {
            gauge.set(to.as_gauge());
        }
    }

    /// Run `operation` if the breaker admits it, recording the outcome.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        self.admit().await?;

        match operation.await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure().await;
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    async fn admit<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        let mut inner = self.inner.lock().await;
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let cooled_down = inner
            .opened_at
            .map(|at| at.elapsed() >= self.config.open_for)
            .unwrap_or(true);

        if cooled_down {
            tracing::info!(breaker = self.name, "Circuit breaker half-open, probing backend");
            self.transition(&mut inner, CircuitState::HalfOpen);
            inner.half_open_successes = 0;
            Ok(())
        } else {
            Err(CircuitBreakerError::CircuitOpen)
        }
    }

    async fn on_success(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures = 0;

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_successes += 1;
            if inner.half_open_successes >= self.config.success_threshold {
                tracing::info!(breaker = self.name, "Circuit breaker closed");
                self.transition(&mut inner, CircuitState::Closed);
                inner.half_open_successes = 0;
                inner.opened_at = None;
            }
        }
    }

    async fn on_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures += 1;

        let should_open = match inner.state {
            CircuitState::Closed => inner.consecutive_failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if should_open {
            tracing::warn!(
                breaker = self.name,
                failures = inner.consecutive_failures,
                "Circuit breaker opened"
            );
            self.transition(&mut inner, CircuitState::Open);
            inner.half_open_successes = 0;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 2,
            open_for: Duration::from_millis(50),
            success_threshold: 1,
        }
    }

    #[tokio::test]
    async fn test_opens_after_consecutive_failures() {
        let breaker = CircuitBreaker::new("orders", quick_config());

        for _ in 0..2 {
            let result = breaker.call(async { Err::<(), _>("down") }).await;
            assert!(matches!(result, Err(CircuitBreakerError::OperationFailed("down"))));
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        let rejected = breaker.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(rejected, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let breaker = CircuitBreaker::new("orders", quick_config());

        let _ = breaker.call(async { Err::<(), _>("down") }).await;
        let _ = breaker.call(async { Ok::<_, &str>(()) }).await;
        let _ = breaker.call(async { Err::<(), _>("down") }).await;

        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_recovers_through_half_open() {
        let breaker = CircuitBreaker::new("catalog", quick_config());
        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("down") }).await;
        }

        tokio::time::sleep(Duration::from_millis(80)).await;

        let result = breaker.call(async { Ok::<_, &str>(7) }).await;
        assert!(matches!(result, Ok(7)));
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let breaker = CircuitBreaker::new("catalog", quick_config());
        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("down") }).await;
        }

        tokio::time::sleep(Duration::from_millis(80)).await;
        let _ = breaker.call(async { Err::<(), _>("still down") }).await;

        assert_eq!(breaker.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_gauge_follows_state() {
        let gauge = IntGauge::new("test_breaker_state", "test").unwrap();
        let breaker = CircuitBreaker::new("orders", quick_config()).with_gauge(gauge.clone());
        assert_eq!(gauge.get(), 0);

        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("down") }).await;
        }
        assert_eq!(gauge.get(), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let _ = breaker.call(async { Ok::<_, &str>(()) }).await;
        assert_eq!(gauge.get(), 0);
    }

    #[test]
    fn test_gauge_encoding() {
        assert_eq!(CircuitState::Closed.as_gauge(), 0);
        assert_eq!(CircuitState::Open.as_gauge(), 1);
        assert_eq!(CircuitState::HalfOpen.as_gauge(), 2);
    }
}
