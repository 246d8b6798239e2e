//! TCP readiness polling
//!
//! The only retrying component in the system: polls a port at a fixed
//! interval until it accepts a connection or the attempt budget runs out.
//! Its own timeout is fatal like every other failure.

use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::config::ReadinessConfig;

/// What to poll and how long to keep trying
#[derive(Debug, Clone)]
pub struct ReadinessTarget {
    pub host: String,
    pub port: u16,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl ReadinessTarget {
    /// Target for a service port using manifest poll tuning
    pub fn from_config(host: &str, port: u16, config: &ReadinessConfig) -> Self {
        Self {
            host: host.to_string(),
            port,
            interval: Duration::from_secs(config.interval_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Upper bound on time spent polling before the timeout fires
    pub fn total_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Errors from readiness polling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadinessError {
    /// The port never accepted a connection within the attempt budget
    #[error("port {port} did not become ready within {waited_secs}s")]
    Timeout {
        port: u16,
        waited_secs: u64,
    },
}

/// Single non-blocking-ish probe: is the port accepting connections now?
pub fn check(target: &ReadinessTarget) -> bool {
    port_open(&target.host, target.port, target.interval)
}

/// Poll until the port accepts a connection
///
/// Returns the 1-based attempt number that succeeded. Returns immediately
/// on the first successful poll; sleeps `interval` after each failed one.
pub fn wait_until_ready(target: &ReadinessTarget) -> Result<u32, ReadinessError> {
    for attempt in 1..=target.max_attempts {
        if port_open(&target.host, target.port, target.interval) {
            return Ok(attempt);
        }
        thread::sleep(target.interval);
    }

    Err(ReadinessError::Timeout {
        port: target.port,
        waited_secs: target.total_wait().as_secs(),
    })
}

fn port_open(host: &str, port: u16, timeout: Duration) -> bool {
    // Connect timeout is clamped so a black-holed host cannot stall a poll
    // longer than one interval
    let timeout = timeout.max(Duration::from_millis(50));

    let Ok(mut addrs) = (host, port).to_socket_addrs() else {
        return false;
    };

    addrs.any(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Instant;

    fn target(port: u16, interval_ms: u64, attempts: u32) -> ReadinessTarget {
        ReadinessTarget {
            host: "127.0.0.1".to_string(),
            port,
            interval: Duration::from_millis(interval_ms),
            max_attempts: attempts,
        }
    }

    /// Bind on port 0, then drop the listener so the port is free-but-closed
    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_ready_port_returns_on_first_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let start = Instant::now();
        let attempt = wait_until_ready(&target(port, 200, 5)).unwrap();

        assert_eq!(attempt, 1);
        // Success must not burn the full attempt budget
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_unbound_port_times_out_after_budget() {
        let port = closed_port();
        let t = target(port, 20, 3);

        let start = Instant::now();
        let err = wait_until_ready(&t).unwrap_err();

        assert_eq!(
            err,
            ReadinessError::Timeout {
                port,
                waited_secs: t.total_wait().as_secs(),
            }
        );
        // Three failed polls sleep the interval three times
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_check_reflects_port_state() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(check(&target(port, 100, 1)));

        let port = closed_port();
        assert!(!check(&target(port, 100, 1)));
    }

    #[test]
    fn test_total_wait() {
        let config = ReadinessConfig {
            interval_secs: 3,
            max_attempts: 30,
        };
        let t = ReadinessTarget::from_config("localhost", 5000, &config);
        assert_eq!(t.total_wait(), Duration::from_secs(90));
        assert_eq!(t.interval, Duration::from_secs(3));
        assert_eq!(t.max_attempts, 30);
    }

    #[test]
    fn test_unresolvable_host_is_not_ready() {
        let t = ReadinessTarget {
            host: "definitely-not-a-real-host.invalid".to_string(),
            port: 80,
            interval: Duration::from_millis(20),
            max_attempts: 1,
        };
        assert!(!check(&t));
    }
}
