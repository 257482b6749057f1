// shared/src/lib.rs

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Time-to-live in milliseconds. Absent means no expiration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlMs(pub u64);

impl TtlMs {
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for TtlMs {
    fn from(d: Duration) -> Self {
        TtlMs(d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_ms_duration_conversion() {
        assert_eq!(TtlMs(1500).as_duration(), Duration::from_millis(1500));
        assert_eq!(TtlMs::from(Duration::from_secs(2)), TtlMs(2000));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::InvalidKey("key is empty".into()).to_string(),
            "invalid key: key is empty"
        );
        assert_eq!(Error::Internal("oops".into()).to_string(), "internal: oops");
    }
}
