/*!
    Open configuration.
*/

use std::time::Duration;

/**
    Configuration for opening a container.

    The binding itself has no cancellation primitive; callers that need
    timeouts set an I/O deadline here, which the backend applies to its
    blocking reads.
*/
#[derive(Clone, Debug, Default)]
pub struct OpenConfig {
    /// Deadline for blocking I/O inside the native library (None = block
    /// indefinitely).
    pub io_timeout: Option<Duration>,
}

impl OpenConfig {
    /**
        Create a config with default settings (blocking I/O, no deadline).
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Create a config with an I/O deadline for blocking reads.
    */
    pub fn with_io_timeout(timeout: Duration) -> Self {
        Self {
            io_timeout: Some(timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_deadline() {
        assert_eq!(OpenConfig::new().io_timeout, None);
    }

    #[test]
    fn with_io_timeout_sets_deadline() {
        let config = OpenConfig::with_io_timeout(Duration::from_secs(5));
        assert_eq!(config.io_timeout, Some(Duration::from_secs(5)));
    }
}
