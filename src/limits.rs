use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;

/// Default archive ceiling: 200 MiB.
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 200 * 1024 * 1024;
/// Base64 grows payloads by ~33%; the rest covers JSON headers and the manifest.
pub const DEFAULT_EXPANSION_FACTOR: f64 = 1.4;

/// Upper bound on the projected archive size, checked before any encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeLimit {
    pub max_archive_size: u64,
    pub expansion_factor: f64,
}

impl Default for SizeLimit {
    fn default() -> Self {
        Self {
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
            expansion_factor: DEFAULT_EXPANSION_FACTOR,
        }
    }
}

impl SizeLimit {
    pub fn new(max_archive_size: u64, expansion_factor: f64) -> Self {
        Self { max_archive_size, expansion_factor }
    }

    /// Estimated archive size for `total` bytes of raw input.
    pub fn projected(&self, total: u64) -> u64 {
        (total as f64 * self.expansion_factor).ceil() as u64
    }

    /// Reject inputs whose projected archive would exceed the ceiling.
    /// A projection exactly at the ceiling is accepted.
    pub fn check(&self, total: u64) -> Result<(), ArchiveError> {
        if total as f64 * self.expansion_factor > self.max_archive_size as f64 {
            return Err(ArchiveError::ArchiveTooLarge {
                actual_size: total,
                limit:       self.max_archive_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ceiling_is_200_mib() {
        let limit = SizeLimit::default();
        assert_eq!(limit.max_archive_size, 209_715_200);
        assert!(limit.check(100 * 1024 * 1024).is_ok());
        assert!(limit.check(150 * 1024 * 1024).is_err());
    }

    #[test]
    fn boundary_is_inclusive() {
        let limit = SizeLimit::new(1400, 1.4);
        assert!(limit.check(1000).is_ok());
        match limit.check(1001) {
            Err(ArchiveError::ArchiveTooLarge { actual_size, limit }) => {
                assert_eq!(actual_size, 1001);
                assert_eq!(limit, 1400);
            }
            other => panic!("expected ArchiveTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn projection_rounds_up() {
        let limit = SizeLimit::new(u64::MAX, 1.5);
        assert_eq!(limit.projected(3), 5);
        assert_eq!(limit.projected(0), 0);
    }
}
