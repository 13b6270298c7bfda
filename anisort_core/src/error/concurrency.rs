//! Persistence write conflicts

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// The record changed since it was read
    #[error("Stale {entity} record {id}: expected version {expected}, found {found}")]
    StaleRecord {
        entity: &'static str,
        id: i64,
        expected: u32,
        found: u32,
    },

    /// The record was removed since it was read
    #[error("{entity} record {id} no longer exists")]
    Vanished { entity: &'static str, id: i64 },
}

impl ConcurrencyError {
    pub fn stale_record(entity: &'static str, id: i64, expected: u32, found: u32) -> Self {
        Self::StaleRecord {
            entity,
            id,
            expected,
            found,
        }
    }

    pub fn vanished(entity: &'static str, id: i64) -> Self {
        Self::Vanished { entity, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_record_message() {
        let error = ConcurrencyError::stale_record("local_file", 7, 1, 2);
        let message = error.to_string();
        assert!(message.contains("local_file"));
        assert!(message.contains("7"));
        assert!(message.contains("expected version 1"));
    }

    #[test]
    fn test_vanished_message() {
        let error = ConcurrencyError::vanished("local_file", 3);
        assert!(error.to_string().contains("no longer exists"));
    }
}
