use serde::{Deserialize, Serialize};

/// Outcome of registering an invocation under an idempotency key.
///
/// The ledger insert is conditional: the first writer wins, so two
/// concurrent invocations with the same key can never both observe
/// [`IdempotencyBegin::Started`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyBegin {
    /// No prior invocation with this key; the caller now holds the slot.
    Started,

    /// A prior invocation with this key is still running.
    InFlight,

    /// A prior invocation with this key completed; its stored result.
    Completed(serde_json::Value),
}

/// A ledger row for one keyed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationRecord {
    /// The invocation is running.
    InFlight,

    /// The invocation completed with the stored result payload.
    Completed(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_roundtrip() {
        let record = InvocationRecord::Completed(serde_json::json!({"order_id": "abc"}));
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: InvocationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }
}
