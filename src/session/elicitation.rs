//! Pending elicitation correlation table (spec §3 "Pending Elicitation",
//! §4.E). Invariant: exactly one pending elicitation per id; the reply
//! slot is fulfilled at most once (accept, decline, or cancel).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::PhotonError;

type ReplySlot = Arc<Mutex<Option<oneshot::Sender<Result<Value, PhotonError>>>>>;

pub struct PendingElicitation {
    pub elicitation_id: Uuid,
    pub form_schema: Value,
    pub deadline: DateTime<Utc>,
    slot: ReplySlot,
}

impl PendingElicitation {
    /// Fulfills the slot with `value`, if it has not already been taken by
    /// a reply, a decline, a cancellation, or a timeout. Returns `false`
    /// when the slot was already taken.
    pub fn complete(&self, value: Value) -> bool {
        self.fulfill(Ok(value))
    }

    pub fn decline(&self) -> bool {
        self.fulfill(Err(PhotonError::Cancelled))
    }

    pub fn cancel(&self) -> bool {
        self.fulfill(Err(PhotonError::Cancelled))
    }

    fn fulfill(&self, result: Result<Value, PhotonError>) -> bool {
        if let Some(sender) = self.slot.lock().expect("slot mutex is never poisoned").take() {
            let _ = sender.send(result);
            true
        } else {
            false
        }
    }
}

/// Creates a pending elicitation and a blocking-friendly receiver. The
/// receiver is consumed on a dedicated thread (the invocation is running
/// JS synchronously there, spec §4.D "elicit ... suspends the caller");
/// a background timer races the reply and fulfills the slot with
/// `Cancelled` if the deadline passes first.
pub fn begin(form_schema: Value, timeout: Duration) -> (PendingElicitation, oneshot::Receiver<Result<Value, PhotonError>>) {
    let (tx, rx) = oneshot::channel();
    let slot: ReplySlot = Arc::new(Mutex::new(Some(tx)));

    let timeout_slot = slot.clone();
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        if let Some(sender) = timeout_slot.lock().expect("slot mutex is never poisoned").take() {
            let _ = sender.send(Err(PhotonError::Cancelled));
        }
    });

    let pending = PendingElicitation {
        elicitation_id: Uuid::new_v4(),
        form_schema,
        deadline: Utc::now() + chrono::Duration::from_std(timeout).unwrap_or_default(),
        slot,
    };
    (pending, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_fulfills_exactly_once() {
        let (pending, rx) = begin(Value::Null, Duration::from_secs(5));
        assert!(pending.complete(Value::String("Ada".to_string())));
        assert!(!pending.complete(Value::String("Bob".to_string())));
        let result = rx.await.unwrap();
        assert_eq!(result.unwrap(), Value::String("Ada".to_string()));
    }

    #[tokio::test]
    async fn timeout_cancels_when_unanswered() {
        let (_pending, rx) = begin(Value::Null, Duration::from_millis(10));
        let result = rx.await.unwrap();
        assert!(matches!(result, Err(PhotonError::Cancelled)));
    }
}
