//! Mock broadcaster for testing
//!
//! Records every broadcast so tests can count side effects.

use super::traits::*;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// A broadcast captured by [`MockBroadcaster`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentBroadcast {
    pub event: String,
    pub payload: Option<Value>,
}

/// Mock broadcaster for testing
#[derive(Clone, Default)]
pub struct MockBroadcaster {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    sent: Vec<SentBroadcast>,
    fail_with: Option<BroadcastError>,
}

impl MockBroadcaster {
    /// Create new mock broadcaster
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following broadcast fail with `err`
    pub fn fail_with(&self, err: BroadcastError) {
        self.state.lock().unwrap().fail_with = Some(err);
    }

    /// Get sent broadcasts for assertions
    pub fn sent(&self) -> Vec<SentBroadcast> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Event names in send order
    pub fn event_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|b| b.event.clone())
            .collect()
    }

    /// How many times `event` was broadcast
    pub fn count(&self, event: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|b| b.event == event)
            .count()
    }

    /// Clear all state
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        *state = MockState::default();
    }
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    async fn broadcast(&self, event: &str, payload: Option<Value>) -> BroadcastResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.fail_with {
            return Err(err.clone());
        }
        state.sent.push(SentBroadcast {
            event: event.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_broadcasts() {
        let mock = MockBroadcaster::new();
        mock.broadcast("a", None).await.unwrap();
        mock.broadcast("b", Some(json!({"name": "foo"}))).await.unwrap();
        mock.broadcast("a", None).await.unwrap();

        assert_eq!(mock.event_names(), vec!["a", "b", "a"]);
        assert_eq!(mock.count("a"), 2);
        assert_eq!(mock.sent()[1].payload, Some(json!({"name": "foo"})));
    }

    #[tokio::test]
    async fn test_fail_with() {
        let mock = MockBroadcaster::new();
        mock.fail_with(BroadcastError::Transport("down".to_string()));

        let result = mock.broadcast("a", None).await;
        assert_eq!(result, Err(BroadcastError::Transport("down".to_string())));
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let mock = MockBroadcaster::new();
        mock.broadcast("a", None).await.unwrap();
        mock.clear();
        assert!(mock.sent().is_empty());
    }
}
