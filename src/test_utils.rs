//! Test doubles shared by the unit tests.
//!
//! [`ScriptedTransport`] replays queued responses in order and records every
//! request it receives, including the (virtual) time it was made.

use crate::api::{QueryParams, RawResponse, Transport};
use crate::error::NytError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub params: QueryParams,
    pub at: Instant,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

enum Scripted {
    Response(RawResponse),
    Failure(String),
}

/// Transport that answers from a queue.
///
/// An empty queue answers `500 script exhausted`, which surfaces as an
/// [`NytError::Upstream`] in the test under way.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn push_json(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.script.lock().unwrap().push_back(Scripted::Response(RawResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_status(&self, status: u16) {
        self.push_json(status, "");
    }

    pub fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Failure(message.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, params: &[(&'static str, String)]) -> Result<RawResponse, NytError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            params: params.to_vec(),
            at: Instant::now(),
        });
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::Failure(message)) => Err(NytError::unavailable(url, message)),
            None => Ok(RawResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "script exhausted".to_string(),
            }),
        }
    }
}

/// Assert two virtual-time durations agree to within timer granularity.
pub fn assert_close(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= Duration::from_millis(5),
        "expected ~{expected:?}, got {actual:?}"
    );
}
