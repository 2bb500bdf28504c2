#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use identity_gateway::config::ResilienceConfig;
use identity_gateway::domain::dispatcher::OperationDispatcher;
use identity_gateway::domain::resilience::{Backoff, ResiliencePolicy};
use identity_gateway::domain::transport::{Framing, Transport, TransportFault, TransportResult};
use identity_gateway::{FaultKind, Operation};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Transport that replays a script of results and records every call.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<TransportResult>>,
    fallback: TransportResult,
    calls: AtomicU32,
    seen: Mutex<Vec<(Operation, Bytes)>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = TransportResult>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: fault(),
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Every call beyond the script returns `fallback`.
    pub fn always(fallback: TransportResult) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.seen
            .lock()
            .last()
            .map(|(_, bytes)| serde_json::from_slice(bytes).unwrap())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn framing(&self) -> Framing {
        Framing::Enveloped
    }

    async fn invoke(&self, operation: Operation, payload: Bytes) -> TransportResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push((operation, payload));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn fault() -> TransportResult {
    TransportResult::TransportFault(TransportFault::new(FaultKind::Connect, "connection refused"))
}

pub fn ok(body: &Value) -> TransportResult {
    TransportResult::Success(Bytes::from(body.to_string()))
}

pub fn envelope(data: Value) -> Value {
    json!({
        "status": "OK",
        "message": "ok",
        "data": data,
        "timestamp": "2025-01-01T10:00:00Z"
    })
}

pub fn mdn_data() -> Value {
    json!({
        "uuid": "u1",
        "resultCode": "0",
        "resultMessage": "eligible",
        "msisdn": "5555555555",
        "lineType": "PREPAID",
        "provider": "acme",
        "eligible": true,
        "lineStatus": "ACTIVE"
    })
}

pub fn result_data() -> Value {
    json!({"uuid": "u1", "resultCode": "0", "resultMessage": "done"})
}

pub fn resilience(max_attempts: u32, failure_threshold: u32) -> ResilienceConfig {
    ResilienceConfig {
        max_attempts,
        failure_threshold,
        backoff: Backoff::fixed(Duration::from_millis(10)),
        ..ResilienceConfig::default()
    }
}

pub fn dispatcher(transport: Arc<ScriptedTransport>, config: &ResilienceConfig) -> OperationDispatcher {
    OperationDispatcher::new(transport, Arc::new(ResiliencePolicy::from_config(config)))
}
