#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use sceneit_core::{LoadFailure, Resource};
use sceneit_infra::Fetcher;
use serde_json::Value;
use tokio::sync::oneshot;

#[derive(Clone)]
pub enum Reply {
    Ok(Value),
    Fail(LoadFailure),
    Hang,
}

/// Answers by `Resource::describe()`. Anything unscripted is a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, request: &str, body: Value) -> Self {
        self.set(request, Reply::Ok(body));
        self
    }

    pub fn status(self, request: &str, status: u16, message: &str) -> Self {
        self.set(
            request,
            Reply::Fail(LoadFailure::network(Some(status), message)),
        );
        self
    }

    pub fn hang(self, request: &str) -> Self {
        self.set(request, Reply::Hang);
        self
    }

    pub fn set(&self, request: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(request.to_string(), reply);
    }

    /// Holds `request` until the returned sender fires or is dropped.
    pub fn gate(&self, request: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(request.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, resource: &Resource) -> Result<Value, LoadFailure> {
        let request = resource.describe();
        self.calls.lock().unwrap().push(request.clone());

        let gate = self.gates.lock().unwrap().remove(&request);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let reply = self.replies.lock().unwrap().get(&request).cloned();
        match reply {
            Some(Reply::Ok(v)) => Ok(v),
            Some(Reply::Fail(e)) => Err(e),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(LoadFailure::network(Some(404), "Not Found")),
        }
    }
}
