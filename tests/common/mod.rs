//! Helpers shared by the integration tests.

#![allow(dead_code)]

use arduino_bridge::error::Error;
use arduino_bridge::guard::LightSwitchGuard;
use arduino_bridge::remote::{Params, Remote, Response};
use arduino_bridge::serial::Data;
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use tokio::time;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request received by a [`MockRemote`].
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    /// The state of the observed guard when the request started and when it finished.
    pub guard_blocked: Option<(bool, bool)>,
}

impl Request {
    /// Returns the value of the parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug)]
enum Reply {
    Status(u16, String),
    /// A transport failure.
    Fail,
}

/// A scripted [`Remote`]. Targets that were not scripted fail like an unreachable host.
#[derive(Default)]
pub struct MockRemote {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Request>>,
    latency: Mutex<Duration>,
    guard: Mutex<Option<LightSwitchGuard>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(MockRemote::default())
    }

    /// Answers requests for `target` (path and query) with `status` and `body`.
    pub fn reply(&self, target: &str, status: u16, body: &str) {
        self.replies.lock().unwrap().insert(target.to_string(), Reply::Status(status, body.to_string()));
    }

    /// Fails requests for `target` with a transport error.
    pub fn fail(&self, target: &str) {
        self.replies.lock().unwrap().insert(target.to_string(), Reply::Fail);
    }

    /// Makes every request take `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Records the state of `guard` around each request.
    pub fn observe_guard(&self, guard: &LightSwitchGuard) {
        *self.guard.lock().unwrap() = Some(guard.clone());
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    async fn call(&self, method: Method, path: &str, params: &Params) -> Result<Response, Error> {
        let guard = self.guard.lock().unwrap().clone();
        let blocked_before = guard.as_ref().map(LightSwitchGuard::is_blocked);
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(Request {
                method,
                path: path.to_string(),
                params: params.to_vec(),
                guard_blocked: None,
            });
            requests.len() - 1
        };

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            time::sleep(latency).await;
        }

        if let (Some(before), Some(guard)) = (blocked_before, guard) {
            self.requests.lock().unwrap()[index].guard_blocked = Some((before, guard.is_blocked()));
        }

        let reply = self.replies.lock().unwrap().get(&target(method, path, params)).cloned();
        match reply {
            Some(Reply::Status(status, body)) if (200..300).contains(&status) => {
                Ok(Response { status, body })
            }
            Some(Reply::Status(status, _)) => Err(Error::Remote { status }),
            Some(Reply::Fail) | None => Err(transport_error()),
        }
    }
}

#[async_trait]
impl Remote for MockRemote {
    async fn get(&self, path: &str, query: &Params) -> Result<Response, Error> {
        self.call(Method::Get, path, query).await
    }

    async fn post(&self, path: &str, form: &Params) -> Result<Response, Error> {
        self.call(Method::Post, path, form).await
    }
}

/// Returns the key replies are looked up by. Query parameters are part of the target of a GET
/// but not of a POST.
fn target(method: Method, path: &str, params: &Params) -> String {
    if method == Method::Post || params.is_empty() {
        return path.to_string();
    }

    let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", path, query.join("&"))
}

/// Returns an error like one from a request that never reached the host.
fn transport_error() -> Error {
    let e = reqwest::Client::new()
        .get("http://[unreachable")
        .build()
        .unwrap_err();

    Error::Transport(e)
}

/// Returns all the messages queued for the serial port so far.
pub fn drain(rx: &mut UnboundedReceiver<Data>) -> Vec<String> {
    let mut messages = Vec::new();

    while let Ok(Some(data)) = rx.try_next() {
        messages.push(String::from_utf8(data).unwrap());
    }

    messages
}
