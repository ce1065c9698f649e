//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::clock::Clock;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError, TransportFuture};

/// Scripted transport that returns pre-seeded responses in FIFO order.
///
/// Every request is recorded so tests can assert on URLs, headers and
/// bodies. Clones share the same script and request log.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    /// Creates a transport with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an explicit result.
    pub fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Queues a response with the given status and body.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.push(Ok(HttpResponse::new(status, body)));
    }

    /// Queues a successful token response.
    pub fn push_token(&self) {
        self.push_response(200, r#"{"access_token":"test-token"}"#);
    }

    /// Queues a timeout.
    pub fn push_timeout(&self) {
        self.push(Err(TransportError::Timeout {
            url: String::from("scripted"),
        }));
    }

    /// Queues a connection failure.
    pub fn push_network_error(&self, message: &str) {
        self.push(Err(TransportError::Request {
            url: String::from("scripted"),
            message: message.to_owned(),
        }));
    }

    /// Returns every request sent so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many scripted responses are still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Box::pin(async move {
            next.unwrap_or_else(|| {
                Err(TransportError::Request {
                    url,
                    message: String::from("no scripted response available"),
                })
            })
        })
    }
}

/// Clock frozen at a fixed instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Parses an RFC 3339 timestamp.
    ///
    /// # Panics
    ///
    /// Panics when `value` is not valid RFC 3339; intended for test fixtures.
    #[must_use]
    pub fn at(value: &str) -> Self {
        let instant = DateTime::parse_from_rfc3339(value)
            .unwrap_or_else(|err| panic!("fixture timestamp {value} should parse: {err}"));
        Self(instant.with_timezone(&Utc))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Produces an inventory page envelope with an optional `_links.next`.
#[must_use]
pub fn json_instances_page(instances: &[(&str, &str)], next: Option<&str>) -> String {
    let items = instances
        .iter()
        .map(|(id, name)| format!("{{\"instanceId\":\"{id}\",\"displayName\":\"{name}\"}}"))
        .collect::<Vec<_>>()
        .join(",");
    let next_json = next.map_or_else(|| String::from("null"), |link| format!("\"{link}\""));
    format!("{{\"data\":[{items}],\"_links\":{{\"next\":{next_json}}}}}")
}

/// Produces a snapshot listing envelope.
#[must_use]
pub fn json_snapshots(snapshots: &[(&str, &str)]) -> String {
    let items = snapshots
        .iter()
        .map(|(id, created)| {
            format!("{{\"snapshotId\":\"{id}\",\"name\":\"{id}\",\"createdDate\":\"{created}\"}}")
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{\"data\":[{items}]}}")
}

/// Produces the body returned by a successful snapshot create.
#[must_use]
pub fn json_created_snapshot(snapshot_id: &str, name: &str) -> String {
    format!(
        "{{\"data\":[{{\"snapshotId\":\"{snapshot_id}\",\"name\":\"{name}\",\"createdDate\":\"2099-01-01T00:00:00Z\"}}]}}"
    )
}
