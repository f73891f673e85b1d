//! Scripted upstream for testing without API access.
//!
//! Each path gets a queue of replies. Replies are consumed in order and the
//! last one repeats, so a single scripted reply answers every request.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::error::FetchError;
use super::upstream::{Upstream, UpstreamRequest, UpstreamResponse};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(UpstreamResponse),
    Fail(FetchError),
}

impl MockReply {
    /// A 200 with the given body and no Last-Modified header.
    pub fn ok(body: impl Into<String>) -> Self {
        MockReply::Respond(UpstreamResponse {
            status: 200,
            last_modified: None,
            body: body.into(),
        })
    }

    /// A 200 with the given body and Last-Modified header.
    pub fn ok_modified(body: impl Into<String>, last_modified: impl Into<String>) -> Self {
        MockReply::Respond(UpstreamResponse {
            status: 200,
            last_modified: Some(last_modified.into()),
            body: body.into(),
        })
    }

    /// An empty 304.
    pub fn not_modified() -> Self {
        MockReply::Respond(UpstreamResponse {
            status: 304,
            last_modified: None,
            body: String::new(),
        })
    }

    /// A failure of any kind.
    pub fn fail(err: FetchError) -> Self {
        MockReply::Fail(err)
    }
}

/// Mock upstream that records every request it receives.
#[derive(Debug, Default)]
pub struct MockUpstream {
    replies: Mutex<HashMap<String, VecDeque<MockReply>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
    delay: Option<Duration>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply for `path`.
    pub fn reply(self, path: &str, reply: MockReply) -> Self {
        self.push(path, reply);
        self
    }

    /// Queue a reply for `path` on a shared mock.
    pub fn push(&self, path: &str, reply: MockReply) {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        replies.entry(path.to_string()).or_default().push_back(reply);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of requests received for `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    fn next_reply(&self, path: &str) -> MockReply {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        match replies.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(unscripted),
            Some(queue) => queue.front().cloned().unwrap_or_else(unscripted),
            None => unscripted(),
        }
    }
}

fn unscripted() -> MockReply {
    MockReply::Fail(FetchError::Api {
        status: 404,
        message: "no mock reply scripted".to_string(),
    })
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn get(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let reply = self.next_reply(&request.path);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Respond(response) => Ok(response),
            MockReply::Fail(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> UpstreamRequest {
        UpstreamRequest {
            path: path.to_string(),
            if_modified_since: None,
        }
    }

    #[tokio::test]
    async fn replies_in_order_then_repeat_last() {
        let mock = MockUpstream::new()
            .reply("/routes", MockReply::ok("first"))
            .reply("/routes", MockReply::ok("second"));

        assert_eq!(mock.get(&request("/routes")).await.unwrap().body, "first");
        assert_eq!(mock.get(&request("/routes")).await.unwrap().body, "second");
        assert_eq!(mock.get(&request("/routes")).await.unwrap().body, "second");
        assert_eq!(mock.calls_to("/routes"), 3);
    }

    #[tokio::test]
    async fn unscripted_path_is_not_found() {
        let mock = MockUpstream::new();
        let err = mock.get(&request("/nowhere")).await.unwrap_err();
        assert!(matches!(err, FetchError::Api { status: 404, .. }));
        assert_eq!(mock.requests().len(), 1);
    }
}
