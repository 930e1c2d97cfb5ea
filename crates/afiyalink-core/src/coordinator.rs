//! Single-flight request coordination
//!
//! A `RequestCoordinator` sits between user-entered text and a `Transport`.
//! It appends the user's message before anything is sent, allows at most
//! one request in flight, and turns whatever the transport returns into
//! exactly one agent message.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::shape::RequestShape;
use crate::state::{Message, RequestState, Session};
use crate::transport::{Transport, TransportError};

/// Agent text shown when the transport fails for any reason
pub const TRANSPORT_FAILURE_TEXT: &str = "system error, try again";

/// Identifies one dispatched request
pub type Ticket = u64;

/// A request that has been accepted and is waiting to be sent
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub body: Value,
}

type InFlight = (Ticket, JoinHandle<Result<Value, TransportError>>);

pub struct RequestCoordinator {
    transport: Arc<dyn Transport>,
    shape: RequestShape,
    session: Option<Session>,
    pending: Option<Ticket>,
    next_ticket: Ticket,
    task: Option<InFlight>,
}

impl RequestCoordinator {
    pub fn new(transport: Arc<dyn Transport>, shape: RequestShape) -> Self {
        Self {
            transport,
            shape,
            session: None,
            pending: None,
            next_ticket: 0,
            task: None,
        }
    }

    /// `None` until the first accepted submit
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        self.session.as_ref().map(Session::messages).unwrap_or(&[])
    }

    pub fn state(&self) -> RequestState {
        self.session
            .as_ref()
            .map(Session::state)
            .unwrap_or_default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn shape(&self) -> &RequestShape {
        &self.shape
    }

    pub(crate) fn shape_mut(&mut self) -> &mut RequestShape {
        &mut self.shape
    }

    /// Send `text` and wait for the outcome to land in the log.
    ///
    /// Returns `false` without touching the transport when the text is blank
    /// or a request is already pending.
    pub async fn submit(&mut self, text: &str) -> bool {
        let Some(request) = self.begin(text) else {
            return false;
        };
        let result = self.transport.send(&request.body).await;
        self.settle(request.ticket, result);
        true
    }

    /// Accept `text`: append it to the log and mark the session pending.
    pub fn begin(&mut self, text: &str) -> Option<PendingRequest> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(ticket) = self.pending {
            tracing::debug!(ticket, "submit ignored, request already pending");
            return None;
        }

        let session = self.session.get_or_insert_with(Session::new);
        session.push(Message::user(text));
        session.set_state(RequestState::Pending);

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.pending = Some(ticket);

        Some(PendingRequest {
            ticket,
            body: self.shape.body(text),
        })
    }

    /// Apply a transport result for `ticket`.
    ///
    /// Returns `false` if `ticket` is not the pending request; the log is
    /// left untouched in that case.
    pub fn settle(&mut self, ticket: Ticket, result: Result<Value, TransportError>) -> bool {
        if self.pending != Some(ticket) {
            tracing::warn!(ticket, pending = ?self.pending, "ignoring stale settlement");
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        self.pending = None;

        match result {
            Ok(payload) => {
                session.push(Message::agent(self.shape.reply_text(&payload)));
                session.set_last_reply(self.shape.extract_reply(&payload));
                session.set_state(RequestState::Fulfilled);
            }
            Err(e) => {
                tracing::warn!(ticket, error = %e, "transport failure");
                session.push(Message::agent(TRANSPORT_FAILURE_TEXT));
                session.set_last_reply(None);
                session.set_state(RequestState::Failed);
            }
        }
        session.set_state(RequestState::Idle);
        true
    }

    /// Accept `text` and run the transport call in the background.
    ///
    /// Call `poll_settled` from the event loop to pick up the result.
    pub fn dispatch(&mut self, text: &str) -> bool {
        let Some(request) = self.begin(text) else {
            return false;
        };
        let transport = Arc::clone(&self.transport);
        let handle = tokio::spawn(async move { transport.send(&request.body).await });
        self.task = Some((request.ticket, handle));
        true
    }

    /// Apply the background result if the call has finished.
    pub async fn poll_settled(&mut self) -> bool {
        let finished = matches!(&self.task, Some((_, handle)) if handle.is_finished());
        if !finished {
            return false;
        }
        self.wait_settled().await
    }

    /// Wait for the background call, if any, and apply its result.
    pub async fn wait_settled(&mut self) -> bool {
        let Some((ticket, handle)) = self.task.take() else {
            return false;
        };
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(TransportError::Network(format!("request task failed: {}", e))),
        };
        self.settle(ticket, result)
    }

    /// Start a new conversation. Refused while a request is pending.
    pub fn reset(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.session = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    use crate::state::Sender;

    /// Replies `{"response": "echo: <message>"}` and records every body
    #[derive(Default)]
    struct EchoTransport {
        bodies: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send(&self, body: &Value) -> Result<Value, TransportError> {
            self.bodies.lock().unwrap().push(body.clone());
            let message = body["message"].as_str().unwrap_or_default();
            Ok(json!({ "response": format!("echo: {}", message) }))
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _body: &Value) -> Result<Value, TransportError> {
            Err(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    /// Holds every request until the gate is opened
    #[derive(Default)]
    struct GatedTransport {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn send(&self, _body: &Value) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(json!({ "response": "done" }))
        }
    }

    fn chat_shape() -> RequestShape {
        RequestShape::new("message", "response")
    }

    fn texts(coordinator: &RequestCoordinator) -> Vec<(Sender, String)> {
        coordinator
            .messages()
            .iter()
            .map(|m| (m.sender(), m.text().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_blank_text_is_ignored() {
        let transport = Arc::new(EchoTransport::default());
        let mut coordinator = RequestCoordinator::new(transport.clone(), chat_shape());

        assert!(!coordinator.submit("").await);
        assert!(!coordinator.submit("   \n\t").await);

        assert!(coordinator.session().is_none());
        assert!(transport.bodies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_appends_user_then_agent() {
        let transport = Arc::new(EchoTransport::default());
        let mut coordinator = RequestCoordinator::new(transport.clone(), chat_shape());

        assert!(coordinator.submit("  where is the nearest clinic?  ").await);

        assert_eq!(
            texts(&coordinator),
            vec![
                (Sender::User, "where is the nearest clinic?".to_string()),
                (Sender::Agent, "echo: where is the nearest clinic?".to_string()),
            ]
        );
        assert_eq!(coordinator.state(), RequestState::Idle);
        assert_eq!(
            coordinator.session().unwrap().last_outcome(),
            Some(RequestState::Fulfilled)
        );
        assert_eq!(transport.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_appends_fixed_error_text() {
        let mut coordinator = RequestCoordinator::new(Arc::new(FailingTransport), chat_shape());

        assert!(coordinator.submit("hello").await);

        assert_eq!(
            texts(&coordinator),
            vec![
                (Sender::User, "hello".to_string()),
                (Sender::Agent, TRANSPORT_FAILURE_TEXT.to_string()),
            ]
        );
        assert_eq!(coordinator.state(), RequestState::Idle);
        assert_eq!(
            coordinator.session().unwrap().last_outcome(),
            Some(RequestState::Failed)
        );
    }

    #[tokio::test]
    async fn test_missing_reply_field_uses_fallback() {
        struct EmptyTransport;

        #[async_trait]
        impl Transport for EmptyTransport {
            async fn send(&self, _body: &Value) -> Result<Value, TransportError> {
                Ok(json!({ "intent": "greeting" }))
            }
        }

        let shape = chat_shape().missing_reply("no answer");
        let mut coordinator = RequestCoordinator::new(Arc::new(EmptyTransport), shape);
        coordinator.submit("hi").await;

        assert_eq!(coordinator.messages()[1].text(), "no answer");
        assert_eq!(
            coordinator.session().unwrap().last_outcome(),
            Some(RequestState::Fulfilled)
        );
    }

    #[test]
    fn test_last_reply_cleared_by_fallback_and_failure() {
        let mut coordinator =
            RequestCoordinator::new(Arc::new(EchoTransport::default()), chat_shape());
        let last_reply = |c: &RequestCoordinator| {
            c.session()
                .and_then(|s| s.last_reply())
                .map(str::to_string)
        };

        let request = coordinator.begin("one").unwrap();
        coordinator.settle(request.ticket, Ok(json!({ "response": "Rest and fluids." })));
        assert_eq!(last_reply(&coordinator).as_deref(), Some("Rest and fluids."));

        let request = coordinator.begin("two").unwrap();
        coordinator.settle(request.ticket, Ok(json!({ "detail": "no answer" })));
        assert_eq!(last_reply(&coordinator), None);

        let request = coordinator.begin("three").unwrap();
        coordinator.settle(request.ticket, Ok(json!({ "response": "See a doctor." })));
        let request = coordinator.begin("four").unwrap();
        coordinator.settle(
            request.ticket,
            Err(TransportError::Network("connection refused".to_string())),
        );
        assert_eq!(last_reply(&coordinator), None);
        assert_eq!(
            coordinator.session().unwrap().last_agent_text(),
            Some(TRANSPORT_FAILURE_TEXT)
        );
    }

    #[tokio::test]
    async fn test_second_dispatch_while_pending_is_ignored() {
        let transport = Arc::new(GatedTransport::default());
        let mut coordinator = RequestCoordinator::new(transport.clone(), chat_shape());

        assert!(coordinator.dispatch("first"));
        assert!(coordinator.is_pending());
        assert!(!coordinator.dispatch("second"));
        assert!(coordinator.begin("third").is_none());
        assert_eq!(coordinator.messages().len(), 1);

        transport.gate.notify_one();
        assert!(coordinator.wait_settled().await);

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            texts(&coordinator),
            vec![
                (Sender::User, "first".to_string()),
                (Sender::Agent, "done".to_string()),
            ]
        );
        assert_eq!(coordinator.state(), RequestState::Idle);
        assert!(coordinator.dispatch("second"));
    }

    #[tokio::test]
    async fn test_poll_settled_waits_for_completion() {
        let transport = Arc::new(GatedTransport::default());
        let mut coordinator = RequestCoordinator::new(transport.clone(), chat_shape());

        assert!(!coordinator.poll_settled().await);
        coordinator.dispatch("hello");
        assert!(!coordinator.poll_settled().await);
        assert_eq!(coordinator.state(), RequestState::Pending);

        transport.gate.notify_one();
        while !coordinator.poll_settled().await {
            tokio::task::yield_now().await;
        }
        assert_eq!(coordinator.messages().len(), 2);
        assert_eq!(coordinator.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn test_sequential_submits_keep_order() {
        let transport = Arc::new(EchoTransport::default());
        let mut coordinator = RequestCoordinator::new(transport.clone(), chat_shape());

        for text in ["one", "two", "three"] {
            assert!(coordinator.submit(text).await);
        }

        let log: Vec<String> = coordinator
            .messages()
            .iter()
            .map(|m| m.text().to_string())
            .collect();
        assert_eq!(
            log,
            vec!["one", "echo: one", "two", "echo: two", "three", "echo: three"]
        );
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut coordinator =
            RequestCoordinator::new(Arc::new(EchoTransport::default()), chat_shape());

        let request = coordinator.begin("hello").unwrap();
        assert!(!coordinator.settle(request.ticket + 1, Ok(json!({ "response": "late" }))));
        assert_eq!(coordinator.messages().len(), 1);
        assert_eq!(coordinator.state(), RequestState::Pending);

        assert!(coordinator.settle(request.ticket, Ok(json!({ "response": "on time" }))));
        assert_eq!(coordinator.messages()[1].text(), "on time");

        // Already settled
        assert!(!coordinator.settle(request.ticket, Ok(json!({ "response": "again" }))));
        assert_eq!(coordinator.messages().len(), 2);
    }

    #[test]
    fn test_begin_builds_body_from_shape() {
        let shape = RequestShape::chat("visitor-7", "fr");
        let mut coordinator = RequestCoordinator::new(Arc::new(EchoTransport::default()), shape);

        let request = coordinator.begin("j'ai de la fièvre").unwrap();
        assert_eq!(request.body["message"], "j'ai de la fièvre");
        assert_eq!(request.body["user_id"], "visitor-7");
        assert_eq!(request.body["language"], "fr");
    }

    #[test]
    fn test_reset_refused_while_pending() {
        let mut coordinator =
            RequestCoordinator::new(Arc::new(EchoTransport::default()), chat_shape());

        let request = coordinator.begin("hello").unwrap();
        assert!(!coordinator.reset());
        coordinator.settle(request.ticket, Err(TransportError::Network("down".into())));
        assert!(coordinator.reset());
        assert!(coordinator.session().is_none());
        assert_eq!(coordinator.state(), RequestState::Idle);
    }
}
