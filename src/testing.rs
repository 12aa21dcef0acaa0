// ============================================================================
// TEST DOUBLES - scripted backend and navigation recorder
// ============================================================================

use crate::services::transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
use crate::state::navigation::Navigator;
use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// What the mock answers for one request.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    Fail(TransportError),
}

impl MockReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        MockReply::Response(HttpResponse {
            status,
            body: body.to_string().into_bytes(),
        })
    }

    pub fn status(status: u16) -> Self {
        MockReply::Response(HttpResponse { status, body: Vec::new() })
    }

    pub fn network_error(message: &str) -> Self {
        MockReply::Fail(TransportError::Network(message.to_string()))
    }
}

enum Queued {
    Ready(MockReply),
    Deferred(oneshot::Receiver<MockReply>),
}

struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Queued>,
}

impl Route {
    fn matches(&self, method: Method, path_and_query: &str) -> bool {
        if self.method != method {
            return false;
        }
        if self.path.contains('?') {
            self.path == path_and_query
        } else {
            path_and_query.split('?').next() == Some(self.path.as_str())
        }
    }
}

fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.find('/').map(|idx| &rest[idx..]).unwrap_or("/")
}

/// Scripted `HttpTransport`.
///
/// Replies registered for a route are consumed in order; the last ready reply
/// keeps answering once the queue is down to it. Unknown routes answer 404.
/// Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: RefCell<Vec<Route>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, reply: MockReply) {
        self.push(method, path, Queued::Ready(reply));
    }

    /// Registers a reply that is only delivered when the returned sender fires.
    /// Lets a test hold a request in flight while it does something else.
    pub fn on_deferred(&self, method: Method, path: &str) -> oneshot::Sender<MockReply> {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Queued::Deferred(rx));
        tx
    }

    /// Drops every scripted reply for a route.
    pub fn clear_route(&self, method: Method, path: &str) {
        self.routes
            .borrow_mut()
            .retain(|route| !(route.method == method && route.path == path));
    }

    fn push(&self, method: Method, path: &str, queued: Queued) {
        let mut routes = self.routes.borrow_mut();
        match routes.iter_mut().find(|r| r.method == method && r.path == path) {
            Some(route) => route.replies.push_back(queued),
            None => routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([queued]),
            }),
        }
    }

    fn next_reply(&self, method: Method, path_and_query: &str) -> Option<Queued> {
        let mut routes = self.routes.borrow_mut();
        let route = routes.iter_mut().find(|r| r.matches(method, path_and_query))?;
        if route.replies.len() == 1 {
            if let Some(Queued::Ready(reply)) = route.replies.front() {
                return Some(Queued::Ready(reply.clone()));
            }
        }
        route.replies.pop_front()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Number of recorded requests for `method` on `path` (query ignored).
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && path_of(&r.url).split('?').next() == Some(path))
            .count()
    }
}

#[async_trait(?Send)]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method;
        let path = path_of(&request.url).to_string();
        self.requests.borrow_mut().push(request);

        let reply = match self.next_reply(method, &path) {
            Some(Queued::Ready(reply)) => reply,
            Some(Queued::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| MockReply::network_error("deferred reply dropped")),
            None => MockReply::json(404, serde_json::json!({"message": "no mock route"})),
        };

        match reply {
            MockReply::Response(response) => Ok(response),
            MockReply::Fail(err) => Err(err),
        }
    }
}

/// Navigator that only counts how often it was asked to go home.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    home_visits: Cell<usize>,
}

impl RecordingNavigator {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn home_visits(&self) -> usize {
        self.home_visits.get()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_home(&self) {
        self.home_visits.set(self.home_visits.get() + 1);
    }
}
