//! Per-connection request handling.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use super::LISTENER_TARGET;
use super::http::{HttpRequest, ResponseWriter, Status, read_request};
use crate::dispatch::{ActionEnvelope, DispatchTable, JobResponse};
use crate::jobs::JobSender;

/// Body returned by the liveness check.
pub const READY_MESSAGE: &str = "Appium-HCP Socket Server Ready";

const ALIVE_PREFIX: &str = "/alive";
const ACTION_PREFIX: &str = "/action";

/// Handles accepted connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream);
}

/// Serves the liveness check and the action endpoint.
///
/// Action requests are decoded on the connection thread; only typed
/// requests cross into the job queue.
pub(crate) struct BridgeHandler {
    dispatch: Arc<DispatchTable>,
    jobs: JobSender,
}

impl BridgeHandler {
    pub(crate) fn new(dispatch: Arc<DispatchTable>, jobs: JobSender) -> Self {
        Self { dispatch, jobs }
    }

    /// Reads one request from `stream` and writes the reply.
    pub(crate) fn serve<S: Read + Write>(&self, mut stream: S) {
        let request = match read_request(&mut stream) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!(target: LISTENER_TARGET, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: LISTENER_TARGET, %error, "failed to read request");
                let body = error_body("TransportError", &error.to_string());
                let _ = ResponseWriter::new(&mut stream).write_json(Status::BadRequest, &body);
                return;
            }
        };

        let mut writer = ResponseWriter::new(&mut stream);
        let written = match route(&request.path) {
            Route::Alive => writer.write_text(Status::Ok, READY_MESSAGE),
            Route::Action => {
                let (status, body) = self.action(&request);
                writer.write_json(status, &body)
            }
            Route::Unknown => {
                debug!(target: LISTENER_TARGET, path = %request.path, "unknown endpoint");
                let message = format!("no endpoint at '{}'", request.path);
                writer.write_json(Status::NotFound, &error_body("NotFound", &message))
            }
        };
        if let Err(error) = written {
            warn!(target: LISTENER_TARGET, %error, "failed to write response");
        }
    }

    fn action(&self, request: &HttpRequest) -> (Status, String) {
        let decoded = ActionEnvelope::parse(&request.body)
            .and_then(|envelope| self.dispatch.construct(&envelope));
        let action = match decoded {
            Ok(Some(action)) => action,
            Ok(None) => return (Status::Ok, JobResponse::Empty.to_body()),
            Err(error) => {
                warn!(target: LISTENER_TARGET, %error, "rejected action envelope");
                return (Status::BadRequest, error_body(error.kind(), &error.to_string()));
            }
        };

        debug!(
            target: LISTENER_TARGET,
            method = %request.method,
            action = action.action(),
            "queueing action"
        );
        match self.jobs.submit(action).wait() {
            Ok(completion) => (Status::Ok, completion.response.to_body()),
            Err(error) => {
                warn!(target: LISTENER_TARGET, %error, "job abandoned");
                (
                    Status::ServiceUnavailable,
                    error_body("JobAbandoned", &error.to_string()),
                )
            }
        }
    }
}

impl ConnectionHandler for BridgeHandler {
    fn handle(&self, stream: TcpStream) {
        self.serve(stream);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Alive,
    Action,
    Unknown,
}

fn route(path: &str) -> Route {
    if path.starts_with(ALIVE_PREFIX) {
        Route::Alive
    } else if path.starts_with(ACTION_PREFIX) {
        Route::Action
    } else {
        Route::Unknown
    }
}

fn error_body(kind: &str, message: &str) -> String {
    json!({ "error": kind, "message": message }).to_string()
}

#[cfg(test)]
mod tests {
    use std::thread;

    use hcp_scene::{ComponentSpec, ReflectionTable, Scene};
    use rstest::rstest;

    use super::*;
    use crate::jobs::job_queue;
    use crate::transport::test_utils::{MemoryStream, post_action};

    #[rstest]
    #[case("/alive", Route::Alive)]
    #[case("/alive?ping=1", Route::Alive)]
    #[case("/action", Route::Action)]
    #[case("/", Route::Unknown)]
    #[case("/session", Route::Unknown)]
    fn routes_by_prefix(#[case] path: &str, #[case] expected: Route) {
        assert_eq!(route(path), expected);
    }

    fn handler() -> (BridgeHandler, crate::jobs::JobPump) {
        let (sender, pump) = job_queue(ReflectionTable::new());
        (
            BridgeHandler::new(Arc::new(DispatchTable::standard()), sender),
            pump,
        )
    }

    #[test]
    fn liveness_check_bypasses_the_queue() {
        let (handler, _pump) = handler();
        let mut stream = MemoryStream::new("GET /alive HTTP/1.1\r\n\r\n");
        handler.serve(&mut stream);
        assert_eq!(stream.status(), 200);
        assert_eq!(stream.body(), READY_MESSAGE);
        assert!(handler.jobs.is_empty());
    }

    #[rstest]
    #[case(r#"{"cmd":"quit"}"#, "UnknownCommand")]
    #[case("not json", "DecodeError")]
    #[case(r#"{"cmd":"action","action":"find","params":{"strategy":"css","selector":"a"}}"#,
        "DecodeError")]
    fn decode_failures_are_rejected_without_queueing(#[case] body: &str, #[case] kind: &str) {
        let (handler, _pump) = handler();
        let mut stream = MemoryStream::new(&post_action(body));
        handler.serve(&mut stream);
        assert_eq!(stream.status(), 400);
        assert!(stream.body().contains(kind));
        assert!(handler.jobs.is_empty());
    }

    #[test]
    fn unrecognised_actions_answer_with_an_empty_object() {
        let (handler, _pump) = handler();
        let mut stream = MemoryStream::new(&post_action(r#"{"cmd":"action","action":"tap"}"#));
        handler.serve(&mut stream);
        assert_eq!(stream.status(), 200);
        assert_eq!(stream.body(), "{}");
        assert!(handler.jobs.is_empty());
    }

    #[test]
    fn unknown_endpoints_are_not_found() {
        let (handler, _pump) = handler();
        let mut stream = MemoryStream::new("GET /status HTTP/1.1\r\n\r\n");
        handler.serve(&mut stream);
        assert_eq!(stream.status(), 404);
    }

    #[test]
    fn actions_wait_for_the_frame_loop() {
        let (handler, mut pump) = handler();
        let handler = Arc::new(handler);
        let mut scene = Scene::default();
        let foo = scene.spawn(None, "Foo").expect("foo");
        scene.attach(foo, ComponentSpec::new("Button")).expect("button");

        let worker = {
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                let body = r#"{"cmd":"action","action":"find",
                    "params":{"strategy":"name","selector":"Foo"}}"#;
                let mut stream = MemoryStream::new(&post_action(body));
                handler.serve(&mut stream);
                stream
            })
        };
        while pump.tick(&mut scene).is_none() {
            thread::yield_now();
        }
        let stream = worker.join().expect("join");
        assert_eq!(stream.status(), 200);
        assert!(stream.body().starts_with(r#"{"ELEMENT":""#));
    }

    #[test]
    fn abandoned_jobs_are_service_unavailable() {
        let (handler, pump) = handler();
        drop(pump);
        let mut stream = MemoryStream::new(&post_action(r#"{"cmd":"action","action":"source"}"#));
        handler.serve(&mut stream);
        assert_eq!(stream.status(), 503);
        assert!(stream.body().contains("JobAbandoned"));
    }
}
