//! Routes decoded messages to method handlers
//!
//! Handlers are registered per method name. Each one decodes its typed
//! params, runs against the session context, and (for requests) encodes a
//! result. Lifecycle ordering is enforced here, before any handler runs.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, error_span, warn};

use crate::lsp::context::{SessionContext, SessionState};
use crate::rpc::{ErrorCode, Message, Notification, ParseError, Request, Response, ResponseError};

pub const INITIALIZE: &str = "initialize";
pub const EXIT: &str = "exit";

type RequestHandler = Box<dyn Fn(&mut SessionContext, Value) -> Result<Value, ResponseError> + Send + Sync>;
type NotificationHandler = Box<dyn Fn(&mut SessionContext, Value) -> Result<(), ResponseError> + Send + Sync>;

enum Route {
    Request(RequestHandler),
    Notification(NotificationHandler),
}

#[derive(Default)]
pub struct Dispatcher {
    routes: HashMap<&'static str, Route>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_request<P, R>(
        mut self,
        method: &'static str,
        handler: fn(&mut SessionContext, P) -> Result<R, ResponseError>,
    ) -> Self
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
    {
        let route = move |context: &mut SessionContext, params: Value| -> Result<Value, ResponseError> {
            let params = serde_json::from_value::<P>(params).map_err(ResponseError::invalid_params)?;
            let result = handler(context, params)?;
            serde_json::to_value(result)
                .map_err(|e| ResponseError::new(ErrorCode::InternalError, e.to_string()))
        };
        self.routes.insert(method, Route::Request(Box::new(route)));
        self
    }

    pub fn on_notification<P>(
        mut self,
        method: &'static str,
        handler: fn(&mut SessionContext, P) -> Result<(), ResponseError>,
    ) -> Self
    where
        P: DeserializeOwned + 'static,
    {
        let route = move |context: &mut SessionContext, params: Value| -> Result<(), ResponseError> {
            let params = serde_json::from_value::<P>(params).map_err(ResponseError::invalid_params)?;
            handler(context, params)
        };
        self.routes.insert(method, Route::Notification(Box::new(route)));
        self
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods: Vec<&'static str> = self.routes.keys().copied().collect();
        methods.sort_unstable();
        methods
    }

    /// Decode one payload and handle it. Returns the messages to send back,
    /// in order.
    ///
    /// Everything logged while the payload is handled, handler failures
    /// included, carries the raw payload as the `content` field of the
    /// `message` span.
    pub fn handle_payload(&self, context: &mut SessionContext, payload: &[u8]) -> Vec<Message> {
        let span = error_span!("message", content = %String::from_utf8_lossy(payload));
        let _entered = span.enter();

        match Message::decode(payload) {
            Ok(message) => {
                debug!(
                    method = message.method().unwrap_or("<response>"),
                    "Received message"
                );
                self.handle(context, message)
            }
            Err(e) => {
                warn!(error = %e, "Failed to decode message");
                let Some(id) = e.id().cloned() else {
                    return Vec::new();
                };
                let code = match e {
                    ParseError::Json(_) => ErrorCode::ParseError,
                    ParseError::InvalidMessage { .. } => ErrorCode::InvalidRequest,
                };
                vec![Response::error(id, ResponseError::new(code, e.to_string())).into()]
            }
        }
    }

    pub fn handle(&self, context: &mut SessionContext, message: Message) -> Vec<Message> {
        match message {
            Message::Request(request) => {
                let mut outgoing = vec![Message::Response(self.handle_request(context, request))];
                outgoing.extend(context.take_outbox());
                outgoing
            }
            Message::Notification(notification) => {
                self.handle_notification(context, notification);
                context.take_outbox()
            }
            Message::Response(response) => {
                debug!("Ignoring response to request {}", response.id);
                Vec::new()
            }
        }
    }

    fn handle_request(&self, context: &mut SessionContext, request: Request) -> Response {
        let Request { id, method, params } = request;

        if let Err(e) = admit_request(context.state, &method) {
            warn!(%method, state = %context.state, "Rejected request: {}", e);
            return Response::error(id, e);
        }

        let handler = match self.routes.get(method.as_str()) {
            Some(Route::Request(handler)) => handler,
            Some(Route::Notification(_)) => {
                warn!(%method, "Notification method sent as a request");
                return Response::error(
                    id,
                    ResponseError::new(
                        ErrorCode::InvalidRequest,
                        format!("{} is a notification", method),
                    ),
                );
            }
            None => {
                warn!(%method, "Unknown request method");
                return Response::error(id, ResponseError::method_not_found(&method));
            }
        };

        match handler(context, params) {
            Ok(result) => Response::ok(id, result),
            Err(e) => {
                error!(%method, "Request failed: {}", e);
                Response::error(id, e)
            }
        }
    }

    fn handle_notification(&self, context: &mut SessionContext, notification: Notification) {
        let Notification { method, params } = notification;

        if !admit_notification(context.state, &method) {
            debug!(%method, state = %context.state, "Dropping notification");
            return;
        }

        match self.routes.get(method.as_str()) {
            Some(Route::Notification(handler)) => {
                if let Err(e) = handler(context, params) {
                    error!(%method, "Notification failed: {}", e);
                }
            }
            Some(Route::Request(_)) => {
                warn!(%method, "Request method sent as a notification, ignoring");
            }
            None => {
                debug!(%method, "Ignoring unknown notification");
            }
        }
    }
}

fn admit_request(state: SessionState, method: &str) -> Result<(), ResponseError> {
    match state {
        SessionState::Uninitialized if method == INITIALIZE => Ok(()),
        SessionState::Uninitialized => Err(ResponseError::new(
            ErrorCode::ServerNotInitialized,
            "Server has not been initialized",
        )),
        SessionState::Initialized if method == INITIALIZE => Err(ResponseError::new(
            ErrorCode::InvalidRequest,
            "Server is already initialized",
        )),
        SessionState::Initialized => Ok(()),
        SessionState::ShuttingDown => Err(ResponseError::new(
            ErrorCode::InvalidRequest,
            "Server is shutting down",
        )),
        SessionState::Terminated => Err(ResponseError::new(
            ErrorCode::InvalidRequest,
            "Session has terminated",
        )),
    }
}

/// `exit` is accepted in any state; everything else only once initialized.
fn admit_notification(state: SessionState, method: &str) -> bool {
    method == EXIT || state == SessionState::Initialized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerRegistry;
    use crate::lsp::diagnostics::DiagnosticsEngine;
    use crate::rpc::Id;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn context_in(state: SessionState) -> SessionContext {
        let engine = Arc::new(DiagnosticsEngine::new(AnalyzerRegistry::new()));
        let mut context = SessionContext::new(engine);
        context.state = state;
        context
    }

    fn echo(_: &mut SessionContext, params: Value) -> Result<Value, ResponseError> {
        Ok(params)
    }

    fn start(context: &mut SessionContext, _: Value) -> Result<Value, ResponseError> {
        context.state = SessionState::Initialized;
        Ok(Value::Null)
    }

    fn finish(context: &mut SessionContext, _: Value) -> Result<(), ResponseError> {
        context.state = SessionState::Terminated;
        Ok(())
    }

    fn shout(context: &mut SessionContext, _: Value) -> Result<(), ResponseError> {
        context.clean_exit = true;
        Ok(())
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new()
            .on_request(INITIALIZE, start)
            .on_request("echo", echo)
            .on_notification("shout", shout)
            .on_notification(EXIT, finish)
    }

    fn request(method: &str, params: Value) -> Message {
        Message::Request(Request {
            id: Id::Number(1),
            method: method.to_string(),
            params,
        })
    }

    fn error_code(messages: &[Message]) -> Option<ErrorCode> {
        match messages {
            [Message::Response(Response { result: Err(e), .. })] => Some(e.code),
            _ => None,
        }
    }

    #[test]
    fn methods_lists_registered_routes() {
        assert_eq!(dispatcher().methods(), vec!["echo", EXIT, INITIALIZE, "shout"]);
    }

    #[test]
    fn handle_routes_request_to_handler() {
        let mut context = context_in(SessionState::Initialized);

        let outgoing = dispatcher().handle(&mut context, request("echo", json!({"a": 1})));

        assert_eq!(
            outgoing,
            vec![Message::Response(Response::ok(Id::Number(1), json!({"a": 1})))]
        );
    }

    #[rstest]
    #[case(SessionState::Uninitialized, "echo", ErrorCode::ServerNotInitialized)]
    #[case(SessionState::Uninitialized, "missing", ErrorCode::ServerNotInitialized)]
    #[case(SessionState::Initialized, "missing", ErrorCode::MethodNotFound)]
    #[case(SessionState::Initialized, INITIALIZE, ErrorCode::InvalidRequest)]
    #[case(SessionState::Initialized, "shout", ErrorCode::InvalidRequest)]
    #[case(SessionState::ShuttingDown, "echo", ErrorCode::InvalidRequest)]
    #[case(SessionState::Terminated, "echo", ErrorCode::InvalidRequest)]
    fn handle_rejects_request(
        #[case] state: SessionState,
        #[case] method: &str,
        #[case] expected: ErrorCode,
    ) {
        let mut context = context_in(state);

        let outgoing = dispatcher().handle(&mut context, request(method, Value::Null));

        assert_eq!(error_code(&outgoing), Some(expected));
    }

    #[test]
    fn handle_replies_invalid_params_when_params_do_not_decode() {
        fn typed(_: &mut SessionContext, params: Vec<u32>) -> Result<usize, ResponseError> {
            Ok(params.len())
        }
        let dispatcher = Dispatcher::new().on_request("typed", typed);
        let mut context = context_in(SessionState::Initialized);

        let outgoing = dispatcher.handle(&mut context, request("typed", json!("nope")));

        assert_eq!(error_code(&outgoing), Some(ErrorCode::InvalidParams));
    }

    #[rstest]
    #[case(SessionState::Uninitialized, false)]
    #[case(SessionState::Initialized, true)]
    #[case(SessionState::ShuttingDown, false)]
    fn handle_gates_notifications_on_state(#[case] state: SessionState, #[case] delivered: bool) {
        let mut context = context_in(state);

        let outgoing = dispatcher().handle(
            &mut context,
            Message::Notification(Notification::new("shout", Value::Null)),
        );

        assert!(outgoing.is_empty());
        assert_eq!(context.clean_exit, delivered);
    }

    #[rstest]
    #[case(SessionState::Uninitialized)]
    #[case(SessionState::Initialized)]
    #[case(SessionState::ShuttingDown)]
    fn handle_accepts_exit_in_any_state(#[case] state: SessionState) {
        let mut context = context_in(state);

        dispatcher().handle(
            &mut context,
            Message::Notification(Notification::new(EXIT, Value::Null)),
        );

        assert_eq!(context.state, SessionState::Terminated);
    }

    #[test]
    fn handle_payload_replies_to_malformed_request_with_id() {
        let mut context = context_in(SessionState::Initialized);

        let outgoing = dispatcher().handle_payload(&mut context, br#"{"jsonrpc":"2.0","id":9,"method":5}"#);

        assert_eq!(error_code(&outgoing), Some(ErrorCode::InvalidRequest));
    }

    #[test]
    fn handle_payload_drops_unparseable_payload() {
        let mut context = context_in(SessionState::Initialized);

        let outgoing = dispatcher().handle_payload(&mut context, b"{\"jsonrpc\":");

        assert!(outgoing.is_empty());
    }

    #[test]
    fn handle_ignores_incoming_responses() {
        let mut context = context_in(SessionState::Initialized);

        let outgoing = dispatcher().handle(
            &mut context,
            Message::Response(Response::ok(Id::Number(4), Value::Null)),
        );

        assert!(outgoing.is_empty());
    }
}
