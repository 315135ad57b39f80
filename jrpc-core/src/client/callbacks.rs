use super::CallError;
use serde_json::Value;
use std::fmt::{self, Debug};

type Handler<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Completion handlers for [`super::RpcClient::call_with`].
///
/// At most one of them runs per call. A missing handler means that outcome is dropped.
#[derive(Default)]
pub struct Callbacks {
    on_success: Option<Handler<Value>>,
    on_error: Option<Handler<CallError>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs with the `result` value when the call succeeds.
    pub fn on_success(mut self, handler: impl FnOnce(Value) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Runs with the failure when the call fails for any reason.
    pub fn on_error(mut self, handler: impl FnOnce(CallError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub(crate) fn deliver(self, result: Result<Value, CallError>) {
        match result {
            Ok(value) => {
                if let Some(handler) = self.on_success {
                    handler(value);
                }
            }
            Err(err) => {
                if let Some(handler) = self.on_error {
                    handler(err);
                }
            }
        }
    }
}

impl Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
