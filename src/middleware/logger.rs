//! Action logging middleware.

use crate::error::{Result, StoreError};
use crate::store::Dispatch;
use crate::types::Action;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Middleware, MiddlewareApi};

/// Where the logger middleware reports to.
pub trait LogSink<S, A>: Send + Sync {
    /// Called before the action enters the rest of the chain.
    fn before(&self, action: &A, state: &S);

    /// Called after the rest of the chain returned successfully.
    fn after(&self, action: &A, state: &S);

    /// Called when the rest of the chain failed.
    fn failed(&self, action_type: &str, error: &StoreError);
}

/// Sink that emits `tracing` events.
pub struct TracingSink<S, A> {
    _marker: PhantomData<fn(&S, &A)>,
}

impl<S, A> TracingSink<S, A> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<S, A> Default for TracingSink<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> LogSink<S, A> for TracingSink<S, A>
where
    S: fmt::Debug,
    A: Action,
{
    fn before(&self, action: &A, state: &S) {
        debug!(action_type = action.action_type(), ?action, prev_state = ?state, "Action");
    }

    fn after(&self, action: &A, state: &S) {
        debug!(action_type = action.action_type(), next_state = ?state, "Action done");
    }

    fn failed(&self, action_type: &str, error: &StoreError) {
        warn!(action_type, %error, "Action failed");
    }
}

/// Reports each action with the state before and after it.
pub struct LoggerMiddleware<S, A> {
    sink: Arc<dyn LogSink<S, A>>,
}

impl<S, A> LoggerMiddleware<S, A>
where
    S: fmt::Debug + 'static,
    A: Action,
{
    /// Log through `tracing`.
    pub fn new() -> Self {
        Self {
            sink: Arc::new(TracingSink::new()),
        }
    }
}

impl<S, A> Default for LoggerMiddleware<S, A>
where
    S: fmt::Debug + 'static,
    A: Action,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> LoggerMiddleware<S, A> {
    pub fn with_sink(sink: Arc<dyn LogSink<S, A>>) -> Self {
        Self { sink }
    }
}

impl<S, A> Middleware<S, A> for LoggerMiddleware<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn handle(&self, api: &MiddlewareApi<S, A>, action: A, next: &Dispatch<A>) -> Result<A> {
        self.sink.before(&action, &api.get_state());
        let action_type = action.action_type().to_string();

        match next(action) {
            Ok(action) => {
                self.sink.after(&action, &api.get_state());
                Ok(action)
            }
            Err(e) => {
                self.sink.failed(&action_type, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReducerError;
    use crate::middleware::apply_middleware;
    use crate::reducer::ReduceResult;
    use crate::store::create_store;
    use crate::types::RawAction;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<String>>,
    }

    impl LogSink<i64, RawAction> for RecordingSink {
        fn before(&self, action: &RawAction, state: &i64) {
            self.lines
                .lock()
                .push(format!("before {} {}", action.action_type, state));
        }

        fn after(&self, action: &RawAction, state: &i64) {
            self.lines
                .lock()
                .push(format!("after {} {}", action.action_type, state));
        }

        fn failed(&self, action_type: &str, _error: &StoreError) {
            self.lines.lock().push(format!("failed {}", action_type));
        }
    }

    fn reducer(state: &Arc<i64>, action: &RawAction) -> ReduceResult<i64> {
        match action.action_type.as_str() {
            "INCREMENT" => Ok(Arc::new(**state + 1)),
            "FAIL" => Err(ReducerError::new("nope")),
            _ => Ok(Arc::clone(state)),
        }
    }

    #[test]
    fn test_logs_before_and_after() {
        let sink = Arc::new(RecordingSink::default());
        let logger: Arc<dyn Middleware<i64, RawAction>> =
            Arc::new(LoggerMiddleware::<i64, RawAction>::with_sink(sink.clone()));
        let store = create_store(reducer, 0, Some(apply_middleware(vec![logger])));

        store.dispatch(RawAction::new("INCREMENT")).unwrap();
        let _ = store.dispatch(RawAction::new("FAIL"));

        assert_eq!(
            *sink.lines.lock(),
            vec![
                "before INCREMENT 0",
                "after INCREMENT 1",
                "before FAIL 1",
                "failed FAIL"
            ]
        );
    }

    #[test]
    fn test_tracing_sink() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();

        let logger: Arc<dyn Middleware<i64, RawAction>> =
            Arc::new(LoggerMiddleware::<i64, RawAction>::new());
        let store = create_store(reducer, 0, Some(apply_middleware(vec![logger])));

        let action = store.dispatch(RawAction::new("INCREMENT")).unwrap();
        assert_eq!(action.action_type, "INCREMENT");
        assert_eq!(*store.get_state(), 1);
    }
}
