//! Dispatch-wrapping middleware.
//!
//! `apply_middleware` folds the middleware list right-to-left around the
//! store's dispatch, so the first middleware is outermost: it sees an action
//! first on the way in and last on the way out.

mod logger;
mod persist;

pub use logger::{LogSink, LoggerMiddleware, TracingSink};
pub use persist::{JsonFileSink, MemorySink, PersistMiddleware, PersistSink};

use crate::error::{Result, StoreError};
use crate::store::{Dispatch, DispatchFn, Enhancer, Store};
use crate::types::Action;
use std::sync::{Arc, OnceLock, Weak};
use tracing::debug;

/// What a middleware can see of the store.
pub struct MiddlewareApi<S, A> {
    store: Store<S, A>,
    dispatch: Arc<OnceLock<Weak<DispatchFn<A>>>>,
}

impl<S, A> MiddlewareApi<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub fn get_state(&self) -> Arc<S> {
        self.store.get_state()
    }

    /// Dispatch through the complete middleware chain, starting again at the
    /// outermost middleware.
    pub fn dispatch(&self, action: A) -> Result<A> {
        let dispatch = self
            .dispatch
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| {
                StoreError::Middleware(format!(
                    "dispatch of {} before the middleware chain was built",
                    action.action_type()
                ))
            })?;
        dispatch(action)
    }
}

/// A stage in the dispatch chain.
///
/// Call `next(action)` to pass the action on; return without calling it to
/// swallow the action. Whatever `next` returns is normally returned as-is.
pub trait Middleware<S, A>: Send + Sync {
    fn handle(&self, api: &MiddlewareApi<S, A>, action: A, next: &Dispatch<A>) -> Result<A>;
}

impl<S, A, F> Middleware<S, A> for F
where
    F: Fn(&MiddlewareApi<S, A>, A, &Dispatch<A>) -> Result<A> + Send + Sync,
{
    fn handle(&self, api: &MiddlewareApi<S, A>, action: A, next: &Dispatch<A>) -> Result<A> {
        self(api, action, next)
    }
}

/// Enhancer that installs a middleware chain.
pub struct ApplyMiddleware<S, A> {
    middlewares: Vec<Arc<dyn Middleware<S, A>>>,
}

impl<S, A> ApplyMiddleware<S, A> {
    pub fn new(middlewares: Vec<Arc<dyn Middleware<S, A>>>) -> Self {
        Self { middlewares }
    }
}

/// Build an enhancer for [`create_store`](crate::store::create_store).
pub fn apply_middleware<S, A>(
    middlewares: Vec<Arc<dyn Middleware<S, A>>>,
) -> Box<dyn Enhancer<S, A>>
where
    S: Send + Sync + 'static,
    A: Action,
{
    Box::new(ApplyMiddleware::new(middlewares))
}

impl<S, A> Enhancer<S, A> for ApplyMiddleware<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn enhance(self: Box<Self>, store: Store<S, A>) -> Store<S, A> {
        let slot = Arc::new(OnceLock::new());
        let api = Arc::new(MiddlewareApi {
            store: store.clone(),
            dispatch: Arc::clone(&slot),
        });

        let dispatch = compose(&self.middlewares, &api, store.dispatcher());
        // The slot is fresh, so this cannot already be set.
        let _ = slot.set(Arc::downgrade(&dispatch));

        debug!(
            store = %store.config().label,
            middlewares = self.middlewares.len(),
            "Middleware applied"
        );
        store.with_dispatch(dispatch)
    }
}

/// Wrap `base` so that `middlewares[0]` runs first.
fn compose<S, A>(
    middlewares: &[Arc<dyn Middleware<S, A>>],
    api: &Arc<MiddlewareApi<S, A>>,
    base: Dispatch<A>,
) -> Dispatch<A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    middlewares.iter().rev().fold(base, |next, middleware| {
        let middleware = Arc::clone(middleware);
        let api = Arc::clone(api);
        Arc::new(move |action: A| middleware.handle(&api, action, &next))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::ReduceResult;
    use crate::store::create_store;
    use crate::types::RawAction;
    use parking_lot::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn tracing_reducer(trace: Trace) -> impl Fn(&Arc<i64>, &RawAction) -> ReduceResult<i64> {
        move |state, action| {
            trace.lock().push(format!("reducer({})", action.action_type));
            match action.action_type.as_str() {
                "INCREMENT" => Ok(Arc::new(**state + 1)),
                _ => Ok(Arc::clone(state)),
            }
        }
    }

    fn recording(name: &'static str, trace: Trace) -> Arc<dyn Middleware<i64, RawAction>> {
        Arc::new(
            move |_api: &MiddlewareApi<i64, RawAction>, action: RawAction, next: &Dispatch<RawAction>| {
                trace
                    .lock()
                    .push(format!("{}-before({})", name, action.action_type));
                let result = next(action);
                trace.lock().push(format!("{}-after", name));
                result
            },
        )
    }

    #[test]
    fn test_onion_order() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let store = create_store(
            tracing_reducer(Arc::clone(&trace)),
            0,
            Some(apply_middleware(vec![
                recording("m1", Arc::clone(&trace)),
                recording("m2", Arc::clone(&trace)),
            ])),
        );

        store.dispatch(RawAction::new("X")).unwrap();
        assert_eq!(
            *trace.lock(),
            vec![
                "m1-before(X)",
                "m2-before(X)",
                "reducer(X)",
                "m2-after",
                "m1-after"
            ]
        );
    }

    #[test]
    fn test_swallowing_middleware() {
        let block: Arc<dyn Middleware<i64, RawAction>> = Arc::new(
            |_api: &MiddlewareApi<i64, RawAction>, action: RawAction, next: &Dispatch<RawAction>| {
                if action.action_type == "BLOCKED" {
                    Ok(action)
                } else {
                    next(action)
                }
            },
        );
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let store = create_store(
            tracing_reducer(Arc::clone(&trace)),
            0,
            Some(apply_middleware(vec![block])),
        );

        store.dispatch(RawAction::new("BLOCKED")).unwrap();
        assert!(trace.lock().is_empty());
        store.dispatch(RawAction::new("INCREMENT")).unwrap();
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn test_api_dispatch_reenters_full_chain() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));

        // Turns DOUBLE into two INCREMENTs sent from the top of the chain.
        let expand: Arc<dyn Middleware<i64, RawAction>> = Arc::new(
            |api: &MiddlewareApi<i64, RawAction>, action: RawAction, next: &Dispatch<RawAction>| {
                if action.action_type == "DOUBLE" {
                    api.dispatch(RawAction::new("INCREMENT"))?;
                    api.dispatch(RawAction::new("INCREMENT"))?;
                    return Ok(action);
                }
                next(action)
            },
        );

        let store = create_store(
            tracing_reducer(Arc::clone(&trace)),
            0,
            Some(apply_middleware(vec![
                recording("outer", Arc::clone(&trace)),
                expand,
            ])),
        );

        let returned = store.dispatch(RawAction::new("DOUBLE")).unwrap();
        assert_eq!(returned.action_type, "DOUBLE");
        assert_eq!(*store.get_state(), 2);

        let outer_entries = trace
            .lock()
            .iter()
            .filter(|e| e.starts_with("outer-before"))
            .count();
        assert_eq!(outer_entries, 3);
    }

    #[test]
    fn test_middleware_sees_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let observe: Arc<dyn Middleware<i64, RawAction>> = Arc::new(
            move |api: &MiddlewareApi<i64, RawAction>, action: RawAction, next: &Dispatch<RawAction>| {
                let before = *api.get_state();
                let result = next(action);
                log.lock().push((before, *api.get_state()));
                result
            },
        );

        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let store = create_store(tracing_reducer(trace), 0, Some(apply_middleware(vec![observe])));
        store.dispatch(RawAction::new("INCREMENT")).unwrap();

        assert_eq!(*seen.lock(), vec![(0, 1)]);
    }
}
