//! Reducer combination over named state slices.

use crate::error::{ReducerError, StoreError};
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use super::{ReduceResult, Reducer};

/// A value that can live in a [`SliceMap`].
///
/// Implemented for every `Debug + Serialize + Send + Sync + 'static` type.
pub trait SliceValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> SliceValue for T
where
    T: Any + fmt::Debug + Serialize + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// State produced by [`combine_reducers`]: slice name to slice value.
///
/// Slices keep the order in which they were inserted. Cloning is shallow;
/// slice values are shared.
#[derive(Clone, Default)]
pub struct SliceMap {
    slices: Vec<(String, Arc<dyn SliceValue>)>,
}

impl SliceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SliceMap::insert`].
    pub fn with_slice<T: SliceValue>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, Arc::new(value));
        self
    }

    /// Insert or replace a slice.
    pub fn insert<T: SliceValue>(&mut self, name: impl Into<String>, value: Arc<T>) {
        self.insert_dyn(name.into(), value);
    }

    fn insert_dyn(&mut self, name: String, value: Arc<dyn SliceValue>) {
        match self.slices.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.slices.push((name, value)),
        }
    }

    /// Typed access. `None` if the slice is missing or holds another type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.try_get(name).ok().flatten()
    }

    /// Typed access that distinguishes a missing slice from a type mismatch.
    pub fn try_get<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>, StoreError> {
        match self.raw(name) {
            None => Ok(None),
            Some(slot) => Arc::clone(slot)
                .into_any()
                .downcast::<T>()
                .map(Some)
                .map_err(|_| StoreError::SliceType {
                    slice: name.to_string(),
                    expected: any::type_name::<T>(),
                }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.raw(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// True if both maps hold the same reference for slice `name`.
    pub fn shares_slice(&self, other: &SliceMap, name: &str) -> bool {
        match (self.raw(name), other.raw(name)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn raw(&self, name: &str) -> Option<&Arc<dyn SliceValue>> {
        self.slices.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl fmt::Debug for SliceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slices.iter().map(|(n, v)| (n, v)))
            .finish()
    }
}

impl Serialize for SliceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slices.len()))?;
        for (name, value) in &self.slices {
            let json = value.to_json().map_err(S::Error::custom)?;
            map.serialize_entry(name, &json)?;
        }
        map.end()
    }
}

/// Type-erased slice reducer. `Ok(None)` means the slice kept its reference.
type SliceFn<A> = Box<
    dyn Fn(Option<&Arc<dyn SliceValue>>, &A) -> Result<Option<Arc<dyn SliceValue>>, ReducerError>
        + Send
        + Sync,
>;

/// Builder for a combined reducer.
pub struct CombineReducers<A> {
    slices: Vec<(String, SliceFn<A>)>,
}

/// Start combining slice reducers.
///
/// ```ignore
/// let root = combine_reducers()
///     .slice("counter", pure(counter::reduce))
///     .slice("user", pure(user::reduce))
///     .build();
/// ```
pub fn combine_reducers<A: 'static>() -> CombineReducers<A> {
    CombineReducers { slices: Vec::new() }
}

impl<A: 'static> CombineReducers<A> {
    /// Register the reducer owning slice `name`.
    ///
    /// A slice missing from the incoming state starts from `T::default()`.
    pub fn slice<T, R>(mut self, name: impl Into<String>, reducer: R) -> Self
    where
        T: SliceValue + Default,
        R: Reducer<T, A> + 'static,
    {
        let name = name.into();
        let key = name.clone();

        let slice_fn: SliceFn<A> = Box::new(move |current, action| {
            let (prev, seeded) = match current {
                Some(slot) => {
                    let typed = Arc::clone(slot).into_any().downcast::<T>().map_err(|_| {
                        ReducerError::from(StoreError::SliceType {
                            slice: key.clone(),
                            expected: any::type_name::<T>(),
                        })
                    })?;
                    (typed, false)
                }
                None => (Arc::new(T::default()), true),
            };

            let next = reducer.reduce(&prev, action)?;
            if !seeded && Arc::ptr_eq(&prev, &next) {
                Ok(None)
            } else {
                Ok(Some(next as Arc<dyn SliceValue>))
            }
        });

        match self.slices.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = slice_fn,
            None => self.slices.push((name, slice_fn)),
        }
        self
    }

    pub fn build(self) -> CombinedReducer<A> {
        CombinedReducer {
            slices: self.slices,
        }
    }
}

/// Reducer over a [`SliceMap`] that delegates each slice to its own reducer.
pub struct CombinedReducer<A> {
    slices: Vec<(String, SliceFn<A>)>,
}

impl<A> CombinedReducer<A> {
    pub fn slice_names(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|(n, _)| n.as_str())
    }
}

impl<A> Reducer<SliceMap, A> for CombinedReducer<A> {
    fn reduce(&self, state: &Arc<SliceMap>, action: &A) -> ReduceResult<SliceMap> {
        let mut changed = false;
        let mut next = SliceMap {
            slices: Vec::with_capacity(self.slices.len()),
        };

        for (name, slice_fn) in &self.slices {
            let current = state.raw(name);
            match slice_fn(current, action)? {
                Some(value) => {
                    changed = true;
                    next.slices.push((name.clone(), value));
                }
                None => {
                    if let Some(value) = current {
                        next.slices.push((name.clone(), Arc::clone(value)));
                    }
                }
            }
        }

        // Slices nobody owns are dropped from the combined state.
        if state.len() != next.len() {
            trace!(
                dropped = state.len().saturating_sub(next.len()),
                "Dropping unowned slices"
            );
            changed = true;
        }

        if changed {
            Ok(Arc::new(next))
        } else {
            Ok(Arc::clone(state))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::pure;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Clone, Debug, Default, PartialEq, Serialize)]
    struct Tally(i64);

    #[derive(Clone, Debug, Default, PartialEq, Serialize)]
    struct Log(Vec<String>);

    fn tally(state: &Arc<Tally>, action: &&'static str) -> Arc<Tally> {
        match *action {
            "bump" => Arc::new(Tally(state.0 + 1)),
            _ => Arc::clone(state),
        }
    }

    fn log(state: &Arc<Log>, action: &&'static str) -> Arc<Log> {
        match *action {
            "note" => {
                let mut next = state.0.clone();
                next.push("note".to_string());
                Arc::new(Log(next))
            }
            _ => Arc::clone(state),
        }
    }

    fn root() -> CombinedReducer<&'static str> {
        combine_reducers()
            .slice("tally", pure(tally))
            .slice("log", pure(log))
            .build()
    }

    #[test]
    fn test_seeds_missing_slices() {
        let state = root().reduce(&Arc::new(SliceMap::new()), &"noop").unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(*state.get::<Tally>("tally").unwrap(), Tally(0));
        assert_eq!(state.names().collect::<Vec<_>>(), vec!["tally", "log"]);
    }

    #[test]
    fn test_noop_keeps_reference() {
        let reducer = root();
        let state = reducer.reduce(&Arc::new(SliceMap::new()), &"noop").unwrap();
        let next = reducer.reduce(&state, &"noop").unwrap();
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_only_touched_slice_changes() {
        let reducer = root();
        let state = reducer.reduce(&Arc::new(SliceMap::new()), &"noop").unwrap();
        let next = reducer.reduce(&state, &"bump").unwrap();

        assert!(!Arc::ptr_eq(&state, &next));
        assert!(state.shares_slice(&next, "log"));
        assert!(!state.shares_slice(&next, "tally"));
        assert_eq!(next.get::<Tally>("tally").unwrap().0, 1);
    }

    #[test]
    fn test_wrong_slice_type_errors() {
        let reducer = root();
        let state = Arc::new(SliceMap::new().with_slice("tally", Log::default()));
        let err = reducer.reduce(&state, &"bump").unwrap_err();
        assert!(err.message().contains("tally"));

        assert!(matches!(
            state.try_get::<Tally>("tally"),
            Err(StoreError::SliceType { .. })
        ));
        assert!(state.get::<Tally>("tally").is_none());
    }

    #[test]
    fn test_unowned_slices_dropped() {
        let reducer = root();
        let seeded = reducer.reduce(&Arc::new(SliceMap::new()), &"noop").unwrap();
        let mut extra = (*seeded).clone();
        extra.insert("stray", Arc::new(Tally(9)));

        let next = reducer.reduce(&Arc::new(extra), &"noop").unwrap();
        assert!(!next.contains("stray"));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_serialize_slice_map() {
        let state = SliceMap::new()
            .with_slice("tally", Tally(3))
            .with_slice("log", Log(vec!["a".to_string()]));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"tally": 3, "log": ["a"]})
        );
    }

    #[test]
    fn test_nested_combination() {
        let inner = root();
        let outer = combine_reducers::<&'static str>()
            .slice::<SliceMap, _>("inner", inner)
            .build();

        let state = outer.reduce(&Arc::new(SliceMap::new()), &"bump").unwrap();
        let inner_state = state.get::<SliceMap>("inner").unwrap();
        assert_eq!(inner_state.get::<Tally>("tally").unwrap().0, 1);
    }
}
