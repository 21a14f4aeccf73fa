//! # Memoization
//!
//! A [Memoizer] is an explicit cache owned by whatever component repeats a computation, for
//! example the tokenizer wrapped by [CachedCounter]. Arguments are keyed by their canonical JSON
//! rendering, so any `Serialize` argument tuple works as a key.
//!
//! A memoizer can be bounded with [Memoizer::with_capacity_limit]; the oldest entry is evicted
//! first. Unbounded memoizers live as long as their owner, or until [Memoizer::clear].

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use serde::Serialize;

use crate::utils::token::CountToken;

#[derive(Debug, Clone)]
pub struct Memoizer<V> {
    values: HashMap<String, V>,
    insertion_order: VecDeque<String>,
    capacity: Option<usize>,
}

impl<V> Default for Memoizer<V> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            insertion_order: VecDeque::new(),
            capacity: None,
        }
    }
}

impl<V: Clone> Memoizer<V> {
    /// An unbounded memoizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A memoizer holding at most `capacity` results. A capacity of zero caches nothing.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Canonical key of an argument tuple.
    pub fn key_of(args: &impl Serialize) -> Result<String> {
        Ok(serde_json::to_string(args)?)
    }

    pub fn get(&self, args: &impl Serialize) -> Result<Option<V>> {
        Ok(self.values.get(&Self::key_of(args)?).cloned())
    }

    /// Return the cached result for `args`, computing and caching it on the first call.
    pub fn get_or_insert_with(&mut self, args: &impl Serialize, compute: impl FnOnce() -> V) -> Result<V> {
        self.try_get_or_insert_with(args, || Ok(compute()))
    }

    /// Like [Memoizer::get_or_insert_with] for fallible computations. Failures are not cached.
    pub fn try_get_or_insert_with(&mut self, args: &impl Serialize, compute: impl FnOnce() -> Result<V>) -> Result<V> {
        let key = Self::key_of(args)?;
        if let Some(value) = self.values.get(&key) {
            return Ok(value.clone());
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn insert(&mut self, key: String, value: V) {
        if self.capacity == Some(0) {
            return;
        }
        if let Some(capacity) = self.capacity {
            while self.values.len() >= capacity {
                match self.insertion_order.pop_front() {
                    Some(oldest) => { self.values.remove(&oldest); }
                    None => break,
                }
            }
        }
        self.insertion_order.push_back(key.clone());
        self.values.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.insertion_order.clear();
    }
}

/// A token counter that tokenizes each distinct text once.
pub struct CachedCounter<C: CountToken> {
    counter: C,
    memo: RefCell<Memoizer<usize>>,
}

impl<C: CountToken> CachedCounter<C> {
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            memo: RefCell::new(Memoizer::new()),
        }
    }

    pub fn with_capacity_limit(counter: C, capacity: usize) -> Self {
        Self {
            counter,
            memo: RefCell::new(Memoizer::with_capacity_limit(capacity)),
        }
    }

    pub fn cached_texts(&self) -> usize {
        self.memo.borrow().len()
    }
}

impl<C: CountToken> CountToken for CachedCounter<C> {
    fn count_token(&self, string: &str) -> usize {
        let mut memo = self.memo.borrow_mut();
        // serializing a &str cannot fail
        memo.get_or_insert_with(&string, || self.counter.count_token(string))
            .unwrap_or_else(|_| self.counter.count_token(string))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use super::*;

    #[test]
    fn test_computes_once_per_args() {
        let calls = Cell::new(0);
        let mut memo = Memoizer::new();
        let mut square = |x: i32| memo.get_or_insert_with(&(x,), || {
            calls.set(calls.get() + 1);
            x * x
        }).unwrap();
        assert_eq!(9, square(3));
        assert_eq!(9, square(3));
        assert_eq!(16, square(4));
        assert_eq!(2, calls.get());
    }

    #[test]
    fn test_named_args_are_part_of_the_key() {
        let mut memo = Memoizer::new();
        let a = memo.get_or_insert_with(&("HeLa", Some("H3K4me3")), || "a".to_string()).unwrap();
        let b = memo.get_or_insert_with(&("HeLa", None::<&str>), || "b".to_string()).unwrap();
        assert_eq!(("a", "b"), (a.as_str(), b.as_str()));
        assert_eq!(2, memo.len());
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut memo: Memoizer<String> = Memoizer::new();
        assert!(memo.try_get_or_insert_with(&"k", || anyhow::bail!("boom")).is_err());
        assert!(memo.is_empty());
        assert_eq!("v", memo.try_get_or_insert_with(&"k", || Ok("v".to_string())).unwrap());
        assert_eq!(Some("v".to_string()), memo.get(&"k").unwrap());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut memo = Memoizer::with_capacity_limit(2);
        for i in 0..3 {
            memo.get_or_insert_with(&i, || i * 10).unwrap();
        }
        assert_eq!(2, memo.len());
        assert_eq!(None, memo.get(&0).unwrap());
        assert_eq!(Some(20), memo.get(&2).unwrap());
        memo.clear();
        assert!(memo.is_empty());

        let mut disabled = Memoizer::with_capacity_limit(0);
        assert_eq!(1, disabled.get_or_insert_with(&"x", || 1).unwrap());
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_cached_counter() {
        let calls = Cell::new(0);
        let counter = CachedCounter::new(|s: &str| {
            calls.set(calls.get() + 1);
            s.len()
        });
        assert_eq!(4, counter.count_token("HeLa"));
        assert_eq!(4, counter.count_token("HeLa"));
        assert_eq!(5, counter.count_token("K562 "));
        assert_eq!(2, calls.get());
        assert_eq!(2, counter.cached_texts());
    }
}
