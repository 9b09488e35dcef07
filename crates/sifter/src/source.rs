//! Query sources that compiled arguments are applied to.
//!
//! [`InMemory`] applies every step eagerly to a materialized slice.
//! [`LazyQuery`] records the steps for a store to execute later.

use std::fmt;

use crate::ordering::OrderChain;
use crate::predicate::Predicate;

/// Something filters, orderings and paging can be applied to.
pub trait QuerySource<T>: Sized {
    fn filter(self, predicate: &Predicate<T>) -> Self;

    fn order(self, chain: &OrderChain<T>) -> Self;

    fn skip(self, count: usize) -> Self;

    fn take(self, count: usize) -> Self;

    /// Whether enumeration order is deterministic without an explicit order.
    fn has_stable_order(&self) -> bool;
}

/// A materialized view over a slice.
///
/// Enumeration order is the slice order, so paging is deterministic even
/// without an explicit order.
#[derive(Debug)]
pub struct InMemory<'a, T> {
    items: Vec<&'a T>,
}

impl<'a, T> InMemory<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        InMemory {
            items: items.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.items.iter().copied()
    }

    pub fn into_vec(self) -> Vec<&'a T> {
        self.items
    }

    pub fn cloned(self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.into_iter().cloned().collect()
    }
}

impl<'a, T> From<Vec<&'a T>> for InMemory<'a, T> {
    fn from(items: Vec<&'a T>) -> Self {
        InMemory { items }
    }
}

impl<T> Clone for InMemory<'_, T> {
    fn clone(&self) -> Self {
        InMemory {
            items: self.items.clone(),
        }
    }
}

impl<T> QuerySource<T> for InMemory<'_, T> {
    fn filter(mut self, predicate: &Predicate<T>) -> Self {
        self.items.retain(|item| predicate.matches(item));
        self
    }

    fn order(mut self, chain: &OrderChain<T>) -> Self {
        // sort_by is stable, so ties keep their slice order
        self.items.sort_by(|a, b| chain.compare(a, b));
        self
    }

    fn skip(mut self, count: usize) -> Self {
        let count = count.min(self.items.len());
        self.items.drain(..count);
        self
    }

    fn take(mut self, count: usize) -> Self {
        self.items.truncate(count);
        self
    }

    fn has_stable_order(&self) -> bool {
        true
    }
}

/// One deferred operation of a [`LazyQuery`].
pub enum QueryStep<T> {
    Filter(Predicate<T>),
    Order(OrderChain<T>),
    Skip(usize),
    Take(usize),
}

impl<T> Clone for QueryStep<T> {
    fn clone(&self) -> Self {
        match self {
            QueryStep::Filter(p) => QueryStep::Filter(p.clone()),
            QueryStep::Order(o) => QueryStep::Order(o.clone()),
            QueryStep::Skip(n) => QueryStep::Skip(*n),
            QueryStep::Take(n) => QueryStep::Take(*n),
        }
    }
}

impl<T> fmt::Debug for QueryStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStep::Filter(p) => f.debug_tuple("Filter").field(p.filter()).finish(),
            QueryStep::Order(o) => f.debug_tuple("Order").field(&o.description()).finish(),
            QueryStep::Skip(n) => f.debug_tuple("Skip").field(n).finish(),
            QueryStep::Take(n) => f.debug_tuple("Take").field(n).finish(),
        }
    }
}

/// A deferred query: the steps are recorded, not run.
///
/// A store-backed collaborator translates [`steps`](LazyQuery::steps) using
/// each predicate's [`Filter`](crate::Filter) and each chain's
/// [`description`](OrderChain::description). Its enumeration order is not
/// assumed stable.
pub struct LazyQuery<T> {
    steps: Vec<QueryStep<T>>,
}

impl<T> LazyQuery<T> {
    pub fn new() -> Self {
        LazyQuery { steps: Vec::new() }
    }

    pub fn steps(&self) -> &[QueryStep<T>] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<QueryStep<T>> {
        self.steps
    }

    /// Runs the recorded steps in memory against `items`.
    pub fn execute<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.steps
            .iter()
            .fold(InMemory::new(items), |source, step| match step {
                QueryStep::Filter(p) => source.filter(p),
                QueryStep::Order(o) => source.order(o),
                QueryStep::Skip(n) => source.skip(*n),
                QueryStep::Take(n) => source.take(*n),
            })
            .into_vec()
    }

    fn push(mut self, step: QueryStep<T>) -> Self {
        self.steps.push(step);
        self
    }
}

impl<T> Default for LazyQuery<T> {
    fn default() -> Self {
        LazyQuery::new()
    }
}

impl<T> Clone for LazyQuery<T> {
    fn clone(&self) -> Self {
        LazyQuery {
            steps: self.steps.clone(),
        }
    }
}

impl<T> fmt::Debug for LazyQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.steps).finish()
    }
}

impl<T> QuerySource<T> for LazyQuery<T> {
    fn filter(self, predicate: &Predicate<T>) -> Self {
        self.push(QueryStep::Filter(predicate.clone()))
    }

    fn order(self, chain: &OrderChain<T>) -> Self {
        self.push(QueryStep::Order(chain.clone()))
    }

    fn skip(self, count: usize) -> Self {
        self.push(QueryStep::Skip(count))
    }

    fn take(self, count: usize) -> Self {
        self.push(QueryStep::Take(count))
    }

    fn has_stable_order(&self) -> bool {
        false
    }
}
