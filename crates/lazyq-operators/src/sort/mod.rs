//! Ordering chains: `order_by` starts one, `then_by` extends it.
//!
//! The upstream is drained and sorted on the first pull of each enumeration.
//! Keys travel with their elements.

mod key;

use std::ops::Deref;
use std::rc::Rc;

use lazyq_core::{Invocable, Result};

use crate::enumerable::{deferred, drain, Enumerable};
use crate::resolve::{resolve, Callable, COMPARER_ARITY, SELECTOR_ARITY};

pub use key::{SortDirection, SortKey};

/// A sorted sequence that remembers its key chain so it can be refined with
/// `then_by` variants. Dereferences to the sorted `Enumerable`.
#[derive(Debug, Clone)]
pub struct OrderedEnumerable {
    upstream: Enumerable,
    chain: Rc<Vec<SortKey>>,
    sorted: Enumerable,
}

impl OrderedEnumerable {
    fn new(upstream: Enumerable, chain: Vec<SortKey>) -> Self {
        let chain = Rc::new(chain);
        let sorted = {
            let chain = Rc::clone(&chain);
            upstream.pipe(move |up| {
                let chain = Rc::clone(&chain);
                Ok(deferred(move || {
                    let items = drain(up)?;
                    #[cfg(feature = "tracing")]
                    tracing::debug!(elements = items.len(), keys = chain.len(), "sorting");
                    let sorted = key::sort_entries(items, &chain)?;
                    Ok(Box::new(sorted.into_iter().map(Ok)))
                }))
            })
        };
        Self {
            upstream,
            chain,
            sorted,
        }
    }

    pub fn as_enumerable(&self) -> &Enumerable {
        &self.sorted
    }

    pub fn into_enumerable(self) -> Enumerable {
        self.sorted
    }

    pub fn keys_chain(&self) -> &[SortKey] {
        &self.chain
    }

    fn extend(&self, key: SortKey) -> OrderedEnumerable {
        let mut chain = self.chain.as_ref().clone();
        chain.push(key);
        OrderedEnumerable::new(self.upstream.clone(), chain)
    }

    /// Secondary ascending key.
    pub fn then_by(&self, selector: impl Into<Callable>) -> Result<OrderedEnumerable> {
        self.then_by_with(selector, None, SortDirection::Ascending)
    }

    pub fn then_by_descending(&self, selector: impl Into<Callable>) -> Result<OrderedEnumerable> {
        self.then_by_with(selector, None, SortDirection::Descending)
    }

    /// Secondary key with an optional `comparer(a, b)` returning a negative,
    /// zero or positive number.
    pub fn then_by_with(
        &self,
        selector: impl Into<Callable>,
        comparer: Option<Callable>,
        direction: SortDirection,
    ) -> Result<OrderedEnumerable> {
        Ok(self.extend(sort_key(selector, comparer, direction)?))
    }

    /// Secondary descending key reusing the primary key selector.
    pub fn then_descending(&self) -> OrderedEnumerable {
        let selector = self
            .chain
            .first()
            .map(|k| k.selector.clone())
            .unwrap_or_else(Invocable::identity);
        self.extend(SortKey {
            selector,
            comparer: None,
            direction: SortDirection::Descending,
        })
    }
}

impl Deref for OrderedEnumerable {
    type Target = Enumerable;

    fn deref(&self) -> &Enumerable {
        &self.sorted
    }
}

impl From<OrderedEnumerable> for Enumerable {
    fn from(o: OrderedEnumerable) -> Self {
        o.sorted
    }
}

impl From<&OrderedEnumerable> for Enumerable {
    fn from(o: &OrderedEnumerable) -> Self {
        o.sorted.clone()
    }
}

fn sort_key(
    selector: impl Into<Callable>,
    comparer: Option<Callable>,
    direction: SortDirection,
) -> Result<SortKey> {
    let comparer = match comparer {
        Some(c) => Some(resolve(c, COMPARER_ARITY)?),
        None => None,
    };
    Ok(SortKey {
        selector: resolve(selector, SELECTOR_ARITY)?,
        comparer,
        direction,
    })
}

impl Enumerable {
    /// Stable ascending sort by `selector(value, key)`.
    pub fn order_by(&self, selector: impl Into<Callable>) -> Result<OrderedEnumerable> {
        self.order_by_with(selector, None, SortDirection::Ascending)
    }

    pub fn order_by_descending(&self, selector: impl Into<Callable>) -> Result<OrderedEnumerable> {
        self.order_by_with(selector, None, SortDirection::Descending)
    }

    pub fn order_by_with(
        &self,
        selector: impl Into<Callable>,
        comparer: Option<Callable>,
        direction: SortDirection,
    ) -> Result<OrderedEnumerable> {
        Ok(OrderedEnumerable::new(
            self.clone(),
            vec![sort_key(selector, comparer, direction)?],
        ))
    }

    /// Sort by the values themselves.
    pub fn order(&self) -> OrderedEnumerable {
        self.order_by_identity(SortDirection::Ascending)
    }

    pub fn order_descending(&self) -> OrderedEnumerable {
        self.order_by_identity(SortDirection::Descending)
    }

    fn order_by_identity(&self, direction: SortDirection) -> OrderedEnumerable {
        OrderedEnumerable::new(
            self.clone(),
            vec![SortKey {
                selector: Invocable::identity(),
                comparer: None,
                direction,
            }],
        )
    }
}
