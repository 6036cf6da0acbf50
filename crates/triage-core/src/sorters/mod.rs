//! Sorter algebra.
//!
//! A sorter is a comparator over items. Sorters compose left to right with
//! [`SorterExt::and_then`]: the next sorter only breaks ties of the previous
//! one. Sorting is stable, so items that tie on every key keep their current
//! relative order (and therefore produce no moves).
//!
//! ```ignore
//! let sorter = EnumCustomFieldSorter::new("Priority", ["High", "Medium", "Low"])
//!     .and_then(DueDateSorter::new())
//!     .and_then(LikeSorter::new());
//! ```

pub mod builtin;
pub mod moves;

pub use builtin::{
    AssigneeSorter, DueDateSorter, EnumCustomFieldSorter, LikeSorter, NumberCustomFieldSorter,
    StartDateSorter,
};
pub use moves::plan_moves;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::domain::Item;

pub trait Sorter: fmt::Display + Send + Sync {
    fn compare(&self, a: &Item, b: &Item) -> Ordering;

    /// Custom fields this sorter reads, checked against the project schema at build time.
    fn referenced_fields(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Non-fatal problems with how this sorter sees `item` (e.g. an unrecognized value).
    fn audit(&self, _item: &Item) -> Vec<String> {
        Vec::new()
    }

    /// Stable sort.
    fn sort(&self, mut items: Vec<Item>) -> Vec<Item> {
        items.sort_by(|a, b| self.compare(a, b));
        items
    }
}

pub type BoxSorter = Box<dyn Sorter>;

impl<S: Sorter + ?Sized> Sorter for Box<S> {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        (**self).compare(a, b)
    }

    fn referenced_fields(&self) -> Vec<&str> {
        (**self).referenced_fields()
    }

    fn audit(&self, item: &Item) -> Vec<String> {
        (**self).audit(item)
    }
}

impl<S: Sorter + ?Sized> Sorter for Arc<S> {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        (**self).compare(a, b)
    }

    fn referenced_fields(&self) -> Vec<&str> {
        (**self).referenced_fields()
    }

    fn audit(&self, item: &Item) -> Vec<String> {
        (**self).audit(item)
    }
}

/// `first`, then `next` among ties of `first`.
pub struct Chain {
    first: BoxSorter,
    next: BoxSorter,
}

impl Sorter for Chain {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        self.first
            .compare(a, b)
            .then_with(|| self.next.compare(a, b))
    }

    fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = self.first.referenced_fields();
        for field in self.next.referenced_fields() {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }

    fn audit(&self, item: &Item) -> Vec<String> {
        let mut warnings = self.first.audit(item);
        warnings.extend(self.next.audit(item));
        warnings
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} and then {})", self.first, self.next)
    }
}

pub trait SorterExt: Sorter + Sized + 'static {
    fn and_then<S: Sorter + 'static>(self, next: S) -> Chain {
        Chain {
            first: Box::new(self),
            next: Box::new(next),
        }
    }

    fn boxed(self) -> BoxSorter {
        Box::new(self)
    }
}

impl<S: Sorter + Sized + 'static> SorterExt for S {}

/// Compare optional keys with missing values after all present ones.
pub(crate) fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
