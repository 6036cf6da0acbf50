//! Built-in sorters.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use super::{Sorter, missing_last};
use crate::domain::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DateOrder {
    descending: bool,
    missing_first: bool,
}

impl DateOrder {
    fn compare(self, a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
        let ord = missing_last(a, b, self.descending);
        match (a, b) {
            (Some(_), None) | (None, Some(_)) if self.missing_first => ord.reverse(),
            _ => ord,
        }
    }
}

/// By due date (timestamped due dates count by their date), earliest first.
///
/// Items without a due date go last unless [`DueDateSorter::missing_first`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDateSorter {
    order: DateOrder,
}

impl DueDateSorter {
    pub fn new() -> Self {
        Self {
            order: DateOrder {
                descending: false,
                missing_first: false,
            },
        }
    }

    pub fn descending(mut self) -> Self {
        self.order.descending = true;
        self
    }

    pub fn missing_first(mut self) -> Self {
        self.order.missing_first = true;
        self
    }
}

impl Default for DueDateSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl Sorter for DueDateSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        self.order.compare(a.due_date(), b.due_date())
    }
}

impl fmt::Display for DueDateSorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DueDateSorter")
    }
}

/// By start date, earliest first; same options as [`DueDateSorter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartDateSorter {
    order: DateOrder,
}

impl StartDateSorter {
    pub fn new() -> Self {
        Self {
            order: DateOrder {
                descending: false,
                missing_first: false,
            },
        }
    }

    pub fn descending(mut self) -> Self {
        self.order.descending = true;
        self
    }

    pub fn missing_first(mut self) -> Self {
        self.order.missing_first = true;
        self
    }
}

impl Default for StartDateSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl Sorter for StartDateSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        self.order.compare(a.start_on, b.start_on)
    }
}

impl fmt::Display for StartDateSorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StartDateSorter")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AssigneeOrder {
    /// Listed slots first, in list order; everyone else after, tied.
    /// A `None` slot places unassigned items; without one they sort with the rest.
    Listed(Vec<Option<String>>),
    /// By display name; unassigned last.
    Alphabetical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeSorter {
    order: AssigneeOrder,
}

impl AssigneeSorter {
    pub fn by_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: AssigneeOrder::Listed(names.into_iter().map(|n| Some(n.into())).collect()),
        }
    }

    /// Like [`AssigneeSorter::by_names`], with `None` marking where unassigned items go.
    pub fn by_assignees<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            order: AssigneeOrder::Listed(slots.into_iter().map(|s| s.map(Into::into)).collect()),
        }
    }

    pub fn alphabetical() -> Self {
        Self {
            order: AssigneeOrder::Alphabetical,
        }
    }
}

impl Sorter for AssigneeSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let name = |item: &Item| item.assignee.as_ref().map(|u| u.name.clone());
        match &self.order {
            AssigneeOrder::Listed(names) => {
                let rank = |item: &Item| {
                    let slot = item.assignee.as_ref().map(|u| u.name.as_str());
                    names.iter().position(|n| n.as_deref() == slot)
                };
                missing_last(rank(a), rank(b), false)
            }
            AssigneeOrder::Alphabetical => missing_last(name(a), name(b), false),
        }
    }
}

impl fmt::Display for AssigneeSorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AssigneeSorter")
    }
}

/// By an enum custom field, in the given option order.
///
/// Unset values, items without the field and options not in the list all sort
/// after the listed options, tied. Options not in the list are reported by
/// [`Sorter::audit`] so a renamed option does not silently fall to the bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCustomFieldSorter {
    field: String,
    options: Vec<String>,
}

impl EnumCustomFieldSorter {
    pub fn new<I, S>(field: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    fn value<'a>(&self, item: &'a Item) -> Option<&'a str> {
        item.custom_field(&self.field)
            .and_then(|f| f.enum_value())
            .map(|o| o.name.as_str())
    }

    fn rank(&self, item: &Item) -> Option<usize> {
        let value = self.value(item)?;
        self.options.iter().position(|o| o == value)
    }
}

impl Sorter for EnumCustomFieldSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        missing_last(self.rank(a), self.rank(b), false)
    }

    fn referenced_fields(&self) -> Vec<&str> {
        vec![self.field.as_str()]
    }

    fn audit(&self, item: &Item) -> Vec<String> {
        match self.value(item) {
            Some(value) if !self.options.iter().any(|o| o == value) => vec![format!(
                "'{}' has unrecognized value '{value}'; sorted after known values",
                self.field
            )],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for EnumCustomFieldSorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumCustomFieldSorter({})", self.field)
    }
}

/// By a number custom field, ascending by default; missing values always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberCustomFieldSorter {
    field: String,
    descending: bool,
}

impl NumberCustomFieldSorter {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    fn value(&self, item: &Item) -> Option<f64> {
        item.custom_field(&self.field).and_then(|f| f.number_value())
    }
}

impl Sorter for NumberCustomFieldSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        match (self.value(a), self.value(b)) {
            (Some(x), Some(y)) if self.descending => y.total_cmp(&x),
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn referenced_fields(&self) -> Vec<&str> {
        vec![self.field.as_str()]
    }
}

impl fmt::Display for NumberCustomFieldSorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NumberCustomFieldSorter({})", self.field)
    }
}

/// By like count, most liked first by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeSorter {
    ascending: bool,
}

impl LikeSorter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ascending(mut self) -> Self {
        self.ascending = true;
        self
    }
}

impl Sorter for LikeSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        if self.ascending {
            a.num_likes.cmp(&b.num_likes)
        } else {
            b.num_likes.cmp(&a.num_likes)
        }
    }
}

impl fmt::Display for LikeSorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LikeSorter")
    }
}
