//! Predicate algebra.
//!
//! A predicate is a pure, total function of an item and the run's
//! [`EvalContext`]. Absent data evaluates to `false` unless a predicate says
//! otherwise. Predicates are immutable once built; combinators own their
//! operands and never change them.
//!
//! ```ignore
//! let urgent = Overdue.or(DueWithin::new(Duration::days(2)));
//! let needs_owner = urgent.and(Unassigned).and(IsIncomplete);
//! ```

pub mod builtin;
pub mod history;

pub use builtin::{
    AlwaysTrue, Assigned, DueWithin, ExternalMatcher, HasComment, HasDescription, HasEnumValue,
    HasExternal, HasNoDueDate, HasUnsetEnum, IsComplete, IsInProject, IsInProjectAndSection,
    IsIncomplete, Overdue, TextMatcher, Unassigned,
};
pub use history::Untriaged;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::domain::{Item, User};

/// Everything a predicate may look at besides the item.
///
/// Captured once per run: `now` is read from the clock before any predicate
/// runs, so two predicates of the same run never disagree about the time.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalContext {
    pub now: DateTime<Utc>,
    /// Offset used to turn `now` into "today" for date-only comparisons.
    pub offset: FixedOffset,
    /// The user the triager acts as; `None` when the identity is unknown.
    pub actor: Option<User>,
}

impl EvalContext {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now,
            offset,
            actor: None,
        }
    }

    /// UTC context, mostly for tests.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix())
    }

    pub fn with_actor(mut self, actor: User) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.offset).date_naive()
    }
}

pub trait Predicate: fmt::Display + Send + Sync {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool;
}

pub type BoxPredicate = Box<dyn Predicate>;

impl<P: Predicate + ?Sized> Predicate for Box<P> {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        (**self).evaluate(item, ctx)
    }
}

impl<P: Predicate + ?Sized> Predicate for Arc<P> {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        (**self).evaluate(item, ctx)
    }
}

// ========================================
// Combinators
// ========================================

/// Conjunction; stops at the first operand that is false.
pub struct And {
    operands: Vec<BoxPredicate>,
}

/// Disjunction; stops at the first operand that is true.
pub struct Or {
    operands: Vec<BoxPredicate>,
}

pub struct Not {
    inner: BoxPredicate,
}

impl And {
    pub fn new(operands: Vec<BoxPredicate>) -> Self {
        Self { operands }
    }
}

impl Or {
    pub fn new(operands: Vec<BoxPredicate>) -> Self {
        Self { operands }
    }
}

impl Not {
    pub fn new(inner: BoxPredicate) -> Self {
        Self { inner }
    }
}

impl Predicate for And {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        self.operands.iter().all(|p| p.evaluate(item, ctx))
    }
}

impl Predicate for Or {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        self.operands.iter().any(|p| p.evaluate(item, ctx))
    }
}

impl Predicate for Not {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        !self.inner.evaluate(item, ctx)
    }
}

fn join(f: &mut fmt::Formatter<'_>, operands: &[BoxPredicate], op: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, p) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{p}")?;
    }
    f.write_str(")")
}

impl fmt::Display for And {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join(f, &self.operands, "and")
    }
}

impl fmt::Display for Or {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join(f, &self.operands, "or")
    }
}

impl fmt::Display for Not {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(not {})", self.inner)
    }
}

pub fn and(a: impl Predicate + 'static, b: impl Predicate + 'static) -> And {
    And::new(vec![Box::new(a), Box::new(b)])
}

pub fn or(a: impl Predicate + 'static, b: impl Predicate + 'static) -> Or {
    Or::new(vec![Box::new(a), Box::new(b)])
}

pub fn not(p: impl Predicate + 'static) -> Not {
    Not::new(Box::new(p))
}

/// Method-style combinators for every predicate.
pub trait PredicateExt: Predicate + Sized + 'static {
    fn and<P: Predicate + 'static>(self, other: P) -> And {
        and(self, other)
    }

    fn or<P: Predicate + 'static>(self, other: P) -> Or {
        or(self, other)
    }

    fn negate(self) -> Not {
        not(self)
    }

    fn boxed(self) -> BoxPredicate {
        Box::new(self)
    }
}

impl<P: Predicate + Sized + 'static> PredicateExt for P {}

/// A closure with a label for logs.
pub struct FnPredicate<F> {
    label: String,
    f: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&Item, &EvalContext) -> bool + Send + Sync,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&Item, &EvalContext) -> bool + Send + Sync,
{
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        (self.f)(item, ctx)
    }
}

impl<F> fmt::Display for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::sync::atomic::Ordering;

    fn constant(value: bool) -> FnPredicate<impl Fn(&Item, &EvalContext) -> bool + Send + Sync> {
        FnPredicate::new(value.to_string(), move |_: &Item, _: &EvalContext| value)
    }

    #[rstest]
    #[case(false, false)]
    #[case(false, true)]
    #[case(true, false)]
    #[case(true, true)]
    fn combinators_follow_boolean_logic(#[case] a: bool, #[case] b: bool) {
        let item = item("1");
        let ctx = ctx();

        assert_eq!(constant(a).and(constant(b)).evaluate(&item, &ctx), a && b);
        assert_eq!(constant(a).or(constant(b)).evaluate(&item, &ctx), a || b);
        assert_eq!(constant(a).negate().evaluate(&item, &ctx), !a);
    }

    #[test]
    fn and_short_circuits_on_first_false() {
        let (first, _) = Counting::new(false);
        let (second, calls) = Counting::new(true);

        assert!(!first.and(second).evaluate(&item("1"), &ctx()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn or_short_circuits_on_first_true() {
        let (first, _) = Counting::new(true);
        let (second, calls) = Counting::new(false);

        assert!(first.or(second).evaluate(&item("1"), &ctx()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn combinators_render_for_logs() {
        let p = or(and(constant(true), constant(false)), not(constant(true)));
        assert_eq!(p.to_string(), "((true and false) or (not true))");
    }

    #[test]
    fn today_uses_configured_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 2024-05-01T20:00Z is already 2024-05-02 in UTC+9.
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
        let ctx = EvalContext::new(now, tokyo);
        assert_eq!(ctx.today(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }

    proptest! {
        #[test]
        fn de_morgan_holds(a in any::<bool>(), b in any::<bool>()) {
            let item = item("1");
            let ctx = ctx();
            let lhs = constant(a).and(constant(b)).negate().evaluate(&item, &ctx);
            let rhs = constant(a).negate().or(constant(b).negate()).evaluate(&item, &ctx);
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn double_negation_is_identity(a in any::<bool>()) {
            let item = item("1");
            let ctx = ctx();
            prop_assert_eq!(constant(a).negate().negate().evaluate(&item, &ctx), a);
        }
    }
}
