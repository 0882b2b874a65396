//! Ordered fallback resolution: try strategies in order, first valid wins.
//!
//! A strategy is a pure function from some context (a document fragment, a
//! decoded payload scope) to an optional value; `None` means the strategy
//! did not recognize anything it is confident about. Each independently
//! recoverable field group has its own ordered strategy list, so exhausting
//! one group never blocks extraction of the others. Callers handle the
//! exhausted case, typically by attaching a diagnostic to the record and
//! leaving the field at its default.

/// One named extraction strategy over context `C`.
pub type Strategy<C, T> = (&'static str, fn(&C) -> Option<T>);

/// Outcome of evaluating one fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// A strategy produced a value; carries the strategy's name.
    Resolved {
        strategy: &'static str,
        value: T,
    },
    /// Every strategy in the chain declined.
    Exhausted,
}

impl<T> Resolution<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Resolution::Resolved { value, .. } => Some(value),
            Resolution::Exhausted => None,
        }
    }
}

/// Evaluate `strategies` in order against `context`; the first one to
/// produce a value wins and evaluation stops.
pub fn resolve<C, T>(group: &str, strategies: &[Strategy<C, T>], context: &C) -> Resolution<T> {
    for &(name, strategy) in strategies {
        if let Some(value) = strategy(context) {
            tracing::trace!(group, strategy = name, "field group resolved");
            return Resolution::Resolved {
                strategy: name,
                value,
            };
        }
    }

    tracing::debug!(group, "fallback chain exhausted");
    Resolution::Exhausted
}
