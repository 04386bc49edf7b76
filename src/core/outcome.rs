//! Tagged result of a data fetch

use crate::core::fund::{IndexSeries, NavSeries};

/// What a fetch produced: data, a legitimate "nothing there", or a failure.
///
/// Upstream errors stop here; callers render each case inline instead of
/// propagating it.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Data(T),
    Empty,
    Failed(String),
}

impl<T> FetchOutcome<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            FetchOutcome::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Data(value) => FetchOutcome::Data(f(value)),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason),
        }
    }
}

impl<T: DataSet> FetchOutcome<T> {
    /// Classifies a provider result. The error chain is kept as the failure reason.
    pub fn from_result(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) if value.is_empty() => FetchOutcome::Empty,
            Ok(value) => FetchOutcome::Data(value),
            Err(e) => FetchOutcome::Failed(format!("{e:#}")),
        }
    }
}

/// Anything a provider returns that can legitimately come back empty.
pub trait DataSet {
    fn is_empty(&self) -> bool;
}

impl<T> DataSet for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl DataSet for NavSeries {
    fn is_empty(&self) -> bool {
        NavSeries::is_empty(self)
    }
}

impl DataSet for IndexSeries {
    fn is_empty(&self) -> bool {
        IndexSeries::is_empty(self)
    }
}
