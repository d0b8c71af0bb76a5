//! Typed and predicate-based failure handlers.
//!
//! A [`CatcherTable`] is an ordered list of handlers. On failure the table is
//! scanned in registration order; the first entry that matches consumes the
//! failure and the scan stops, so at most one handler fires per failure.
//!
//! Typed entries match when the failure's source chain contains the handler's
//! error type; predicate entries match when their predicate returns true.

use std::error::Error;

use crate::error::TaskError;

type CatcherEntry = Box<dyn Fn(&TaskError) -> bool + Send + Sync>;

/// Ordered failure-handler table; first match wins.
#[derive(Default)]
pub(crate) struct CatcherTable {
    entries: Vec<CatcherEntry>,
}

impl CatcherTable {
    /// Registers a handler for failures whose source chain contains an `E`.
    pub(crate) fn add_typed<E, H>(&mut self, handler: H)
    where
        E: Error + 'static,
        H: Fn(&E) + Send + Sync + 'static,
    {
        self.entries.push(Box::new(move |err| {
            let Some(source) = err.source_err() else {
                return false;
            };
            match find_in_chain::<E>(source) {
                Some(typed) => {
                    handler(typed);
                    true
                }
                None => false,
            }
        }));
    }

    /// Registers a handler guarded by an arbitrary predicate.
    pub(crate) fn add_predicate<P, H>(&mut self, predicate: P, handler: H)
    where
        P: Fn(&TaskError) -> bool + Send + Sync + 'static,
        H: Fn(&TaskError) + Send + Sync + 'static,
    {
        self.entries.push(Box::new(move |err| {
            if predicate(err) {
                handler(err);
                true
            } else {
                false
            }
        }));
    }

    /// Scans in registration order; returns true if a handler consumed the
    /// failure.
    pub(crate) fn dispatch(&self, err: &TaskError) -> bool {
        self.entries.iter().any(|entry| entry(err))
    }
}

/// Walks the source chain looking for a concrete `E`.
fn find_in_chain<'a, E: Error + 'static>(top: &'a (dyn Error + 'static)) -> Option<&'a E> {
    let mut current: Option<&(dyn Error + 'static)> = Some(top);
    while let Some(err) = current {
        if let Some(typed) = err.downcast_ref::<E>() {
            return Some(typed);
        }
        current = err.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("disk full")]
    struct DiskFull;

    #[derive(Debug, Error)]
    #[error("link down")]
    struct LinkDown;

    #[derive(Debug, Error)]
    #[error("request failed")]
    struct RequestFailed(#[source] LinkDown);

    #[test]
    fn test_typed_handler_fires_on_matching_type() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut table = CatcherTable::default();
        let seen = hits.clone();
        table.add_typed::<DiskFull, _>(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(table.dispatch(&TaskError::fail(DiskFull)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unrelated_type_does_not_match() {
        let mut table = CatcherTable::default();
        table.add_typed::<DiskFull, _>(|_| panic!("wrong handler fired"));
        assert!(!table.dispatch(&TaskError::fail(LinkDown)));
    }

    #[test]
    fn test_first_match_wins_and_stops_the_scan() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut table = CatcherTable::default();

        let seen = order.clone();
        table.add_typed::<DiskFull, _>(move |_| seen.lock().unwrap().push("typed"));
        let seen = order.clone();
        table.add_predicate(|_| true, move |_| seen.lock().unwrap().push("catch_all"));

        assert!(table.dispatch(&TaskError::fail(DiskFull)));
        assert_eq!(*order.lock().unwrap(), vec!["typed"]);
    }

    #[test]
    fn test_match_walks_the_source_chain() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut table = CatcherTable::default();
        let seen = hits.clone();
        table.add_typed::<LinkDown, _>(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(table.dispatch(&TaskError::fail(RequestFailed(LinkDown))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_fail_variants_only_match_predicates() {
        let mut table = CatcherTable::default();
        table.add_typed::<DiskFull, _>(|_| panic!("typed handler fired"));
        assert!(!table.dispatch(&TaskError::Canceled));

        let mut table = CatcherTable::default();
        table.add_predicate(|err| err.is_interruption(), |_| {});
        assert!(table.dispatch(&TaskError::Canceled));
    }
}
