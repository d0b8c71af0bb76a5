//! Auto-closed resources for the try-async wrappers.
//!
//! A resource handed to one of the `try_async_with_resource*` entry points is
//! shared with the body behind `Arc<Mutex<_>>` and closed by the wrapper
//! exactly once, in declaration order, after the finalizers - whether the
//! body succeeded or failed. A failing close is dispatched through the
//! wrapper's handler table and never masks the primary outcome.

use std::sync::{Arc, Mutex};

use crate::error::DynError;

/// A resource the try-async wrappers close on completion.
///
/// `close` is invoked exactly once per supplied resource. Dropping without
/// closing only happens if the submission was cancelled before the body ran.
pub trait Closable: Send + 'static {
    /// Releases the resource.
    fn close(&mut self) -> Result<(), DynError>;
}

impl Closable for Box<dyn Closable> {
    fn close(&mut self) -> Result<(), DynError> {
        (**self).close()
    }
}

/// Shared handle under which a body accesses a wrapper-owned resource.
pub type SharedResource<R> = Arc<Mutex<R>>;

/// Deferred close of one resource, tagged with its name when it came from a
/// [`ResourceMap`].
pub(crate) struct CloseEntry {
    name: Option<Arc<str>>,
    thunk: Box<dyn FnOnce() -> Result<(), DynError> + Send>,
}

impl CloseEntry {
    pub(crate) fn new<R: Closable>(name: Option<Arc<str>>, shared: SharedResource<R>) -> Self {
        Self {
            name,
            thunk: Box::new(move || {
                shared
                    .lock()
                    .expect("resource lock poisoned")
                    .close()
            }),
        }
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn run(self) -> Result<(), DynError> {
        (self.thunk)()
    }
}

/// Named, heterogeneous resource collection preserving declaration order.
///
/// The map is shared with the body (clones are shallow); the wrapper closes
/// every entry in insertion order on completion.
#[derive(Clone, Default)]
pub struct ResourceMap {
    entries: Vec<(Arc<str>, SharedResource<Box<dyn Closable>>)>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource under `name`. Re-inserting a name replaces the
    /// resource but keeps its original position.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, resource: impl Closable) -> &mut Self {
        let name = name.into();
        let shared: SharedResource<Box<dyn Closable>> = Arc::new(Mutex::new(Box::new(resource)));
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = shared,
            None => self.entries.push((name, shared)),
        }
        self
    }

    /// Looks up a resource by name.
    pub fn get(&self, name: &str) -> Option<SharedResource<Box<dyn Closable>>> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, r)| Arc::clone(r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close entries in declaration order.
    pub(crate) fn close_entries(&self) -> Vec<CloseEntry> {
        self.entries
            .iter()
            .map(|(name, shared)| CloseEntry::new(Some(Arc::clone(name)), Arc::clone(shared)))
            .collect()
    }
}
