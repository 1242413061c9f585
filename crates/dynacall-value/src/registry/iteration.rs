//! Iteration adapters for list-like and map-like payloads.
//!
//! Types without an adapter iterate generically: exactly one entry holding the
//! value itself. An invalid value has no entries.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::type_tag::TypeTag;
use crate::value::Value;

/// Shape of an iterable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Entries keyed by position.
    List,
    /// Entries keyed by map key.
    Map,
}

/// One key/value pair produced by iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Value,
    pub value: Value,
}

type CountFn = Arc<dyn Fn(&dyn Any) -> usize + Send + Sync>;
type EntriesFn = Arc<dyn Fn(&dyn Any) -> Vec<Entry> + Send + Sync>;

/// Registered iteration behaviour of one container type.
#[derive(Clone)]
pub struct IterAdapter {
    kind: ContainerKind,
    count: CountFn,
    entries: EntriesFn,
}

impl IterAdapter {
    /// Adapter for any `C` whose shared reference iterates `&T`.
    pub fn list<C, T>() -> Self
    where
        C: Any,
        for<'a> &'a C: IntoIterator<Item = &'a T>,
        T: Any + Clone + Send + Sync,
    {
        Self {
            kind: ContainerKind::List,
            count: Arc::new(|any: &dyn Any| {
                any.downcast_ref::<C>().map_or(0, |c| c.into_iter().count())
            }),
            entries: Arc::new(|any: &dyn Any| {
                any.downcast_ref::<C>()
                    .map(|c| {
                        c.into_iter()
                            .enumerate()
                            .map(|(index, item)| Entry {
                                key: Value::wrap(index),
                                value: Value::wrap(item.clone()),
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }),
        }
    }

    /// Adapter for any `M` whose shared reference iterates `(&K, &V)`.
    pub fn map<M, K, V>() -> Self
    where
        M: Any,
        for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
        K: Any + Clone + Send + Sync,
        V: Any + Clone + Send + Sync,
    {
        Self {
            kind: ContainerKind::Map,
            count: Arc::new(|any: &dyn Any| {
                any.downcast_ref::<M>().map_or(0, |m| m.into_iter().count())
            }),
            entries: Arc::new(|any: &dyn Any| {
                any.downcast_ref::<M>()
                    .map(|m| {
                        m.into_iter()
                            .map(|(key, value)| Entry {
                                key: Value::wrap(key.clone()),
                                value: Value::wrap(value.clone()),
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn count(&self, payload: &dyn Any) -> usize {
        (self.count)(payload)
    }

    pub fn entries(&self, payload: &dyn Any) -> Vec<Entry> {
        (self.entries)(payload)
    }
}

/// Registered adapters keyed by container type.
#[derive(Clone, Default)]
pub struct IterationTable {
    entries: HashMap<TypeTag, IterAdapter>,
}

impl IterationTable {
    /// Registers `adapter` for `container`, replacing any previous entry.
    pub fn register(&mut self, container: TypeTag, adapter: IterAdapter) {
        self.entries.insert(container, adapter);
    }

    pub fn get(&self, container: TypeTag) -> Option<&IterAdapter> {
        self.entries.get(&container)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Position inside a snapshot of a value's entries.
///
/// `begin` and `end` cursors of the same value compare equal once the begin
/// cursor has been advanced past the last entry.
#[derive(Debug, Clone)]
pub struct Cursor {
    entries: Arc<[Entry]>,
    position: usize,
    valid: bool,
}

impl Cursor {
    pub(crate) fn begin(entries: Arc<[Entry]>, valid: bool) -> Self {
        Self {
            entries,
            position: 0,
            valid,
        }
    }

    pub(crate) fn end(entries: Arc<[Entry]>, valid: bool) -> Self {
        let position = entries.len();
        Self {
            entries,
            position,
            valid,
        }
    }

    /// Whether the cursor was created from a valid value.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.entries.len()
    }

    /// Key of the current entry; invalid at the end or for generic values.
    pub fn key(&self) -> Value {
        self.entries
            .get(self.position)
            .map(|entry| entry.key.clone())
            .unwrap_or_default()
    }

    /// Value of the current entry; invalid at the end.
    pub fn value(&self) -> Value {
        self.entries
            .get(self.position)
            .map(|entry| entry.value.clone())
            .unwrap_or_default()
    }

    /// Moves to the next entry. Saturates at the end.
    pub fn advance(&mut self) {
        if !self.at_end() {
            self.position += 1;
        }
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid
            && self.position == other.position
            && self.entries.len() == other.entries.len()
    }
}

/// Iterator over the entries of a value.
#[derive(Debug, Clone)]
pub struct Iter {
    cursor: Cursor,
}

impl Iter {
    pub(crate) fn new(cursor: Cursor) -> Self {
        Self { cursor }
    }
}

impl Iterator for Iter {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let entry = self.cursor.entries.get(self.cursor.position).cloned()?;
        self.cursor.advance();
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cursor.entries.len() - self.cursor.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter {}
