//! Observer registry shared by all requests of a node.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use crate::resource::{
    DetailGettable, DetailGettableClient, ListGettable, ListGettableClient, SinglePostable,
    SinglePostableClient,
};

/// Request flow an observer listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// List GET.
    ListGet,
    /// Detail GET.
    DetailGet,
    /// Single POST.
    SinglePost,
}

/// Handle returned by the `attach_*` methods, used to detach again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

struct Entry {
    id: ClientId,
    // Holds an `Arc<dyn XClient<T>>` matching the slot's capability and type.
    client: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct Slots {
    next_id: u64,
    by_key: HashMap<(Capability, TypeId), Vec<Entry>>,
}

/// Observers per capability and resource type, behind one lock.
///
/// Notification takes a snapshot of the observers under the read lock and
/// calls them after releasing it, so an observer may attach or detach from
/// inside its callback.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use drf_consumer::resource::{
///     Capability, ClientRegistry, ListFailure, ListGettable, ListGettableClient, ListSuccess,
///     Resource,
/// };
///
/// #[derive(Debug, serde::Deserialize)]
/// struct Tag {
///     name: String,
/// }
///
/// impl Resource for Tag {
///     const RESOURCE_NAME: &'static str = "tags";
/// }
///
/// impl ListGettable for Tag {}
///
/// struct Printer;
///
/// impl ListGettableClient<Tag> for Printer {
///     fn got_objects(&self, objects: &[Tag], _success: &ListSuccess) {
///         println!("{} tags", objects.len());
///     }
///
///     fn failed_getting_objects(&self, failure: &ListFailure) {
///         eprintln!("{}", failure.error);
///     }
/// }
///
/// let registry = ClientRegistry::new();
/// let id = registry.attach_list_client::<Tag>(Arc::new(Printer));
/// assert_eq!(registry.client_count::<Tag>(Capability::ListGet), 1);
///
/// assert!(registry.detach(id));
/// assert_eq!(registry.client_count::<Tag>(Capability::ListGet), 0);
/// ```
#[derive(Default)]
pub struct ClientRegistry {
    slots: RwLock<Slots>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an observer of list GETs of `T`.
    pub fn attach_list_client<T: ListGettable>(
        &self,
        client: Arc<dyn ListGettableClient<T>>,
    ) -> ClientId {
        self.attach(Capability::ListGet, TypeId::of::<T>(), client)
    }

    /// Attaches an observer of detail GETs of `T`.
    pub fn attach_detail_client<T: DetailGettable>(
        &self,
        client: Arc<dyn DetailGettableClient<T>>,
    ) -> ClientId {
        self.attach(Capability::DetailGet, TypeId::of::<T>(), client)
    }

    /// Attaches an observer of single POSTs of `T`.
    pub fn attach_post_client<T: SinglePostable>(
        &self,
        client: Arc<dyn SinglePostableClient<T>>,
    ) -> ClientId {
        self.attach(Capability::SinglePost, TypeId::of::<T>(), client)
    }

    /// Detaches the observer registered under `id`.
    ///
    /// Returns false if no such observer is attached.
    pub fn detach(&self, id: ClientId) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for entries in slots.by_key.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed |= entries.len() != before;
        }
        slots.by_key.retain(|_, entries| !entries.is_empty());
        removed
    }

    /// Detaches every observer.
    pub fn clear(&self) {
        self.slots.write().unwrap_or_else(PoisonError::into_inner).by_key.clear();
    }

    /// Number of observers of `capability` for `T`.
    #[must_use]
    pub fn client_count<T: 'static>(&self, capability: Capability) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.by_key.get(&(capability, TypeId::of::<T>())).map_or(0, Vec::len)
    }

    /// Total number of attached observers.
    #[must_use]
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.by_key.values().map(Vec::len).sum()
    }

    /// Returns true if no observer is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn list_clients<T: ListGettable>(&self) -> Vec<Arc<dyn ListGettableClient<T>>> {
        self.snapshot(Capability::ListGet, TypeId::of::<T>())
    }

    pub(crate) fn detail_clients<T: DetailGettable>(
        &self,
    ) -> Vec<Arc<dyn DetailGettableClient<T>>> {
        self.snapshot(Capability::DetailGet, TypeId::of::<T>())
    }

    pub(crate) fn post_clients<T: SinglePostable>(&self) -> Vec<Arc<dyn SinglePostableClient<T>>> {
        self.snapshot(Capability::SinglePost, TypeId::of::<T>())
    }

    fn attach<C>(&self, capability: Capability, type_id: TypeId, client: Arc<C>) -> ClientId
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let id = ClientId(slots.next_id);
        slots.next_id += 1;
        slots
            .by_key
            .entry((capability, type_id))
            .or_default()
            .push(Entry { id, client: Box::new(client) });
        id
    }

    fn snapshot<C>(&self, capability: Capability, type_id: TypeId) -> Vec<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.by_key.get(&(capability, type_id)).map_or_else(Vec::new, |entries| {
            entries
                .iter()
                .filter_map(|entry| entry.client.downcast_ref::<Arc<C>>())
                .map(Arc::clone)
                .collect()
        })
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry").field("clients", &self.len()).finish()
    }
}
