//! The [`World`] owns the entity allocator, the component registry and one
//! typed table per registered component kind.
//!
//! Besides plain attach/detach/get, the world tracks two per-entity flags:
//!
//! - **prefab**: a template entity. It keeps its components so it can be
//!   [`instantiate`](World::instantiate)d, but never matches a query.
//! - **disabled**: an inert entity. Its components stay readable through
//!   [`get_component`](World::get_component), but it never matches a query
//!   until re-enabled. [`reclaim_disabled`](World::reclaim_disabled) frees
//!   the slots of every disabled entity.

use std::any::TypeId;
use std::collections::HashMap;

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::entity::{EntityAllocator, EntityId};
use crate::storage::{ComponentStorage, Storage};
use crate::EcsError;

// ---------------------------------------------------------------------------
// Entity flags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EntityFlags {
    prefab: bool,
    disabled: bool,
}

impl EntityFlags {
    fn bits(self) -> u8 {
        (self.prefab as u8) | (self.disabled as u8) << 1
    }
}

// ---------------------------------------------------------------------------
// ComponentBundle
// ---------------------------------------------------------------------------

/// One pending component in a [`ComponentBundle`].
trait BundleEntry: Send {
    fn rust_type(&self) -> TypeId;
    fn insert_into(self: Box<Self>, world: &mut World, entity: EntityId) -> Result<(), EcsError>;
}

struct Entry<T>(T);

impl<T: Component> BundleEntry for Entry<T> {
    fn rust_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn insert_into(self: Box<Self>, world: &mut World, entity: EntityId) -> Result<(), EcsError> {
        world.insert_component(entity, self.0)
    }
}

/// A set of component values applied to an entity in one step.
///
/// Used both to spawn entities and as the override list of
/// [`World::instantiate`].
///
/// ```
/// use breakout_ecs::prelude::*;
///
/// #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// struct Hp(u32);
///
/// let mut world = World::new();
/// world.register_component::<Hp>("hp");
/// let e = world.spawn_bundle(ComponentBundle::new().with(Hp(3))).unwrap();
/// assert_eq!(world.get_component::<Hp>(e).unwrap(), &Hp(3));
/// ```
#[derive(Default)]
pub struct ComponentBundle {
    entries: Vec<Box<dyn BundleEntry>>,
}

impl ComponentBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component to the bundle.
    ///
    /// # Panics
    ///
    /// Panics if a value of the same type is already in the bundle.
    pub fn add<T: Component>(&mut self, value: T) {
        let type_id = TypeId::of::<T>();
        if self.entries.iter().any(|e| e.rust_type() == type_id) {
            panic!(
                "duplicate component type {} in ComponentBundle",
                std::any::type_name::<T>()
            );
        }
        self.entries.push(Box::new(Entry(value)));
    }

    /// Builder form of [`add`](Self::add).
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.add(value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ComponentBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBundle")
            .field("len", &self.entries.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The component store and entity registry.
pub struct World {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    /// One table per registered kind, indexed by `ComponentTypeId`.
    storages: Vec<Box<dyn Storage>>,
    /// Indexed by entity slot.
    flags: Vec<EntityFlags>,
    names: HashMap<String, EntityId>,
    names_reverse: HashMap<u32, String>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.entity_count())
            .field("component_kinds", &self.storages.len())
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            registry: ComponentRegistry::new(),
            storages: Vec::new(),
            flags: Vec::new(),
            names: HashMap::new(),
            names_reverse: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register a component kind and create its table.
    pub fn register_component<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        let id = self.registry.register::<T>(name);
        if id.index() == self.storages.len() {
            self.storages.push(Box::new(ComponentStorage::<T>::new()));
        }
        id
    }

    // -- typed table access -------------------------------------------------

    fn unknown<T: 'static>(&self) -> EcsError {
        EcsError::UnknownComponent {
            name: std::any::type_name::<T>().to_owned(),
            registered: self.registry.registered_names().join(", "),
        }
    }

    pub(crate) fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        let id = self.registry.lookup::<T>()?;
        self.storages[id.index()]
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Result<&mut ComponentStorage<T>, EcsError> {
        let Some(id) = self.registry.lookup::<T>() else {
            return Err(self.unknown::<T>());
        };
        Ok(self.storages[id.index()]
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("table type matches its registration"))
    }

    fn ensure_live(&self, entity: EntityId) -> Result<(), EcsError> {
        if self.allocator.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity { entity })
        }
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create an entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        let entity = self.allocator.allocate();
        let idx = entity.index() as usize;
        if idx >= self.flags.len() {
            self.flags.resize(idx + 1, EntityFlags::default());
        }
        self.flags[idx] = EntityFlags::default();
        entity
    }

    /// Create an entity and attach every component in `bundle`.
    ///
    /// If any component kind is unregistered the half-built entity is
    /// despawned and the error returned.
    pub fn spawn_bundle(&mut self, bundle: ComponentBundle) -> Result<EntityId, EcsError> {
        let entity = self.spawn();
        if let Err(e) = self.apply_bundle(entity, bundle) {
            self.despawn(entity)?;
            return Err(e);
        }
        Ok(entity)
    }

    /// Create an entity registered under a unique `name`.
    pub fn spawn_named(&mut self, name: &str, bundle: ComponentBundle) -> Result<EntityId, EcsError> {
        self.check_name_free(name)?;
        let entity = self.spawn_bundle(bundle)?;
        self.bind_name(entity, name);
        Ok(entity)
    }

    /// Create a template entity. Prefabs never match queries.
    pub fn spawn_prefab(&mut self, name: &str, bundle: ComponentBundle) -> Result<EntityId, EcsError> {
        let prefab = self.spawn_named(name, bundle)?;
        self.flags[prefab.index() as usize].prefab = true;
        tracing::debug!(%prefab, name, "prefab created");
        Ok(prefab)
    }

    /// Spawn an unnamed instance of `prefab`. See [`instantiate_named`](Self::instantiate_named).
    pub fn instantiate(&mut self, prefab: EntityId, overrides: ComponentBundle) -> Result<EntityId, EcsError> {
        self.ensure_live(prefab)?;
        if !self.is_prefab(prefab) {
            return Err(EcsError::NotAPrefab { entity: prefab });
        }
        let instance = self.spawn();
        for table in &mut self.storages {
            table.copy_slot(prefab.index(), instance.index());
        }
        if let Err(e) = self.apply_bundle(instance, overrides) {
            self.despawn(instance)?;
            return Err(e);
        }
        Ok(instance)
    }

    /// Spawn a new entity carrying a copy of every component `prefab` has
    /// right now, then apply `overrides` on top.
    ///
    /// The copy is a snapshot: changing the prefab afterwards does not touch
    /// instances that already exist.
    pub fn instantiate_named(
        &mut self,
        prefab: EntityId,
        name: &str,
        overrides: ComponentBundle,
    ) -> Result<EntityId, EcsError> {
        self.check_name_free(name)?;
        let instance = self.instantiate(prefab, overrides)?;
        self.bind_name(instance, name);
        Ok(instance)
    }

    /// Remove an entity and every component it holds, recycling its slot.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.ensure_live(entity)?;
        for table in &mut self.storages {
            table.remove(entity.index());
        }
        self.flags[entity.index() as usize] = EntityFlags::default();
        if let Some(name) = self.names_reverse.remove(&entity.index()) {
            self.names.remove(&name);
        }
        self.allocator.deallocate(entity);
        Ok(())
    }

    fn apply_bundle(&mut self, entity: EntityId, bundle: ComponentBundle) -> Result<(), EcsError> {
        for entry in bundle.entries {
            entry.insert_into(self, entity)?;
        }
        Ok(())
    }

    // -- names --------------------------------------------------------------

    fn check_name_free(&self, name: &str) -> Result<(), EcsError> {
        match self.names.get(name) {
            Some(&existing) => Err(EcsError::DuplicateName {
                name: name.to_owned(),
                existing,
            }),
            None => Ok(()),
        }
    }

    fn bind_name(&mut self, entity: EntityId, name: &str) {
        self.names.insert(name.to_owned(), entity);
        self.names_reverse.insert(entity.index(), name.to_owned());
    }

    /// Entity registered under `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    pub fn name_of(&self, entity: EntityId) -> Option<&str> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.names_reverse.get(&entity.index()).map(String::as_str)
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`, overwriting any value of the same kind.
    pub fn insert_component<T: Component>(&mut self, entity: EntityId, value: T) -> Result<(), EcsError> {
        self.ensure_live(entity)?;
        self.storage_mut::<T>()?.insert(entity.index(), value);
        Ok(())
    }

    /// Detach a component. Detaching an absent component is a no-op.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.ensure_live(entity)?;
        self.storage_mut::<T>()?.take(entity.index());
        Ok(())
    }

    /// Read a component.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentNotFound`] when the entity lacks `T`. Systems only
    /// ask for components their signature guarantees, so callers propagate
    /// this rather than recover from it.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Result<&T, EcsError> {
        self.ensure_live(entity)?;
        let table = self.storage::<T>().ok_or_else(|| self.unknown::<T>())?;
        table
            .get(entity.index())
            .ok_or_else(|| EcsError::ComponentNotFound {
                entity,
                component: self.registry.name_of::<T>(),
            })
    }

    /// Mutable form of [`get_component`](Self::get_component).
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        self.ensure_live(entity)?;
        let Some(id) = self.registry.lookup::<T>() else {
            return Err(self.unknown::<T>());
        };
        let registry = &self.registry;
        self.storages[id.index()]
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("table type matches its registration")
            .get_mut(entity.index())
            .ok_or_else(|| EcsError::ComponentNotFound {
                entity,
                component: registry.name_of::<T>(),
            })
    }

    /// Whether `entity` currently holds a `T`. Never fails.
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
            && self
                .registry
                .lookup::<T>()
                .is_some_and(|id| self.storages[id.index()].contains(entity.index()))
    }

    // -- enable / disable ---------------------------------------------------

    /// Make `entity` inert: it keeps its data but stops matching queries.
    pub fn disable(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.ensure_live(entity)?;
        self.flags[entity.index() as usize].disabled = true;
        Ok(())
    }

    pub fn enable(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.ensure_live(entity)?;
        self.flags[entity.index() as usize].disabled = false;
        Ok(())
    }

    /// `false` for disabled and dead entities.
    pub fn is_enabled(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity) && !self.flags[entity.index() as usize].disabled
    }

    pub fn is_prefab(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity) && self.flags[entity.index() as usize].prefab
    }

    /// Despawn every disabled, non-prefab entity. Returns how many slots
    /// were freed.
    pub fn reclaim_disabled(&mut self) -> usize {
        let doomed: Vec<EntityId> = self
            .entities()
            .filter(|e| {
                let f = self.flags[e.index() as usize];
                f.disabled && !f.prefab
            })
            .collect();
        for &entity in &doomed {
            // Liveness was just checked; despawn cannot fail here.
            let _ = self.despawn(entity);
        }
        if !doomed.is_empty() {
            tracing::debug!(reclaimed = doomed.len(), "disabled entities reclaimed");
        }
        doomed.len()
    }

    // -- inspection ---------------------------------------------------------

    /// All live entities (prefabs and disabled ones included), by slot order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.allocator.slot_count() as u32).filter_map(|i| self.allocator.live_at(i))
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Whether the entity in slot `index` is live, enabled and not a prefab.
    pub(crate) fn is_active_slot(&self, index: u32) -> Option<EntityId> {
        let entity = self.allocator.live_at(index)?;
        let f = self.flags[index as usize];
        (!f.prefab && !f.disabled).then_some(entity)
    }

    pub(crate) fn slot_count(&self) -> u32 {
        self.allocator.slot_count() as u32
    }

    /// blake3 digest of the whole world: every live entity's handle, flags,
    /// name and component values, in slot and registration order.
    pub fn state_hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for entity in self.entities() {
            hasher.update(&entity.to_raw().to_le_bytes());
            hasher.update(&[self.flags[entity.index() as usize].bits()]);
            if let Some(name) = self.names_reverse.get(&entity.index()) {
                hasher.update(name.as_bytes());
            }
            for (kind, table) in self.storages.iter().enumerate() {
                hasher.update(&(kind as u32).to_le_bytes());
                table.hash_slot(entity.index(), &mut hasher);
            }
        }
        hasher.finalize()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
