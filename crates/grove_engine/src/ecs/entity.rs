//! Entity implementation
//!
//! An entity is shared as `Rc<Entity>` and mutated through interior
//! mutability, so a component running inside one of its hooks can still move
//! its entity, look up siblings and broadcast without holding `&mut Entity`.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, Key};

use super::{Component, EntityError, EntityManager, ManagerHandle, Message, Subscriptions, Topic};
use crate::foundation::math::{Quat, Transform, Vec3};

new_key_type! {
    /// Entity identifier, assigned when the entity is registered
    pub struct EntityId;
}

struct ComponentSlot {
    type_id: TypeId,
    type_name: &'static str,
    behaviour: Rc<RefCell<dyn Component>>,
    concrete: Rc<dyn Any>,
}

type Target = (&'static str, Rc<RefCell<dyn Component>>);

/// World object with a transform and an ordered set of components
pub struct Entity {
    id: Cell<EntityId>,
    name: RefCell<Option<String>>,
    position: Cell<Vec3>,
    rotation: Cell<Quat>,
    active: Cell<bool>,
    initialized: Cell<bool>,
    destroyed: Cell<bool>,
    components: RefCell<Vec<ComponentSlot>>,
    handlers: RefCell<HashMap<Topic, Vec<usize>>>,
    manager: RefCell<Option<ManagerHandle>>,
    this: Weak<Entity>,
}

impl Entity {
    /// Create an empty, unregistered entity at the origin
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            id: Cell::new(EntityId::null()),
            name: RefCell::new(None),
            position: Cell::new(Vec3::zeros()),
            rotation: Cell::new(Quat::identity()),
            active: Cell::new(true),
            initialized: Cell::new(false),
            destroyed: Cell::new(false),
            components: RefCell::new(Vec::new()),
            handlers: RefCell::new(HashMap::new()),
            manager: RefCell::new(None),
            this: this.clone(),
        })
    }

    /// Create an unregistered entity at `position`
    pub fn at(position: Vec3) -> Rc<Self> {
        let entity = Self::new();
        entity.position.set(position);
        entity
    }

    /// Identifier; null until registered
    pub fn id(&self) -> EntityId {
        self.id.get()
    }

    /// Registered name, if any
    pub fn name(&self) -> Option<String> {
        self.name.borrow().clone()
    }

    /// Weak reference to this entity
    pub fn downgrade(&self) -> Weak<Entity> {
        self.this.clone()
    }

    /// Whether the manager updates this entity
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Inactive entities stay registered and visible to lookups
    pub fn set_active(&self, active: bool) {
        if self.active.replace(active) != active {
            log::debug!("Entity {} is now {}", self, if active { "active" } else { "inactive" });
        }
    }

    /// Whether components have been initialised (the component set is fixed)
    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Whether the entity has been torn down; its components are gone and
    /// it receives nothing further
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Current world position
    pub fn position(&self) -> Vec3 {
        self.position.get()
    }

    /// Current orientation
    pub fn rotation(&self) -> Quat {
        self.rotation.get()
    }

    /// Position and orientation together
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position.get(),
            rotation: self.rotation.get(),
        }
    }

    /// Move the entity and notify `TransformChanged` subscribers immediately
    pub fn set_position(&self, position: Vec3) {
        self.position.set(position);
        self.broadcast(&Message::transform_changed(position, self.rotation.get()));
    }

    /// Rotate the entity and notify `TransformChanged` subscribers immediately
    pub fn set_rotation(&self, rotation: Quat) {
        self.rotation.set(rotation);
        self.broadcast(&Message::transform_changed(self.position.get(), rotation));
    }

    /// Move and rotate together with a single notification
    pub fn set_transform(&self, transform: Transform) {
        self.position.set(transform.position);
        self.rotation.set(transform.rotation);
        self.broadcast(&Message::transform_changed(transform.position, transform.rotation));
    }

    /// Attach a component; returns a typed handle to it.
    ///
    /// Fails once the entity is initialised, and for a second component of
    /// the same type.
    pub fn add_component<T: Component>(&self, component: T) -> Result<Rc<RefCell<T>>, EntityError> {
        let type_name = std::any::type_name::<T>();
        if self.initialized.get() {
            return Err(EntityError::AlreadyInitialized { component: type_name });
        }

        let mut components = self.components.borrow_mut();
        if components.iter().any(|slot| slot.type_id == TypeId::of::<T>()) {
            return Err(EntityError::DuplicateComponent(type_name));
        }

        let concrete = Rc::new(RefCell::new(component));
        let behaviour: Rc<RefCell<dyn Component>> = concrete.clone();
        let any: Rc<dyn Any> = concrete.clone();
        components.push(ComponentSlot {
            type_id: TypeId::of::<T>(),
            type_name,
            behaviour,
            concrete: any,
        });
        Ok(concrete)
    }

    /// Typed sibling lookup
    pub fn get_component<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        let components = self.components.borrow();
        let slot = components.iter().find(|slot| slot.type_id == TypeId::of::<T>())?;
        Rc::clone(&slot.concrete).downcast::<RefCell<T>>().ok()
    }

    /// Whether any component listens for `topic`
    pub fn subscribes_to(&self, topic: Topic) -> bool {
        self.handlers
            .borrow()
            .get(&topic)
            .is_some_and(|indices| !indices.is_empty())
    }

    /// Whether a component of type `T` is attached
    pub fn has_component<T: Component>(&self) -> bool {
        self.components
            .borrow()
            .iter()
            .any(|slot| slot.type_id == TypeId::of::<T>())
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.borrow().len()
    }

    /// Type names of attached components, in update order
    pub fn component_names(&self) -> Vec<&'static str> {
        self.components.borrow().iter().map(|slot| slot.type_name).collect()
    }

    /// Deliver `message` to every subscribed component of this entity, in
    /// subscription order.
    ///
    /// Delivery is synchronous and local to this entity. A component that is
    /// itself mid-hook (typically the sender) is skipped rather than
    /// re-entered, so a component never receives its own broadcasts. If a
    /// handler tears the entity down, delivery stops there.
    pub fn broadcast(&self, message: &Message) {
        for (type_name, behaviour) in self.subscribers(message.topic) {
            if self.destroyed.get() {
                break;
            }
            match behaviour.try_borrow_mut() {
                Ok(mut component) => component.on_message(self, message),
                Err(_) => log::warn!(
                    "Skipping re-entrant {:?} delivery to {} on entity {}",
                    message.topic, type_name, self
                ),
            }
        }
    }

    /// Manager this entity is registered with
    pub fn manager(&self) -> Option<EntityManager> {
        self.manager.borrow().as_ref().and_then(ManagerHandle::upgrade)
    }

    /// Look up another entity by name through the manager
    pub fn find_entity(&self, name: &str) -> Option<Rc<Entity>> {
        self.manager()?.get(name)
    }

    pub(crate) fn attach(&self, id: EntityId, name: Option<String>, manager: ManagerHandle) {
        self.id.set(id);
        *self.name.borrow_mut() = name;
        *self.manager.borrow_mut() = Some(manager);
    }

    /// Initialise every component in attachment order, recording their
    /// subscriptions.
    pub(crate) fn init_entity(&self) {
        if self.initialized.replace(true) {
            return;
        }

        for (index, (type_name, behaviour)) in self.targets().into_iter().enumerate() {
            let mut subscriptions = Subscriptions::default();
            match behaviour.try_borrow_mut() {
                Ok(mut component) => component.init(self, &mut subscriptions),
                Err(_) => {
                    log::error!("Component {} on entity {} is busy during init", type_name, self);
                    continue;
                }
            }

            let mut handlers = self.handlers.borrow_mut();
            for topic in subscriptions.topics() {
                handlers.entry(*topic).or_default().push(index);
            }
        }
    }

    pub(crate) fn update(&self, delta_time: f32) {
        for (type_name, behaviour) in self.targets() {
            if self.destroyed.get() {
                break;
            }
            match behaviour.try_borrow_mut() {
                Ok(mut component) => component.update(self, delta_time),
                Err(_) => log::warn!("Component {} on entity {} is busy; update skipped", type_name, self),
            }
        }
    }

    /// Run teardown hooks in reverse attachment order and drop the
    /// components.
    pub(crate) fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        for (type_name, behaviour) in self.targets().into_iter().rev() {
            match behaviour.try_borrow_mut() {
                Ok(mut component) => component.destroy(self),
                // The component asked for this removal from inside a hook
                Err(_) => log::debug!("Teardown hook of busy {} on entity {} skipped", type_name, self),
            }
        }

        self.handlers.borrow_mut().clear();
        let components = std::mem::take(&mut *self.components.borrow_mut());
        drop(components);
        self.active.set(false);
        *self.manager.borrow_mut() = None;
    }

    fn targets(&self) -> Vec<Target> {
        self.components
            .borrow()
            .iter()
            .map(|slot| (slot.type_name, Rc::clone(&slot.behaviour)))
            .collect()
    }

    fn subscribers(&self, topic: Topic) -> Vec<Target> {
        let handlers = self.handlers.borrow();
        let Some(indices) = handlers.get(&topic) else {
            return Vec::new();
        };
        let components = self.components.borrow();
        indices
            .iter()
            .filter_map(|&index| components.get(index))
            .map(|slot| (slot.type_name, Rc::clone(&slot.behaviour)))
            .collect()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.borrow().as_deref() {
            Some(name) => write!(f, "'{}'", name),
            None => write!(f, "{:?}", self.id.get()),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id.get())
            .field("name", &self.name.borrow())
            .field("position", &self.position.get())
            .field("active", &self.active.get())
            .field("destroyed", &self.destroyed.get())
            .field("components", &self.component_names())
            .finish()
    }
}
