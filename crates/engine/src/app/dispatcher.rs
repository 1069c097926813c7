use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};
use winit::keyboard::KeyCode;

use super::input::{action_for_key, ActionEdge, ActionStates, InputAction, KeyEdge, ACTION_COUNT};

pub type InputHandler = Box<dyn FnMut(InputAction, KeyEdge)>;

#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Minimum spacing between accepted `down` edges of one action. Zero disables it.
    pub action_debounce: Duration,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            action_debounce: Duration::from_millis(150),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("subscription {0:?} is not registered")]
    UnknownSubscription(SubscriptionId),
    #[error("input dispatcher has been disposed")]
    Disposed,
}

/// Physical origin of a transition. Touch buttons and virtual pads use `Virtual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Key(KeyCode),
    Virtual(InputAction),
}

struct Slot {
    id: SubscriptionId,
    handler: InputHandler,
}

#[derive(Debug, Clone, Copy)]
struct HeldSource {
    action: InputAction,
    down_emitted: bool,
}

/// Single owner of physical input. Translates source transitions into abstract
/// action edges and fans them out to every subscriber, newest first.
///
/// Subscriptions are slots: `replace_handler` swaps the closure in place and the
/// latest closure is the one invoked. No subscriber can swallow an edge; each
/// decides for itself whether it holds focus.
pub struct InputDispatcher {
    config: InputConfig,
    slots: Vec<Slot>,
    next_id: u64,
    held_sources: HashMap<InputSource, HeldSource>,
    held_counts: [u16; ACTION_COUNT],
    last_down_at: [Option<Instant>; ACTION_COUNT],
    disposed: bool,
}

impl InputDispatcher {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            next_id: 1,
            held_sources: HashMap::new(),
            held_counts: [0; ACTION_COUNT],
            last_down_at: [None; ACTION_COUNT],
            disposed: false,
        }
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(InputAction, KeyEdge) + 'static,
    ) -> Result<SubscriptionId, InputError> {
        if self.disposed {
            return Err(InputError::Disposed);
        }
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.slots.push(Slot {
            id,
            handler: Box::new(handler),
        });
        debug!(subscription = id.0, subscribers = self.slots.len(), "input_subscribed");
        Ok(id)
    }

    pub fn replace_handler(
        &mut self,
        id: SubscriptionId,
        handler: impl FnMut(InputAction, KeyEdge) + 'static,
    ) -> Result<(), InputError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.id == id)
            .ok_or(InputError::UnknownSubscription(id))?;
        slot.handler = Box::new(handler);
        Ok(())
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), InputError> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.id == id)
            .ok_or(InputError::UnknownSubscription(id))?;
        self.slots.remove(index);
        debug!(subscription = id.0, subscribers = self.slots.len(), "input_unsubscribed");
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots.len()
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        pressed: bool,
        repeat: bool,
        now: Instant,
    ) -> Option<ActionEdge> {
        self.handle_source(InputSource::Key(key), pressed, repeat, now)
    }

    /// Entry point shared by every physical adapter. Returns the edge that was
    /// dispatched, if any.
    pub fn handle_source(
        &mut self,
        source: InputSource,
        pressed: bool,
        repeat: bool,
        now: Instant,
    ) -> Option<ActionEdge> {
        if self.disposed || (pressed && repeat) {
            return None;
        }
        let action = match source {
            InputSource::Key(key) => action_for_key(key)?,
            InputSource::Virtual(action) => action,
        };

        if pressed {
            if self.held_sources.contains_key(&source) {
                return None;
            }
            let index = action.index();
            self.held_counts[index] = self.held_counts[index].saturating_add(1);
            let down_emitted = !self.is_debounced(action, now);
            self.held_sources.insert(
                source,
                HeldSource {
                    action,
                    down_emitted,
                },
            );
            if !down_emitted {
                debug!(?action, "input_debounced");
                return None;
            }
            self.last_down_at[index] = Some(now);
            let edge = ActionEdge::down(action);
            self.dispatch(edge);
            Some(edge)
        } else {
            let held = self.held_sources.remove(&source)?;
            let index = held.action.index();
            self.held_counts[index] = self.held_counts[index].saturating_sub(1);
            if !held.down_emitted {
                return None;
            }
            let edge = ActionEdge::up(held.action);
            self.dispatch(edge);
            Some(edge)
        }
    }

    pub fn is_held(&self, action: InputAction) -> bool {
        self.held_counts[action.index()] > 0
    }

    pub fn held(&self) -> ActionStates {
        let mut states = ActionStates::default();
        for action in InputAction::ALL {
            states.set(action, self.is_held(action));
        }
        states
    }

    /// Forgets held sources without emitting `up` edges, e.g. after focus loss.
    pub fn release_all(&mut self) {
        self.held_sources.clear();
        self.held_counts = [0; ACTION_COUNT];
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        info!(subscribers = self.slots.len(), "input_dispatcher_disposed");
        self.slots.clear();
        self.release_all();
        self.disposed = true;
    }

    fn is_debounced(&self, action: InputAction, now: Instant) -> bool {
        if self.config.action_debounce.is_zero() {
            return false;
        }
        match self.last_down_at[action.index()] {
            Some(last) => now.saturating_duration_since(last) < self.config.action_debounce,
            None => false,
        }
    }

    fn dispatch(&mut self, edge: ActionEdge) {
        for slot in self.slots.iter_mut().rev() {
            (slot.handler)(edge.action, edge.edge);
        }
    }
}

/// Shared buffer a consumer subscribes with and drains at tick boundaries.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    edges: Rc<RefCell<VecDeque<ActionEdge>>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> impl FnMut(InputAction, KeyEdge) + 'static {
        let edges = Rc::clone(&self.edges);
        move |action, edge| edges.borrow_mut().push_back(ActionEdge { action, edge })
    }

    pub fn drain(&self) -> Vec<ActionEdge> {
        self.edges.borrow_mut().drain(..).collect()
    }

    pub fn clear(&self) {
        self.edges.borrow_mut().clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.edges.borrow().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.edges.borrow().is_empty()
    }
}
