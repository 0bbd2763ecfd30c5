use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use thiserror::Error;

/// Change callback invoked once per [`ControllableState::set`].
pub type OnChange<T> = Rc<dyn Fn(&T)>;

/// Who owns a value: the consumer (`Controlled`) or the primitive (`Uncontrolled`,
/// carrying the default it starts from).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control<T> {
    /// The consumer supplies the current value on every render.
    Controlled(T),
    /// The primitive manages the value, starting from this default.
    Uncontrolled(T),
}

impl<T> Control<T> {
    /// Builds a control from the usual pair of optional props.
    pub fn from_props(default: T, controlled: Option<T>) -> Self {
        match controlled {
            Some(value) => Self::Controlled(value),
            None => Self::Uncontrolled(default),
        }
    }

    /// Returns true for [`Control::Controlled`].
    pub fn is_controlled(&self) -> bool {
        matches!(self, Self::Controlled(_))
    }

    /// Maps the carried value, keeping the mode.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Control<U> {
        match self {
            Self::Controlled(value) => Control::Controlled(f(value)),
            Self::Uncontrolled(value) => Control::Uncontrolled(f(value)),
        }
    }

    /// Returns the carried value.
    pub fn into_value(self) -> T {
        match self {
            Self::Controlled(value) | Self::Uncontrolled(value) => value,
        }
    }
}

impl<T: Default> Default for Control<T> {
    fn default() -> Self {
        Self::Uncontrolled(T::default())
    }
}

/// A transition that was requested by a user interaction.
///
/// In controlled mode `next` is only a request; the displayed value changes once
/// the consumer passes it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChange<T> {
    /// The value displayed before the request.
    pub previous: T,
    /// The requested value.
    pub next: T,
}

/// An instance switched between controlled and uncontrolled after creation.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeMismatch {
    #[error("a controlled value was omitted after the state was created as controlled")]
    /// Created controlled, later rendered without a controlled value.
    BecameUncontrolled,
    #[error("a controlled value was supplied after the state was created as uncontrolled")]
    /// Created uncontrolled, later rendered with a controlled value.
    BecameControlled,
}

/// A single value that is either owned by the consumer or by the primitive.
///
/// The mode is chosen once, at creation. `set` never mutates a controlled value;
/// it only notifies. For an uncontrolled value it stores first and notifies after.
pub struct ControllableState<T> {
    controlled: bool,
    value: RefCell<T>,
    on_change: RefCell<Option<OnChange<T>>>,
    mismatch_reported: Cell<bool>,
}

impl<T: Clone> ControllableState<T> {
    /// Creates the state from a [`Control`].
    pub fn new(control: Control<T>) -> Self {
        let controlled = control.is_controlled();
        Self {
            controlled,
            value: RefCell::new(control.into_value()),
            on_change: RefCell::new(None),
            mismatch_reported: Cell::new(false),
        }
    }

    /// Creates the state from an initial value, an optional controlled value and an
    /// optional change callback.
    pub fn create(initial: T, controlled: Option<T>, on_change: Option<OnChange<T>>) -> Self {
        let state = Self::new(Control::from_props(initial, controlled));
        state.set_on_change(on_change);
        state
    }

    /// Sets the change callback, returning `self`.
    pub fn with_on_change(self, on_change: impl Fn(&T) + 'static) -> Self {
        self.set_on_change(Some(Rc::new(on_change)));
        self
    }

    /// Replaces the change callback.
    pub fn set_on_change(&self, on_change: Option<OnChange<T>>) {
        *self.on_change.borrow_mut() = on_change;
    }

    /// Returns the current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Returns true if the consumer owns the value.
    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    /// Requests `next`. Stores it when uncontrolled, then invokes the change callback
    /// exactly once. No borrow is held while the callback runs.
    pub fn set(&self, next: T) {
        if !self.controlled {
            *self.value.borrow_mut() = next.clone();
        }

        let on_change = self.on_change.borrow().clone();
        if let Some(on_change) = on_change {
            on_change(&next);
        }
    }

    /// Applies the props of a new render.
    ///
    /// A controlled value replaces the stored one. A change of mode is never
    /// applied; it is returned as an error and warned about once per instance.
    pub fn sync(&self, control: Control<T>) -> Result<(), ModeMismatch> {
        let mismatch = match (self.controlled, control) {
            (true, Control::Controlled(value)) => {
                *self.value.borrow_mut() = value;
                return Ok(());
            }
            (false, Control::Uncontrolled(_)) => return Ok(()),
            (true, Control::Uncontrolled(_)) => ModeMismatch::BecameUncontrolled,
            (false, Control::Controlled(_)) => ModeMismatch::BecameControlled,
        };

        if !self.mismatch_reported.replace(true) {
            tracing::warn!(
                error = %mismatch,
                "state mode is fixed at creation; ignoring the switch"
            );
        }

        Err(mismatch)
    }
}

impl<T: fmt::Debug> fmt::Debug for ControllableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllableState")
            .field("controlled", &self.controlled)
            .field("value", &*self.value.borrow())
            .finish_non_exhaustive()
    }
}
