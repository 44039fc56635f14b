use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A named event carrying an arbitrary payload.
///
/// Cloning an event is cheap: the name and the payload are shared.
#[derive(Clone)]
pub struct Event {
    name: Arc<str>,
    detail: Arc<dyn Any + Send + Sync>,
}

impl Event {
    /// Create an event with the given name and payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use partyline::bus::Event;
    ///
    /// let event = Event::new("resize", (800u32, 600u32));
    /// assert_eq!(event.name(), "resize");
    /// assert_eq!(event.detail::<(u32, u32)>(), Some(&(800, 600)));
    /// assert_eq!(event.detail::<String>(), None);
    /// ```
    pub fn new<D>(name: impl Into<Arc<str>>, detail: D) -> Self
    where
        D: Any + Send + Sync,
    {
        Self {
            name: name.into(),
            detail: Arc::new(detail),
        }
    }

    /// The event name listeners are registered against.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the payload as `D`, or `None` if it holds another type.
    pub fn detail<D: Any>(&self) -> Option<&D> {
        self.detail.downcast_ref::<D>()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
