//! Synchronous change notifications.
//!
//! Listeners run immediately, in registration order, on the thread that
//! emits the event. A listener cannot subscribe or unsubscribe while an
//! event is being delivered, since delivery holds the notifier mutably.

use std::fmt;

use crate::controller::ToolMode;
use crate::error::Rejection;
use crate::model::ShapeKind;

/// Something the user should be told about, without it being an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// A finished gesture produced nothing
    Rejected(Rejection),
    /// Drawing was attempted without a current label
    NoLabel,
    /// A self-intersecting polygon was replaced by its traced outline
    PolygonRepaired { before: usize, after: usize },
    /// A segmentation response arrived after its prompts were superseded
    StaleSegmentation { sequence: u64, latest: u64 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Rejected(r) => write!(f, "{r}"),
            Advisory::NoLabel => f.write_str("Select a label first"),
            Advisory::PolygonRepaired { before, after } => {
                write!(f, "Self-intersecting polygon repaired ({before} -> {after} vertices)")
            }
            Advisory::StaleSegmentation { sequence, latest } => {
                write!(f, "Ignored segmentation result #{sequence}, latest is #{latest}")
            }
        }
    }
}

/// Events emitted by the interaction controller.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Visible state changed; repaint
    Redraw,
    Advisory(Advisory),
    ModeChanged(ToolMode),
    SelectionChanged(Option<usize>),
    /// A new annotation was appended at `index`
    AnnotationCommitted { index: usize, kind: ShapeKind },
    /// Annotations were removed, relabelled or restored
    AnnotationsChanged,
    PromptsChanged,
}

/// Handle returned by [`Notifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Observer registry delivering [`EditorEvent`]s synchronously.
#[derive(Default)]
pub struct Notifier {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every listener in registration order.
    pub fn emit(&mut self, event: EditorEvent) {
        log::trace!("Event: {:?} -> {} listeners", event, self.listeners.len());
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn redraw(&mut self) {
        self.emit(EditorEvent::Redraw);
    }

    pub fn advise(&mut self, advisory: Advisory) {
        log::info!("{}", advisory);
        self.emit(EditorEvent::Advisory(advisory));
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = Notifier::new();
        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            notifier.subscribe(move |_| log.borrow_mut().push(tag));
        }
        notifier.redraw();
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut notifier = Notifier::new();
        let c = Rc::clone(&count);
        let id = notifier.subscribe(move |_| *c.borrow_mut() += 1);
        notifier.redraw();
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.redraw();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_delivery_is_synchronous() {
        let seen = Rc::new(RefCell::new(None));
        let mut notifier = Notifier::new();
        let s = Rc::clone(&seen);
        notifier.subscribe(move |e| *s.borrow_mut() = Some(e.clone()));
        notifier.advise(Advisory::NoLabel);
        assert_eq!(
            *seen.borrow(),
            Some(EditorEvent::Advisory(Advisory::NoLabel))
        );
    }
}
