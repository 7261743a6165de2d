//! A chained slot: one variant plus the designator of its successor.
//!
//! Stages never point at each other. A stage records *which* stage follows
//! it; the pipeline resolves that designator when it drives a span. Cloning
//! a stage rebuilds the same variant with the same parameters and a new
//! successor, which is all a respecialized pipeline needs.

use crate::poly_memory::{assert_fits, Probe, Variant, VariantSet};

/// Rebuilds the stored variant. Captured when the stage is initialized.
type Cloner<V> = fn(&V) -> Option<V>;

fn rebuild<V, T>(set: &V) -> Option<V>
where
    T: Variant<V> + Clone,
{
    T::peek(set).cloned().map(Into::into)
}

/// Chained storage for one member of `V`, linked to a successor `L`.
pub struct Stage<V, L> {
    space: Option<V>,
    next: Option<L>,
    cloner: Option<Cloner<V>>,
}

impl<V: VariantSet, L: Copy> Stage<V, L> {
    pub const fn new() -> Self {
        Self {
            space: None,
            next: None,
            cloner: None,
        }
    }

    /// Store a chained variant that forwards to `next`.
    ///
    /// Panics if `T` is larger than the slot's capacity.
    pub fn init_stage<T>(&mut self, next: L, variant: T)
    where
        T: Variant<V> + Clone,
    {
        assert_fits::<T>(V::CAPACITY);
        self.space = Some(variant.into());
        self.next = Some(next);
        self.cloner = Some(rebuild::<V, T>);
    }

    /// Store a terminal variant. Terminal variants cannot be cloned.
    ///
    /// Panics if `T` is larger than the slot's capacity.
    pub fn init_sink<T: Into<V>>(&mut self, variant: T) {
        assert_fits::<T>(V::CAPACITY);
        self.space = Some(variant.into());
        self.next = None;
        self.cloner = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.space.is_some()
    }

    /// Successor designator; `None` for sinks and empty stages.
    pub fn next(&self) -> Option<L> {
        self.next
    }

    /// Panics if the stage is empty.
    pub fn get(&self) -> &V::Interface {
        match &self.space {
            Some(v) => v.interface(),
            None => panic!("Stage accessed before init"),
        }
    }

    pub fn try_get(&self) -> Option<&V::Interface> {
        self.space.as_ref().map(V::interface)
    }

    /// The live variant itself.
    pub fn variant(&self) -> Option<&V> {
        self.space.as_ref()
    }

    /// The live variant viewed through a secondary interface, if it has one.
    pub fn get_interface<To: ?Sized>(&self) -> Option<&To>
    where
        V: Probe<To>,
    {
        self.space.as_ref().and_then(|v| v.probe())
    }

    /// Rebuild this stage's variant into `clone_to`, forwarding to `next`.
    ///
    /// Returns `None`, leaving `clone_to` untouched, when this stage is
    /// empty or holds a sink.
    pub fn clone_stage_to<'s>(&self, next: L, clone_to: &'s mut Self) -> Option<&'s V::Interface> {
        let cloner = self.cloner?;
        let variant = cloner(self.space.as_ref()?)?;
        clone_to.space = Some(variant);
        clone_to.next = Some(next);
        clone_to.cloner = Some(cloner);
        clone_to.try_get()
    }
}

impl<V: VariantSet, L: Copy> Default for Stage<V, L> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
