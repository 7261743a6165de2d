//! Fixed-capacity inline storage for one member of a closed variant set.
//!
//! A slot is declared by its variant set: an enum listing every concrete
//! type the slot may hold, plus the interface all of them implement and a
//! byte capacity. Storage is inline in the owner, so a pipeline built from
//! slots never touches the heap. Dropping the slot drops the live variant.

use std::mem::size_of;

/// A closed set of variants sharing one interface.
pub trait VariantSet: Sized {
    /// Trait object every member is viewed through.
    type Interface: ?Sized;

    /// Largest member size, in bytes, the slot accepts.
    const CAPACITY: usize;

    fn interface(&self) -> &Self::Interface;
}

/// A concrete member of the variant set `V`.
pub trait Variant<V>: Into<V> {
    /// The member stored in `set`, if it is this type.
    fn peek(set: &V) -> Option<&Self>;
}

/// Optional access to a secondary interface `To` of a variant set.
pub trait Probe<To: ?Sized> {
    fn probe(&self) -> Option<&To>;
}

/// Panics unless `T` fits a slot of `capacity` bytes.
#[inline]
pub(crate) fn assert_fits<T>(capacity: usize) {
    let size = size_of::<T>();
    assert!(
        size <= capacity,
        "Size Variant: {}, Space: {}",
        size,
        capacity
    );
}

/// Declare a variant-set enum over types without lifetime parameters.
///
/// ```ignore
/// variant_set! {
///     pub enum MatrixVariant: dyn MatrixStrategy, capacity = 56;
///     Translate(TranslateMatrix),
///     Scale(ScaleMatrix),
/// }
/// ```
macro_rules! variant_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $iface:ty, capacity = $cap:expr;
        $($variant:ident($ty:ty)),+ $(,)?
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($variant($ty)),+
        }

        impl $crate::poly_memory::VariantSet for $name {
            type Interface = $iface;
            const CAPACITY: usize = $cap;

            fn interface(&self) -> &Self::Interface {
                match self {
                    $($name::$variant(v) => v),+
                }
            }
        }

        $(
            impl From<$ty> for $name {
                fn from(v: $ty) -> Self {
                    $name::$variant(v)
                }
            }

            impl $crate::poly_memory::Variant<$name> for $ty {
                fn peek(set: &$name) -> Option<&Self> {
                    match set {
                        $name::$variant(v) => Some(v),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )+
    };
}

pub(crate) use variant_set;

// ============================================================================
// PolyMemory
// ============================================================================

/// Storage for at most one member of `V`, with no successor.
pub struct PolyMemory<V> {
    space: Option<V>,
}

impl<V: VariantSet> PolyMemory<V> {
    pub const fn new() -> Self {
        Self { space: None }
    }

    /// Store `variant`, dropping any previous one.
    ///
    /// Panics if `T` is larger than the slot's capacity.
    pub fn init<T: Into<V>>(&mut self, variant: T) {
        assert_fits::<T>(V::CAPACITY);
        self.space = Some(variant.into());
    }

    pub fn is_initialized(&self) -> bool {
        self.space.is_some()
    }

    /// Panics if the slot is empty.
    pub fn get(&self) -> &V::Interface {
        match &self.space {
            Some(v) => v.interface(),
            None => panic!("PolyMemory accessed before init"),
        }
    }

    pub fn try_get(&self) -> Option<&V::Interface> {
        self.space.as_ref().map(V::interface)
    }
}

impl<V: VariantSet> Default for PolyMemory<V> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    trait Named {
        fn name(&self) -> &'static str;
    }

    #[derive(Clone)]
    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    impl Named for Tracked {
        fn name(&self) -> &'static str {
            "tracked"
        }
    }

    #[derive(Clone)]
    struct Small(u32);

    impl Named for Small {
        fn name(&self) -> &'static str {
            "small"
        }
    }

    #[allow(dead_code)]
    struct Huge([u8; 256]);

    impl Named for Huge {
        fn name(&self) -> &'static str {
            "huge"
        }
    }

    variant_set! {
        enum TestVariant: dyn Named, capacity = 64;
        Tracked(Tracked),
        Small(Small),
        Huge(Huge),
    }

    #[test]
    fn test_init_and_get() {
        let mut slot = PolyMemory::<TestVariant>::new();
        assert!(!slot.is_initialized());
        assert!(slot.try_get().is_none());
        slot.init(Small(7));
        assert!(slot.is_initialized());
        assert_eq!(slot.get().name(), "small");
    }

    #[test]
    fn test_drop_runs_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut slot = PolyMemory::<TestVariant>::new();
            slot.init(Tracked(drops.clone()));
            assert_eq!(drops.get(), 0);
        }
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_reinit_drops_previous() {
        let drops = Rc::new(Cell::new(0));
        let mut slot = PolyMemory::<TestVariant>::new();
        slot.init(Tracked(drops.clone()));
        slot.init(Small(1));
        assert_eq!(drops.get(), 1);
        drop(slot);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_empty_slot_drops_nothing() {
        let slot = PolyMemory::<TestVariant>::default();
        drop(slot);
    }

    #[test]
    #[should_panic(expected = "Size Variant: 256, Space: 64")]
    fn test_oversized_variant_panics() {
        let mut slot = PolyMemory::<TestVariant>::new();
        slot.init(Huge([0; 256]));
    }

    #[test]
    #[should_panic(expected = "before init")]
    fn test_get_before_init_panics() {
        let slot = PolyMemory::<TestVariant>::new();
        let _ = slot.get().name();
    }

    #[test]
    fn test_peek() {
        let set: TestVariant = Small(3).into();
        assert_eq!(Small::peek(&set).map(|s| s.0), Some(3));
        assert!(Tracked::peek(&set).is_none());
    }
}
