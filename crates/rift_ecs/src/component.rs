//! Core [`Component`] trait and kind identifiers.
//!
//! Every attribute bundle stored in the [`World`](crate::World) implements
//! [`Component`]. A component kind is identified by the FNV-1a 64-bit hash of
//! its string name, which is deterministic across builds and processes.
//!
//! Zero-payload unit structs work as tag components — they mark entity state
//! without carrying data.

/// A unique identifier for a component kind, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(pub u64);

impl ComponentKind {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentKind`] from a component's string name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentKind`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::kind_name())
    }
}

/// The core component trait.
///
/// A component is a typed, immutable-per-write attribute bundle. At most one
/// value of a kind may be attached to an entity; inserting a new value of the
/// same kind replaces the previous one. `Clone` is required so the world can
/// record previous values for change queries.
///
/// # Examples
///
/// ```rust
/// use rift_ecs::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn kind_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Send + Sync + Clone + 'static {
    /// A human-readable name for this component kind.
    fn kind_name() -> &'static str;

    /// Returns the [`ComponentKind`] for this component.
    fn kind() -> ComponentKind {
        ComponentKind::from_name(Self::kind_name())
    }
}
