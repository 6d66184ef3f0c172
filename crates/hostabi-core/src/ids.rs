//! Arena identifiers.
//!
//! Type nodes, struct layouts and function descriptors live in arenas owned by
//! the build context. These ids are the handles the rest of the schema uses to
//! refer to them, so composite types can share constituents without
//! reference counting.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create an id from an arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Get the underlying index.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self::new(index)
            }
        }
    };
}

arena_id!(
    /// Identifies a type node in the build context's type arena.
    TypeId,
    "type"
);

arena_id!(
    /// Identifies a finalized struct layout in the build context's struct arena.
    StructId,
    "struct"
);

arena_id!(
    /// Identifies a registered function descriptor.
    FunctionId,
    "fn"
);
