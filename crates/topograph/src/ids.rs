//! Strongly-typed indices into the topology arenas.
//!
//! Every element is stored in a flat `Vec` and addressed by its index
//! wrapper.  Ids are allocated densely from `0` in registration order, so the
//! same input always produces the same ids.

use std::fmt;

macro_rules! idx {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of this element in its arena.
            #[inline]
            pub fn index(self) -> usize { self.0 as usize }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(
    /// A deduplicated, snapped coordinate.
    PointId
);
idx!(
    /// A canonical undirected edge between two distinct points.
    SegmentId
);
idx!(
    /// A maximal chain of segments between two junction points.
    LineId
);
idx!(
    /// A closed cycle of lines found by one `Rings` run.
    RingId
);

/// Convert an arena length into the next id value.
#[inline]
pub(crate) fn next_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("topology arena overflow: {len} elements"))
}
