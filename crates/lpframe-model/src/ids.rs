macro_rules! define_id_type {
    ($name:ident, $prefix:literal) => {
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Get the inner u32 value.
            pub fn inner(self) -> u32 {
                self.0
            }

            /// Create an ID from a u32 value.
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }

            /// The id for the entry stored at position `len`.
            pub(crate) fn for_position(len: usize) -> Result<Self, $crate::error::ModelError> {
                u32::try_from(len)
                    .map(Self)
                    .map_err(|_| $crate::error::ModelError::CapacityExceeded($prefix))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

define_id_type!(VariableId, "var");
define_id_type!(ConstraintId, "row");
