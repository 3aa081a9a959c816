//! Newtype entity identifiers.
//!
//! Every entity in the domain model (school, class, trainer, workshop, meeting) is
//! identified by a small `Copy` newtype over `i64` rather than a raw integer, so that
//! passing a `ClassId` where a `TrainerId` is expected is a compile error.

/// Defines a `Copy + Eq + Ord + Hash` newtype identifier backed by `$inner`.
macro_rules! define_id_type {
    ($inner:ty, $name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub $inner);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(v: $inner) -> Self {
                $name(v)
            }
        }

        impl From<$name> for $inner {
            fn from(v: $name) -> Self {
                v.0
            }
        }
    };
}

define_id_type!(i64, SchoolId);
define_id_type!(i64, ClassId);
define_id_type!(i64, TrainerId);
define_id_type!(i64, WorkshopId);

/// Identifies a single meeting instance: the k-th occurrence of an enrollment.
///
/// Not free-standing input data — assigned by the variable builder once enrollments
/// are expanded into their `required_meeting_count` instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeetingId {
    pub class_id: ClassId,
    pub workshop_id: WorkshopId,
    pub ordinal: u32,
}

impl std::fmt::Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.class_id, self.workshop_id, self.ordinal)
    }
}
