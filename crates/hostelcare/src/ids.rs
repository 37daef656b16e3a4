//! Numeric identifiers handed out by the store.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Account identifier shared by every role.
    UserId
);
entity_id!(HostelId);
entity_id!(RoomId);
entity_id!(ComplaintTypeId);
entity_id!(
    /// Complaint identifier; also the key for per-complaint write locks.
    ComplaintId
);
