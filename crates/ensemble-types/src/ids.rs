//! Type-safe identifier wrappers around [`Uuid`].
//!
//! The storage service assigns every experiment and ensemble a UUID. The
//! client only carries them from one response into the next request path,
//! so the wrappers exist to keep an experiment id from being passed where
//! an ensemble id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID newtype that serializes as the bare UUID string and
/// round-trips through its `Display` form.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh time-ordered (v7) identifier. The service assigns real
            /// ids; this is for stand-ins and tests.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The wrapped UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id! {
    /// Server-assigned identifier of an experiment.
    ExperimentId
}

define_id! {
    /// Server-assigned identifier of an ensemble.
    EnsembleId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_uuid_strings() {
        let id = ExperimentId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn ids_parse_from_display_form() {
        let id = EnsembleId::new();
        let parsed: Result<EnsembleId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }

    #[test]
    fn garbage_is_not_an_id() {
        assert!("not-a-uuid".parse::<ExperimentId>().is_err());
    }
}
