use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn from_str(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(AlertKey);
id_newtype!(ResourceId);

impl ResourceId {
    /// Fresh opaque id, for adapters that mint their own identifiers.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}
