//! Typed ID wrappers for the identifiers that cross every component boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up step IDs, workflow IDs, etc. at call
/// sites. They're strings underneath — no format is enforced.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(WorkflowId, "Unique identifier for a workflow definition.");
typed_id!(ExecutionId, "Unique identifier minted by the orchestrator for one workflow execution.");
typed_id!(StepId, "Stable identifier for a step within a workflow.");
typed_id!(AgentId, "Unique identifier for the agent executing the workflow.");
typed_id!(UserId, "Unique identifier for the end user on whose behalf the workflow runs.");
