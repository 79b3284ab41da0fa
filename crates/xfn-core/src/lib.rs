pub mod condition;
pub mod error;
pub mod protocol;
pub mod resource;

pub use condition::{Condition, Severity};
pub use error::{ErrorCategory, FunctionError, Result};
pub use protocol::{CompositeRequest, CompositeResponse, FunctionMeta, Outcome};
pub use resource::{DesiredResource, ResourceKey};
