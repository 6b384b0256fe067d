//! Prelude module - commonly used types for convenient import.
//!
//! Use `use dispatch_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Project identity
pub use crate::{GLOBAL_PROJECT_ID, PROJECT_ROOT_ENV, Project, ProjectId};

// Data directories
pub use crate::{DataDirKind, DataRoot};

// Configuration
pub use crate::{ForceMode, RouterConfig, Settings, is_router_enabled};

// Hashing
pub use crate::{hex16, request_hash};

// Hooks
pub use crate::HookKind;

// Locking
pub use crate::FileLock;
