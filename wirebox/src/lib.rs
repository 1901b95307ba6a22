//! # Wirebox: a string-keyed dependency injection container
//!
//! Services are registered under aliases as literals, class names or
//! factories, grouped with tags, populated lazily by service providers,
//! post-processed by inflectors and, when nothing else knows an alias,
//! looked up in delegate containers such as the auto-wiring
//! [`ReflectionContainer`](wirebox_container::reflection_container::ReflectionContainer).

pub use wirebox_container::*;
pub use wirebox_support::*;
