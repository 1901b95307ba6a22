//! Core container implementation for Wirebox.

pub mod argument;
pub mod config;
pub mod container;
pub mod definition;
pub mod error;
pub mod inflector;
pub mod provider;
pub mod reflection;
pub mod reflection_container;
pub mod registry;
pub mod value;

pub use container::prelude;
pub use container::{Container, ContainerBuilder, WeakContainer};
pub use error::{ContainerError, Result};
pub use value::Value;
