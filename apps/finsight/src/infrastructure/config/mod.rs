//! Composition root.

mod container;

pub use container::{Container, ContainerError, ProductionContainer};
