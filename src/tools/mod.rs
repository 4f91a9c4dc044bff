//! Stateless utilities. Nothing here touches the data directory.

pub mod password;
pub mod rename;
pub mod scaffold;
