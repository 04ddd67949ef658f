pub mod bootstrap;
pub mod common;
pub mod manager;
pub mod output;

#[cfg(test)]
pub(crate) mod tests;

pub type Error = crate::common::error::NodeBootError;
pub type Result<T> = std::result::Result<T, Error>;

/// Name of the node that is registered in the scheduler by default.
pub const DEFAULT_NODE_NAME: &str = "pbs";
/// Queue that the registered node is assigned to by default.
pub const DEFAULT_QUEUE_NAME: &str = "workq";

pub const NODEBOOT_VERSION: &str = {
    match option_env!("NODEBOOT_BUILD_VERSION") {
        Some(version) => version,
        None => const_format::concatcp!(env!("CARGO_PKG_VERSION"), "-dev"),
    }
};
