//! IO modules - side effects (network, filesystem)

pub mod download;
pub mod extract;
pub mod retry;
pub mod verify;
