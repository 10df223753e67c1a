//! Operator command implementations

pub mod deploy;
pub mod proxy;
pub mod replace;
