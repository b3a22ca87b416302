pub mod record;
pub mod normalize;
pub mod bulk;
pub mod transport;
pub mod handler;
pub mod layer;
pub mod config;
pub mod env;
pub mod error;

#[cfg(feature = "elastic")]
pub mod elastic;

pub mod init;
pub mod noop;
