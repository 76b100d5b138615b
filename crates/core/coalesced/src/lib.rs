#[macro_use]
extern crate log;

mod config;
mod error;
mod key;
mod service;

pub use config::CoalescionServiceConfig;
pub use error::Error;
pub use key::OperationKey;
pub use service::CoalescionService;
