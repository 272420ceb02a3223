use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
}
