use crate::engine::EngineError;
use crate::svg::SvgError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Svg(#[from] SvgError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("invalid graph input: {message}")]
    Input { message: String },
}
