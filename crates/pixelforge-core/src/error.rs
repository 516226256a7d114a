use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(
        "unsupported buffer shape: {width}x{height} with {channels} channel(s) and {len} samples"
    )]
    UnsupportedBufferShape {
        width: u32,
        height: u32,
        channels: u8,
        len: usize,
    },

    #[error("unknown filter name: {0:?}")]
    UnknownFilterName(String),

    #[error("unknown cartoon style: {0:?}")]
    UnknownCartoonStyle(String),

    #[error("filter not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("history is empty")]
    EmptyHistory,

    #[error("{name} = {value} is outside [{min}, {max}]")]
    ParameterOutOfRange {
        name: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
