#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

use crate::stream::Mode;

#[derive(thiserror::Error, Debug)]
pub enum BitstreamError {
    #[error("{operation} is not allowed on a stream opened in {mode} mode")]
    WrongMode { operation: &'static str, mode: Mode },

    #[error("Invalid bit symbol {0:?}, expected '0' or '1'")]
    InvalidSymbol(char),

    #[error("Cannot transfer more than 64 bits at once. Requested {0}")]
    TooManyBits(u32),

    #[error("Padding must be between 0 and 7 bits. Got {0}")]
    InvalidPadding(u8),

    #[error("Insufficient data: requested {requested} bits, only {available} remained")]
    InsufficientData { requested: u32, available: u32 },

    #[error("Padding bits of the last byte should be all zeros. Read {bits:#04b} over {padding} bits")]
    PaddingNotZero { padding: u8, bits: u8 },

    #[error("Stream is unusable after a previous channel failure")]
    Poisoned,

    #[error("Channel I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum QuantError {
    #[error("Quality factor must be between 1 and 100. Got {0}")]
    InvalidQuality(u32),

    #[error("Expected 64 coefficients, found {0}")]
    CoefficientCount(usize),

    #[error("Invalid coefficient {0:?}")]
    InvalidCoefficient(String),
}
