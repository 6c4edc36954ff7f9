pub mod command;
pub mod dequantize;
pub mod dump;
pub mod pack;
pub mod progress;
pub mod unpack;
