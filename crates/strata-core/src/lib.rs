pub mod config;
pub mod logging;

pub mod emulator;
pub mod entity;
pub mod retry;
pub mod storage;
