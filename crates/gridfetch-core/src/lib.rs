pub mod config;
pub mod logging;

pub mod control;
pub mod downloader;
pub mod executor;
pub mod grid;
pub mod planner;
pub mod product;
pub mod resolver;
pub mod resume;
pub mod retry;
pub mod storage;
