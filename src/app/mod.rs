pub mod capture;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod models;
pub mod storage;
pub mod task_input;
pub mod task_list;
pub mod ui;
