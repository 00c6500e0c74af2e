pub mod clipboard;
pub mod entry;
pub mod listing;
pub mod operations;
pub mod search;
pub mod selection;
pub mod sort;
pub mod storage;
pub mod transfer;
pub mod watcher;
