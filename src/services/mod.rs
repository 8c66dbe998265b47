pub mod catalog;
pub mod lark;
pub mod storage;
pub mod version;
pub mod webhook;
