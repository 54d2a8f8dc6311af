//! 数据传输对象

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
