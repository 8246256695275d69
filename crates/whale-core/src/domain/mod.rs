//! 13F 공시 데이터의 도메인 모델.

mod entity;
mod filing;
mod holding;
mod manager;

pub use entity::*;
pub use filing::*;
pub use holding::*;
pub use manager::*;
