pub mod dispatch;
pub mod export;
