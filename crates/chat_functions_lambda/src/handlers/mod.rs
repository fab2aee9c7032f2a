pub mod dispatch;
pub mod sweep;
