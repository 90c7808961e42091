//! Interface layer
//! 외부 호출(CLI/라이브러리)을 유스케이스로 연결한다.

pub mod cli;
pub mod composition;
pub mod dispatch;
