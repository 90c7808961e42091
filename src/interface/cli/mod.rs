//! CLI 인터페이스 모듈 묶음.
//! 입력 파싱과 실행 디스패치를 한 네임스페이스로 관리한다.

pub mod command;

pub use command::{Cli, CliAction};
