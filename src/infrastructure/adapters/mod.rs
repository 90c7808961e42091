//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod config_repository;
mod fs_backup_store;
mod fs_document_store;
mod model_catalog;
mod system_clock;

pub use config_repository::JsonConfigRepository;
pub use fs_backup_store::FsBackupStore;
pub use fs_document_store::FsDocumentStore;
pub use model_catalog::HttpModelCatalog;
pub use system_clock::SystemClock;
