/// データベース接続管理モジュール
pub mod connection;

pub use connection::{create_tables, get_database_path, initialize_database};
