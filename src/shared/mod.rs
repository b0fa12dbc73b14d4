/// 共有インフラモジュール
///
/// 機能横断で使用されるエラー型、データベース接続、設定、
/// 外部ゲートウェイ契約、ユーティリティを提供します。
pub mod config;
pub mod database;
pub mod errors;
pub mod gateway;
pub mod utils;
