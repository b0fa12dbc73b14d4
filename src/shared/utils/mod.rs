/// 共有ユーティリティモジュール
pub mod nanoid;

pub use nanoid::{generate_entity_id, is_valid_entity_id};
