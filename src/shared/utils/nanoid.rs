use nanoid::nanoid;

/// チップ・出金リクエスト用のエンティティIDを生成する
///
/// # 戻り値
/// 21文字のURL-safeなnanoId
///
/// # 特性
/// - 文字セット: A-Za-z0-9_- (64文字)
/// - 長さ: 21文字
/// - 衝突確率: 1兆個のIDで1%未満
///
/// オフラインファースト作成のためクライアント側で採番し、
/// 将来のサーバー同期時にサーバーIDへ置き換えられる前提
pub fn generate_entity_id() -> String {
    nanoid!()
}

/// エンティティIDが有効な形式かどうかを検証する
///
/// # 引数
/// * `id` - 検証するID文字列
///
/// # 戻り値
/// 有効な場合はtrue、無効な場合はfalse
///
/// # 検証条件
/// - 長さが21文字
/// - URL-safe文字（A-Za-z0-9_-）のみを含む
pub fn is_valid_entity_id(id: &str) -> bool {
    id.len() == 21
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_entity_id_length() {
        let id = generate_entity_id();
        assert_eq!(id.len(), 21);
    }

    #[test]
    fn test_generate_entity_id_uniqueness() {
        let id1 = generate_entity_id();
        let id2 = generate_entity_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_entity_id_url_safe() {
        let id = generate_entity_id();
        // URL-safeな文字のみを含むことを確認
        assert!(id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn test_is_valid_entity_id() {
        // 有効なID
        let valid_id = generate_entity_id();
        assert!(is_valid_entity_id(&valid_id));

        // 有効なID（数字のみでも21文字ならOK）
        assert!(is_valid_entity_id("123456789012345678901"));

        // 無効なID（長さが異なる）
        assert!(!is_valid_entity_id("short"));
        assert!(!is_valid_entity_id(
            "this_is_way_too_long_to_be_a_valid_id"
        ));

        // 無効なID（無効な文字を含む）
        assert!(!is_valid_entity_id("invalid@characters!!!"));
        assert!(!is_valid_entity_id("123456789012345678@01")); // 21文字だが@を含む
    }
}
