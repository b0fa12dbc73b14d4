use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// データベース関連のエラー
    #[error("データベースエラー: {0}")]
    Database(String),

    /// バリデーション関連のエラー
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 残高不足エラー（出金リクエスト時）
    #[error("残高不足: 要求額 {requested} に対して利用可能残高 {available}")]
    InsufficientFunds { requested: f64, available: f64 },

    /// リソースが見つからない場合のエラー
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 外部ゲートウェイ（決済・課金・バックエンド）でのエラー
    #[error("ゲートウェイエラー: {0}")]
    Gateway(String),

    /// 並行処理関連のエラー
    #[error("並行処理エラー: {0}")]
    Concurrency(String),

    /// 設定関連のエラー
    #[error("設定エラー: {0}")]
    Configuration(String),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー入力エラーなど）
    Low,
    /// 中重要度（外部サービス一時的エラーなど）
    Medium,
    /// 高重要度（データベースエラーなど）
    High,
    /// 最重要（データ整合性に関わるエラーなど）
    Critical,
}

impl AppError {
    /// ユーザーに表示するためのフレンドリーなメッセージを取得
    ///
    /// # 戻り値
    /// ユーザーに表示可能なエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "データベース操作でエラーが発生しました".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::InsufficientFunds { .. } => "残高が不足しています".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Gateway(_) => "外部サービスとの通信でエラーが発生しました".to_string(),
            AppError::Concurrency(_) => "並行処理でエラーが発生しました".to_string(),
            AppError::Configuration(_) => "設定エラーが発生しました".to_string(),
        }
    }

    /// エラーの詳細情報を取得
    ///
    /// # 戻り値
    /// エラーの詳細情報（ログ出力用）
    pub fn details(&self) -> String {
        format!("{self}")
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Database(_) => ErrorSeverity::High,
            AppError::Validation(_) => ErrorSeverity::Low,
            AppError::InsufficientFunds { .. } => ErrorSeverity::Low,
            AppError::NotFound(_) => ErrorSeverity::Low,
            AppError::Gateway(_) => ErrorSeverity::Medium,
            AppError::Concurrency(_) => ErrorSeverity::High,
            AppError::Configuration(_) => ErrorSeverity::High,
        }
    }

    /// バリデーションエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - バリデーションエラーメッセージ
    ///
    /// # 戻り値
    /// バリデーションエラー
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// 残高不足エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `requested` - 要求された出金額
    /// * `available` - 現在の利用可能残高
    ///
    /// # 戻り値
    /// 残高不足エラー
    pub fn insufficient_funds(requested: f64, available: f64) -> Self {
        AppError::InsufficientFunds {
            requested,
            available,
        }
    }

    /// リソース未発見エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `resource` - 見つからなかったリソース名
    ///
    /// # 戻り値
    /// リソース未発見エラー
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        AppError::NotFound(format!("{}が見つかりません", resource.into()))
    }

    /// ゲートウェイエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `gateway` - ゲートウェイ名
    /// * `message` - エラーメッセージ
    ///
    /// # 戻り値
    /// ゲートウェイエラー
    pub fn gateway<S: Into<String>>(gateway: S, message: S) -> Self {
        AppError::Gateway(format!("{}: {}", gateway.into(), message.into()))
    }

    /// 並行処理エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 並行処理エラーメッセージ
    ///
    /// # 戻り値
    /// 並行処理エラー
    pub fn concurrency<S: Into<String>>(message: S) -> Self {
        AppError::Concurrency(message.into())
    }

    /// 設定エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 設定エラーメッセージ
    ///
    /// # 戻り値
    /// 設定エラー
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }
}

/// AppErrorからStringへの変換（Tauriコマンドでの使用のため）
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.user_message()
    }
}

/// rusqlite::ErrorからAppErrorへの変換
impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        AppError::Database(error.to_string())
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        // 各エラータイプの重要度をテスト
        assert_eq!(
            AppError::validation("テスト").severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::insufficient_funds(10.0, 5.0).severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::not_found("チップ").severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::gateway("PaymentGateway", "接続失敗").severity(),
            ErrorSeverity::Medium
        );
        assert_eq!(
            AppError::concurrency("ロック取得失敗").severity(),
            ErrorSeverity::High
        );
        assert_eq!(
            AppError::configuration("設定ファイル不正").severity(),
            ErrorSeverity::High
        );
    }

    #[test]
    fn test_user_message() {
        // ユーザーメッセージのテスト
        let validation_error = AppError::validation("金額が不正です");
        assert_eq!(validation_error.user_message(), "金額が不正です");

        let not_found_error = AppError::not_found("出金リクエスト");
        assert_eq!(
            not_found_error.user_message(),
            "出金リクエストが見つかりません"
        );

        let funds_error = AppError::insufficient_funds(9.01, 9.0);
        assert_eq!(funds_error.user_message(), "残高が不足しています");
    }

    #[test]
    fn test_insufficient_funds_details() {
        // 残高不足エラーの詳細に要求額と残高が含まれることを確認
        let error = AppError::insufficient_funds(15.0, 9.0);
        let details = error.details();
        assert!(details.contains("15"));
        assert!(details.contains("9"));
    }

    #[test]
    fn test_helper_functions() {
        // ヘルパー関数のテスト
        let validation_error = AppError::validation("テストメッセージ");
        assert!(matches!(validation_error, AppError::Validation(_)));

        let funds_error = AppError::insufficient_funds(2.0, 1.0);
        assert!(matches!(funds_error, AppError::InsufficientFunds { .. }));

        let gateway_error = AppError::gateway("BillingGateway", "テストエラー");
        assert!(matches!(gateway_error, AppError::Gateway(_)));
    }

    #[test]
    fn test_string_conversion() {
        // String変換のテスト
        let error = AppError::validation("テストエラー");
        let error_string: String = error.into();
        assert_eq!(error_string, "テストエラー");
    }
}
