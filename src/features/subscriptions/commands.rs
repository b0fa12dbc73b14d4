use super::models::SubscriptionState;
use crate::AppState;
use tauri::State;

/// 無料トライアルを開始する
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 更新後のサブスクリプション状態、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn start_trial(state: State<'_, AppState>) -> Result<SubscriptionState, String> {
    state
        .subscriptions
        .start_trial()
        .await
        .map_err(|e| e.user_message())
}

/// サブスクリプションを購入する
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 更新後のサブスクリプション状態、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn subscribe(state: State<'_, AppState>) -> Result<SubscriptionState, String> {
    state
        .subscriptions
        .subscribe()
        .await
        .map_err(|e| e.user_message())
}

/// サブスクリプションを解約する
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 更新後のサブスクリプション状態、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn cancel_subscription(
    state: State<'_, AppState>,
) -> Result<SubscriptionState, String> {
    state
        .subscriptions
        .cancel_subscription()
        .await
        .map_err(|e| e.user_message())
}

/// 過去の購入を復元する
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 更新後のサブスクリプション状態、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn restore_subscription(
    state: State<'_, AppState>,
) -> Result<SubscriptionState, String> {
    state
        .subscriptions
        .restore_subscription()
        .await
        .map_err(|e| e.user_message())
}

/// サブスクリプションの期限を確認する
///
/// アプリのフォアグラウンド復帰・セッション開始のたびに呼び出すこと。
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// （期限切れを反映した）現在の状態、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn check_subscription_status(
    state: State<'_, AppState>,
) -> Result<SubscriptionState, String> {
    state
        .subscriptions
        .check_subscription_status()
        .map_err(|e| e.user_message())
}
