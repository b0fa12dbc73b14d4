use super::models::{RequestWithdrawalDto, SendTipDto, Tip, WithdrawalRequest};
use crate::AppState;
use tauri::State;

/// チップを送信する
///
/// # 引数
/// * `dto` - チップ送信用DTO
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 作成されたチップ、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn send_tip(dto: SendTipDto, state: State<'_, AppState>) -> Result<Tip, String> {
    state
        .ledger
        .send_tip(dto)
        .await
        .map_err(|e| e.user_message())
}

/// ワーカーのチップ履歴を取得する
///
/// # 引数
/// * `worker_id` - ワーカーのID
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// チップのリスト（新しい順）、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn fetch_tips(
    worker_id: String,
    state: State<'_, AppState>,
) -> Result<Vec<Tip>, String> {
    state
        .ledger
        .fetch_tips(&worker_id)
        .await
        .map_err(|e| e.user_message())
}

/// 出金をリクエストする
///
/// # 引数
/// * `dto` - 出金リクエスト作成用DTO
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 作成された出金リクエスト、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn request_withdrawal(
    dto: RequestWithdrawalDto,
    state: State<'_, AppState>,
) -> Result<WithdrawalRequest, String> {
    state
        .ledger
        .request_withdrawal(dto)
        .await
        .map_err(|e| e.user_message())
}

/// ワーカーの出金リクエスト履歴を取得する
///
/// # 引数
/// * `worker_id` - ワーカーのID
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 出金リクエストのリスト（新しい順）、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn fetch_withdrawals(
    worker_id: String,
    state: State<'_, AppState>,
) -> Result<Vec<WithdrawalRequest>, String> {
    state
        .ledger
        .fetch_withdrawals(&worker_id)
        .await
        .map_err(|e| e.user_message())
}

/// ワーカーの利用可能残高を取得する
///
/// # 引数
/// * `worker_id` - ワーカーのID
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 利用可能残高、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn get_available_balance(
    worker_id: String,
    state: State<'_, AppState>,
) -> Result<f64, String> {
    state
        .ledger
        .available_balance(&worker_id)
        .map_err(|e| e.user_message())
}
