use super::models::{SubscriptionState, SubscriptionStatus};
use crate::shared::errors::AppResult;
use rusqlite::{params, Connection, OptionalExtension};

/// サブスクリプション状態を読み込む
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 保存された状態、未保存の場合はデフォルト状態（`none`）
pub fn load_state(conn: &Connection) -> AppResult<SubscriptionState> {
    let state = conn
        .query_row(
            "SELECT status, start_date, end_date, trial_end_date
             FROM subscription_state WHERE id = 1",
            [],
            |row| {
                Ok(SubscriptionState {
                    status: row.get::<_, SubscriptionStatus>(0)?,
                    start_date: row.get(1)?,
                    end_date: row.get(2)?,
                    trial_end_date: row.get(3)?,
                })
            },
        )
        .optional()?;

    Ok(state.unwrap_or_default())
}

/// サブスクリプション状態を保存する
///
/// # 引数
/// * `conn` - データベース接続
/// * `state` - 保存する状態
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn save_state(conn: &Connection, state: &SubscriptionState) -> AppResult<()> {
    conn.execute(
        "INSERT INTO subscription_state (id, status, start_date, end_date, trial_end_date)
         VALUES (1, ?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             status = excluded.status,
             start_date = excluded.start_date,
             end_date = excluded.end_date,
             trial_end_date = excluded.trial_end_date",
        params![
            state.status,
            state.start_date,
            state.end_date,
            state.trial_end_date
        ],
    )?;

    Ok(())
}
