use crate::features::ledger::models::{Tip, WithdrawalRequest};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, Connection};

/// チップを保存する
///
/// # 引数
/// * `conn` - データベース接続
/// * `tip` - 保存するチップ
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn insert_tip(conn: &Connection, tip: &Tip) -> AppResult<()> {
    conn.execute(
        "INSERT INTO tips (id, worker_id, client_id, amount, payment_method, status, comment, rating, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            tip.id,
            tip.worker_id,
            tip.client_id,
            tip.amount,
            tip.payment_method,
            tip.status,
            tip.comment,
            tip.rating,
            tip.created_at
        ],
    )?;

    Ok(())
}

/// ワーカーのチップ一覧を取得する（新しい順）
///
/// # 引数
/// * `conn` - データベース接続
/// * `worker_id` - ワーカーのID
///
/// # 戻り値
/// チップのリスト、または失敗時はエラー
pub fn find_tips_by_worker(conn: &Connection, worker_id: &str) -> AppResult<Vec<Tip>> {
    let mut stmt = conn.prepare(
        "SELECT id, worker_id, client_id, amount, payment_method, status, comment, rating, created_at
         FROM tips WHERE worker_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;

    let tips = stmt.query_map([worker_id], |row| {
        Ok(Tip {
            id: row.get(0)?,
            worker_id: row.get(1)?,
            client_id: row.get(2)?,
            amount: row.get(3)?,
            payment_method: row.get(4)?,
            status: row.get(5)?,
            comment: row.get(6)?,
            rating: row.get(7)?,
            created_at: row.get(8)?,
        })
    })?;

    tips.collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// サーバーから取得したチップをローカルキャッシュへマージする
///
/// # 引数
/// * `conn` - データベース接続
/// * `fetched` - サーバーオブレコードから取得したチップ
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
///
/// # マージ規則
/// - 未知のIDは挿入する
/// - 既知のIDはローカルの状態が `pending` の場合のみ上書きする
///   （終端状態は不変、楽観的に追加済みのローカル行は削除しない）
pub fn merge_tips(conn: &Connection, fetched: &[Tip]) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    for tip in fetched {
        tx.execute(
            "INSERT INTO tips (id, worker_id, client_id, amount, payment_method, status, comment, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                 amount = excluded.amount,
                 payment_method = excluded.payment_method,
                 status = excluded.status,
                 comment = excluded.comment,
                 rating = excluded.rating
             WHERE tips.status = 'pending'",
            params![
                tip.id,
                tip.worker_id,
                tip.client_id,
                tip.amount,
                tip.payment_method,
                tip.status,
                tip.comment,
                tip.rating,
                tip.created_at
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// 出金リクエストを保存する（残高チェックなし）
///
/// マージ処理専用。新規作成は`insert_withdrawal_checked`を使用すること。
///
/// # 引数
/// * `conn` - データベース接続
/// * `withdrawal` - 保存する出金リクエスト
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn insert_withdrawal(conn: &Connection, withdrawal: &WithdrawalRequest) -> AppResult<()> {
    conn.execute(
        "INSERT INTO withdrawal_requests (id, worker_id, amount, destination, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            withdrawal.id,
            withdrawal.worker_id,
            withdrawal.amount,
            withdrawal.destination,
            withdrawal.status,
            withdrawal.created_at
        ],
    )?;

    Ok(())
}

/// 残高チェック付きで出金リクエストを保存する
///
/// # 引数
/// * `conn` - データベース接続
/// * `withdrawal` - 保存する出金リクエスト
///
/// # 戻り値
/// 成功時はOk(())、残高不足時は`InsufficientFunds`エラー
///
/// # 並行性
/// 残高の再計算と挿入を同一トランザクション内で行う。呼び出し側は
/// 接続への排他アクセス（`Mutex<Connection>`のロック保持）を前提とし、
/// これにより同一残高に対する二重出金レースを防ぐ。
pub fn insert_withdrawal_checked(
    conn: &Connection,
    withdrawal: &WithdrawalRequest,
) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    let available = available_balance(&tx, &withdrawal.worker_id)?;
    if withdrawal.amount > available {
        return Err(AppError::insufficient_funds(withdrawal.amount, available));
    }

    tx.execute(
        "INSERT INTO withdrawal_requests (id, worker_id, amount, destination, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            withdrawal.id,
            withdrawal.worker_id,
            withdrawal.amount,
            withdrawal.destination,
            withdrawal.status,
            withdrawal.created_at
        ],
    )?;

    tx.commit()?;
    Ok(())
}

/// ワーカーの出金リクエスト一覧を取得する（新しい順）
///
/// # 引数
/// * `conn` - データベース接続
/// * `worker_id` - ワーカーのID
///
/// # 戻り値
/// 出金リクエストのリスト、または失敗時はエラー
pub fn find_withdrawals_by_worker(
    conn: &Connection,
    worker_id: &str,
) -> AppResult<Vec<WithdrawalRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id, worker_id, amount, destination, status, created_at
         FROM withdrawal_requests WHERE worker_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;

    let withdrawals = stmt.query_map([worker_id], |row| {
        Ok(WithdrawalRequest {
            id: row.get(0)?,
            worker_id: row.get(1)?,
            amount: row.get(2)?,
            destination: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    withdrawals
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// サーバーから取得した出金リクエストをローカルキャッシュへマージする
///
/// マージ規則は`merge_tips`と同じ。
///
/// # 引数
/// * `conn` - データベース接続
/// * `fetched` - サーバーオブレコードから取得した出金リクエスト
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn merge_withdrawals(conn: &Connection, fetched: &[WithdrawalRequest]) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    for withdrawal in fetched {
        tx.execute(
            "INSERT INTO withdrawal_requests (id, worker_id, amount, destination, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 amount = excluded.amount,
                 destination = excluded.destination,
                 status = excluded.status
             WHERE withdrawal_requests.status = 'pending'",
            params![
                withdrawal.id,
                withdrawal.worker_id,
                withdrawal.amount,
                withdrawal.destination,
                withdrawal.status,
                withdrawal.created_at
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// ワーカーの確認済みチップ合計額を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `worker_id` - ワーカーのID
///
/// # 戻り値
/// `completed`状態のチップの合計額
pub fn completed_tip_total(conn: &Connection, worker_id: &str) -> AppResult<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM tips
         WHERE worker_id = ?1 AND status = 'completed'",
        [worker_id],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// ワーカーの失敗していない出金合計額を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `worker_id` - ワーカーのID
///
/// # 戻り値
/// `failed`以外の状態の出金リクエストの合計額
pub fn non_failed_withdrawal_total(conn: &Connection, worker_id: &str) -> AppResult<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM withdrawal_requests
         WHERE worker_id = ?1 AND status != 'failed'",
        [worker_id],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// ワーカーの利用可能残高を計算する（派生値、保存しない）
///
/// # 引数
/// * `conn` - データベース接続
/// * `worker_id` - ワーカーのID
///
/// # 戻り値
/// 確認済みチップ合計 − 失敗していない出金合計（下限0）
pub fn available_balance(conn: &Connection, worker_id: &str) -> AppResult<f64> {
    let tips = completed_tip_total(conn, worker_id)?;
    let withdrawals = non_failed_withdrawal_total(conn, worker_id)?;

    Ok((tips - withdrawals).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ledger::models::{
        PaymentMethod, SettlementStatus, WithdrawalDestination,
    };
    use crate::shared::database::connection::create_tables;
    use quickcheck_macros::quickcheck;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn tip(id: &str, worker_id: &str, amount: f64, status: SettlementStatus) -> Tip {
        Tip {
            id: id.to_string(),
            amount,
            worker_id: worker_id.to_string(),
            client_id: None,
            payment_method: PaymentMethod::Card,
            status,
            comment: None,
            rating: None,
            created_at: "2025-01-01T00:00:00-04:00".to_string(),
        }
    }

    fn withdrawal(
        id: &str,
        worker_id: &str,
        amount: f64,
        status: SettlementStatus,
    ) -> WithdrawalRequest {
        WithdrawalRequest {
            id: id.to_string(),
            worker_id: worker_id.to_string(),
            amount,
            destination: WithdrawalDestination::Wallet,
            status,
            created_at: "2025-01-01T00:00:00-04:00".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find_tips() {
        let conn = test_db();

        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Completed)).unwrap();
        insert_tip(&conn, &tip("t2", "w1", 10.0, SettlementStatus::Completed)).unwrap();
        insert_tip(&conn, &tip("t3", "w2", 3.0, SettlementStatus::Completed)).unwrap();

        let tips = find_tips_by_worker(&conn, "w1").unwrap();
        assert_eq!(tips.len(), 2);
        assert!(tips.iter().all(|t| t.worker_id == "w1"));
    }

    #[test]
    fn test_find_tips_ordering_is_stable() {
        // 介在する変更なしで2回取得した場合、同じ順序の列が返る
        let conn = test_db();
        for i in 0..5 {
            insert_tip(
                &conn,
                &tip(&format!("t{i}"), "w1", 1.0, SettlementStatus::Completed),
            )
            .unwrap();
        }

        let first = find_tips_by_worker(&conn, "w1").unwrap();
        let second = find_tips_by_worker(&conn, "w1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_available_balance_basic() {
        // 確認済みチップ$5+$10、完了済み出金$6 → 残高$9
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Completed)).unwrap();
        insert_tip(&conn, &tip("t2", "w1", 10.0, SettlementStatus::Completed)).unwrap();
        insert_withdrawal(&conn, &withdrawal("wd1", "w1", 6.0, SettlementStatus::Completed))
            .unwrap();

        assert_eq!(available_balance(&conn, "w1").unwrap(), 9.0);
    }

    #[test]
    fn test_available_balance_ignores_pending_and_failed_tips() {
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Completed)).unwrap();
        insert_tip(&conn, &tip("t2", "w1", 100.0, SettlementStatus::Pending)).unwrap();
        insert_tip(&conn, &tip("t3", "w1", 50.0, SettlementStatus::Failed)).unwrap();

        assert_eq!(available_balance(&conn, "w1").unwrap(), 5.0);
    }

    #[test]
    fn test_available_balance_counts_pending_withdrawals() {
        // pendingの出金も残高から差し引く（failedのみ戻る）
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 10.0, SettlementStatus::Completed)).unwrap();
        insert_withdrawal(&conn, &withdrawal("wd1", "w1", 4.0, SettlementStatus::Pending))
            .unwrap();
        insert_withdrawal(&conn, &withdrawal("wd2", "w1", 3.0, SettlementStatus::Failed))
            .unwrap();

        assert_eq!(available_balance(&conn, "w1").unwrap(), 6.0);
    }

    #[test]
    fn test_available_balance_floored_at_zero() {
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Completed)).unwrap();
        insert_withdrawal(&conn, &withdrawal("wd1", "w1", 8.0, SettlementStatus::Completed))
            .unwrap();

        assert_eq!(available_balance(&conn, "w1").unwrap(), 0.0);
    }

    #[test]
    fn test_available_balance_is_per_worker() {
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Completed)).unwrap();
        insert_tip(&conn, &tip("t2", "w2", 20.0, SettlementStatus::Completed)).unwrap();

        assert_eq!(available_balance(&conn, "w1").unwrap(), 5.0);
        assert_eq!(available_balance(&conn, "w2").unwrap(), 20.0);
    }

    #[test]
    fn test_insert_withdrawal_checked_success_and_insufficient() {
        // 残高$15から$6出金 → 残高$9、$9出金 → 残高$0、$0.01出金 → 残高不足
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Completed)).unwrap();
        insert_tip(&conn, &tip("t2", "w1", 10.0, SettlementStatus::Completed)).unwrap();
        insert_withdrawal(&conn, &withdrawal("wd0", "w1", 6.0, SettlementStatus::Completed))
            .unwrap();

        insert_withdrawal_checked(
            &conn,
            &withdrawal("wd1", "w1", 9.0, SettlementStatus::Pending),
        )
        .unwrap();
        assert_eq!(available_balance(&conn, "w1").unwrap(), 0.0);

        let result = insert_withdrawal_checked(
            &conn,
            &withdrawal("wd2", "w1", 0.01, SettlementStatus::Pending),
        );
        assert!(matches!(
            result,
            Err(AppError::InsufficientFunds { .. })
        ));

        // 失敗した出金は記録されない
        let withdrawals = find_withdrawals_by_worker(&conn, "w1").unwrap();
        assert_eq!(withdrawals.len(), 2);
    }

    #[test]
    fn test_merge_tips_inserts_unknown_ids() {
        let conn = test_db();
        let fetched = vec![
            tip("s1", "w1", 5.0, SettlementStatus::Completed),
            tip("s2", "w1", 10.0, SettlementStatus::Completed),
        ];

        merge_tips(&conn, &fetched).unwrap();
        merge_tips(&conn, &fetched).unwrap(); // 冪等

        assert_eq!(find_tips_by_worker(&conn, "w1").unwrap().len(), 2);
    }

    #[test]
    fn test_merge_tips_preserves_optimistic_entries() {
        // サーバーが知らないローカル行はマージで消えない
        let conn = test_db();
        insert_tip(&conn, &tip("local1", "w1", 2.0, SettlementStatus::Completed)).unwrap();

        merge_tips(&conn, &[tip("s1", "w1", 5.0, SettlementStatus::Completed)]).unwrap();

        let tips = find_tips_by_worker(&conn, "w1").unwrap();
        assert_eq!(tips.len(), 2);
        assert!(tips.iter().any(|t| t.id == "local1"));
    }

    #[test]
    fn test_merge_tips_never_overwrites_terminal_status() {
        // 終端状態（completed/failed）はマージでも変化しない
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Completed)).unwrap();

        merge_tips(&conn, &[tip("t1", "w1", 5.0, SettlementStatus::Failed)]).unwrap();

        let tips = find_tips_by_worker(&conn, "w1").unwrap();
        assert_eq!(tips[0].status, SettlementStatus::Completed);
    }

    #[test]
    fn test_merge_tips_updates_pending_status() {
        // pendingの行はサーバー側の確定状態で上書きされる
        let conn = test_db();
        insert_tip(&conn, &tip("t1", "w1", 5.0, SettlementStatus::Pending)).unwrap();

        merge_tips(&conn, &[tip("t1", "w1", 5.0, SettlementStatus::Completed)]).unwrap();

        let tips = find_tips_by_worker(&conn, "w1").unwrap();
        assert_eq!(tips[0].status, SettlementStatus::Completed);
    }

    #[test]
    fn test_merge_withdrawals_same_rules() {
        let conn = test_db();
        insert_withdrawal(&conn, &withdrawal("wd1", "w1", 6.0, SettlementStatus::Pending))
            .unwrap();
        insert_withdrawal(
            &conn,
            &withdrawal("wd2", "w1", 3.0, SettlementStatus::Completed),
        )
        .unwrap();

        let fetched = vec![
            withdrawal("wd1", "w1", 6.0, SettlementStatus::Completed),
            withdrawal("wd2", "w1", 3.0, SettlementStatus::Failed),
            withdrawal("s1", "w1", 1.0, SettlementStatus::Pending),
        ];
        merge_withdrawals(&conn, &fetched).unwrap();

        let withdrawals = find_withdrawals_by_worker(&conn, "w1").unwrap();
        assert_eq!(withdrawals.len(), 3);

        let by_id = |id: &str| withdrawals.iter().find(|w| w.id == id).unwrap().status;
        assert_eq!(by_id("wd1"), SettlementStatus::Completed); // pending → 確定
        assert_eq!(by_id("wd2"), SettlementStatus::Completed); // 終端は不変
        assert_eq!(by_id("s1"), SettlementStatus::Pending); // 新規挿入
    }

    #[quickcheck]
    fn prop_balance_never_negative(ops: Vec<(bool, u8)>) -> bool {
        // 任意のチップ送信・出金リクエスト列の後で残高が負にならない
        let conn = test_db();

        for (i, (is_tip, raw_amount)) in ops.into_iter().enumerate() {
            let amount = f64::from(raw_amount) / 10.0 + 0.1;
            if is_tip {
                insert_tip(
                    &conn,
                    &tip(&format!("t{i}"), "w1", amount, SettlementStatus::Completed),
                )
                .unwrap();
            } else {
                // 残高不足は想定内の失敗として無視する
                let _ = insert_withdrawal_checked(
                    &conn,
                    &withdrawal(&format!("wd{i}"), "w1", amount, SettlementStatus::Pending),
                );
            }

            if available_balance(&conn, "w1").unwrap() < 0.0 {
                return false;
            }
        }

        available_balance(&conn, "w1").unwrap() >= 0.0
    }
}
