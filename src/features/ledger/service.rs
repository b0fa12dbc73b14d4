use crate::features::ledger::models::{
    RequestWithdrawalDto, SendTipDto, SettlementStatus, Tip, WithdrawalRequest,
    MAX_COMMENT_LENGTH, MAX_RATING, MIN_RATING,
};
use crate::features::ledger::repository;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::gateway::{LedgerBackend, PaymentGateway};
use crate::shared::utils::generate_entity_id;
use chrono::Utc;
use chrono_tz::America::Caracas;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// レジャーコアサービス
///
/// アクティブセッションのチップ・出金リクエストのコレクションを所有し、
/// 作成コマンドと取得・残高クエリを提供します。金額・状態の不変条件は
/// すべてこのサービスで検証されます。
///
/// # 並行性
/// 出金リクエストの作成は残高チェックと挿入を`Mutex<Connection>`の
/// ロック保持中に行うため、同一ワーカーに対する並行リクエストは
/// 直列化されます。ゲートウェイ呼び出しの待機はロック外で行われます。
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<Mutex<Connection>>,
    payment_gateway: Arc<dyn PaymentGateway>,
    backend: Arc<dyn LedgerBackend>,
}

impl LedgerService {
    /// レジャーサービスを作成する
    ///
    /// # 引数
    /// * `db` - 共有データベース接続
    /// * `payment_gateway` - 決済ゲートウェイ
    /// * `backend` - レジャーバックエンド（履歴取得元）
    pub fn new(
        db: Arc<Mutex<Connection>>,
        payment_gateway: Arc<dyn PaymentGateway>,
        backend: Arc<dyn LedgerBackend>,
    ) -> Self {
        Self {
            db,
            payment_gateway,
            backend,
        }
    }

    /// チップを送信する
    ///
    /// # 引数
    /// * `dto` - チップ送信用DTO
    ///
    /// # 戻り値
    /// 作成されたチップ、または失敗時はエラー
    ///
    /// # 処理内容
    /// 1. 入力バリデーション（外部呼び出し前に実行）
    /// 2. 決済ゲートウェイで課金
    /// 3. 課金成功時のみ`completed`状態のチップを記録（同期精算）
    ///
    /// 課金失敗時は何も記録されず、ゲートウェイエラーが返る
    pub async fn send_tip(&self, dto: SendTipDto) -> AppResult<Tip> {
        validate_send_tip(&dto)?;

        let receipt = self
            .payment_gateway
            .charge(&dto.worker_id, dto.amount, dto.payment_method)
            .await?;

        let tip = Tip {
            id: generate_entity_id(),
            amount: dto.amount,
            worker_id: dto.worker_id,
            client_id: dto.client_id,
            payment_method: dto.payment_method,
            status: SettlementStatus::Completed,
            comment: dto.comment,
            rating: dto.rating,
            created_at: now_timestamp(),
        };

        {
            let db = self.lock_db()?;
            repository::insert_tip(&db, &tip)?;
        }

        log::info!(
            "チップ送信成功: tip_id={}, worker_id={}, amount={}, tx={}",
            tip.id,
            tip.worker_id,
            tip.amount,
            receipt.transaction_id
        );

        Ok(tip)
    }

    /// ワーカーのチップ履歴を取得する
    ///
    /// # 引数
    /// * `worker_id` - ワーカーのID
    ///
    /// # 戻り値
    /// チップのリスト（新しい順）、または失敗時はエラー
    ///
    /// バックエンドの結果はIDでローカルキャッシュへマージされる。
    /// 介在する変更がなければ再取得は同じ列を返す（冪等）。
    pub async fn fetch_tips(&self, worker_id: &str) -> AppResult<Vec<Tip>> {
        let fetched = self.backend.fetch_tips(worker_id).await?;

        let db = self.lock_db()?;
        repository::merge_tips(&db, &fetched)?;
        repository::find_tips_by_worker(&db, worker_id)
    }

    /// 出金をリクエストする
    ///
    /// # 引数
    /// * `dto` - 出金リクエスト作成用DTO
    ///
    /// # 戻り値
    /// 作成された出金リクエスト（`pending`状態）、または失敗時はエラー
    ///
    /// 残高チェックと挿入はロック保持中の単一トランザクションで行われ、
    /// 並行リクエストによる残高超過を防ぐ。精算の確定はスコープ外
    /// （リクエストは`pending`のまま楽観的に追加される）。
    pub async fn request_withdrawal(
        &self,
        dto: RequestWithdrawalDto,
    ) -> AppResult<WithdrawalRequest> {
        validate_withdrawal_amount(dto.amount)?;

        let withdrawal = WithdrawalRequest {
            id: generate_entity_id(),
            worker_id: dto.worker_id,
            amount: dto.amount,
            destination: dto.destination,
            status: SettlementStatus::Pending,
            created_at: now_timestamp(),
        };

        {
            let db = self.lock_db()?;
            repository::insert_withdrawal_checked(&db, &withdrawal)?;
        }

        log::info!(
            "出金リクエスト作成: withdrawal_id={}, worker_id={}, amount={}",
            withdrawal.id,
            withdrawal.worker_id,
            withdrawal.amount
        );

        Ok(withdrawal)
    }

    /// ワーカーの出金リクエスト履歴を取得する
    ///
    /// # 引数
    /// * `worker_id` - ワーカーのID
    ///
    /// # 戻り値
    /// 出金リクエストのリスト（新しい順）、または失敗時はエラー
    pub async fn fetch_withdrawals(&self, worker_id: &str) -> AppResult<Vec<WithdrawalRequest>> {
        let fetched = self.backend.fetch_withdrawals(worker_id).await?;

        let db = self.lock_db()?;
        repository::merge_withdrawals(&db, &fetched)?;
        repository::find_withdrawals_by_worker(&db, worker_id)
    }

    /// ワーカーの利用可能残高を取得する
    ///
    /// # 引数
    /// * `worker_id` - ワーカーのID
    ///
    /// # 戻り値
    /// 確認済みチップ合計 − 失敗していない出金合計（下限0）
    pub fn available_balance(&self, worker_id: &str) -> AppResult<f64> {
        let db = self.lock_db()?;
        repository::available_balance(&db, worker_id)
    }

    /// データベースロックを取得する
    fn lock_db(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックの取得に失敗: {e}")))
    }
}

/// 現在時刻をRFC3339形式で取得する（カラカス時間）
fn now_timestamp() -> String {
    Utc::now().with_timezone(&Caracas).to_rfc3339()
}

/// チップ送信DTOを検証する
///
/// # 引数
/// * `dto` - 検証するDTO
///
/// # 戻り値
/// 有効な場合はOk(())、無効な場合はバリデーションエラー
fn validate_send_tip(dto: &SendTipDto) -> AppResult<()> {
    if !(dto.amount > 0.0 && dto.amount.is_finite()) {
        return Err(AppError::validation("チップ金額は正の数値である必要があります"));
    }

    if let Some(comment) = &dto.comment {
        if comment.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::validation(format!(
                "コメントは{MAX_COMMENT_LENGTH}文字以内である必要があります"
            )));
        }
    }

    if let Some(rating) = dto.rating {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::validation(format!(
                "評価は{MIN_RATING}〜{MAX_RATING}の整数である必要があります"
            )));
        }
    }

    Ok(())
}

/// 出金金額を検証する
///
/// # 引数
/// * `amount` - 検証する金額
///
/// # 戻り値
/// 有効な場合はOk(())、無効な場合はバリデーションエラー
fn validate_withdrawal_amount(amount: f64) -> AppResult<()> {
    if !(amount > 0.0 && amount.is_finite()) {
        return Err(AppError::validation("出金金額は正の数値である必要があります"));
    }

    Ok(())
}
