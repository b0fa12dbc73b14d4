use super::models::{
    SubscriptionState, SubscriptionStatus, BILLING_PERIOD_DAYS, TRIAL_PERIOD_DAYS,
};
use super::repository;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::gateway::BillingGateway;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use chrono_tz::America::Caracas;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// サブスクリプションコアサービス
///
/// トライアル・有効・期限切れを追跡する状態機械を所有します。
/// ストア連携を伴う操作は課金ゲートウェイを先に呼び出し、
/// 成功した場合のみ状態を変更します（部分変更なし）。
#[derive(Clone)]
pub struct SubscriptionService {
    db: Arc<Mutex<Connection>>,
    billing_gateway: Arc<dyn BillingGateway>,
}

impl SubscriptionService {
    /// サブスクリプションサービスを作成する
    ///
    /// # 引数
    /// * `db` - 共有データベース接続
    /// * `billing_gateway` - 課金ゲートウェイ
    pub fn new(db: Arc<Mutex<Connection>>, billing_gateway: Arc<dyn BillingGateway>) -> Self {
        Self {
            db,
            billing_gateway,
        }
    }

    /// 無料トライアルを開始する
    ///
    /// # 戻り値
    /// 更新後の状態、または失敗時はエラー
    ///
    /// # 前提条件
    /// 状態が`none`であること。それ以外の状態からの呼び出しは
    /// バリデーションエラーとなる（暗黙の再開始は許可しない）
    pub async fn start_trial(&self) -> AppResult<SubscriptionState> {
        let current = self.current_state()?;
        if current.status != SubscriptionStatus::None {
            return Err(AppError::validation(
                "トライアルは未登録状態からのみ開始できます",
            ));
        }

        self.billing_gateway.start_trial().await?;

        let now = Utc::now();
        let state = SubscriptionState {
            status: SubscriptionStatus::Trial,
            start_date: Some(format_timestamp(now)),
            end_date: None,
            trial_end_date: Some(format_timestamp(now + ChronoDuration::days(TRIAL_PERIOD_DAYS))),
        };

        let db = self.lock_db()?;
        repository::save_state(&db, &state)?;

        log::info!("トライアルを開始しました: trial_end={:?}", state.trial_end_date);
        Ok(state)
    }

    /// サブスクリプションを購入する
    ///
    /// # 戻り値
    /// 更新後の状態（`active`、30日間の課金期間）、または失敗時はエラー
    pub async fn subscribe(&self) -> AppResult<SubscriptionState> {
        self.billing_gateway.purchase().await?;

        let now = Utc::now();
        let db = self.lock_db()?;
        let mut state = repository::load_state(&db)?;
        state.status = SubscriptionStatus::Active;
        state.start_date = Some(format_timestamp(now));
        state.end_date = Some(format_timestamp(
            now + ChronoDuration::days(BILLING_PERIOD_DAYS),
        ));
        repository::save_state(&db, &state)?;

        log::info!("サブスクリプションを開始しました: end={:?}", state.end_date);
        Ok(state)
    }

    /// サブスクリプションを解約する
    ///
    /// # 戻り値
    /// 更新後の状態（即時`expired`）、または失敗時はエラー
    ///
    /// # 前提条件
    /// 状態が`trial`または`active`であること
    ///
    /// 解約は即時に期限切れとする（期間終了までの猶予は設けない）
    pub async fn cancel_subscription(&self) -> AppResult<SubscriptionState> {
        let current = self.current_state()?;
        if !matches!(
            current.status,
            SubscriptionStatus::Trial | SubscriptionStatus::Active
        ) {
            return Err(AppError::validation(
                "有効なサブスクリプションまたはトライアルがありません",
            ));
        }

        self.billing_gateway.cancel().await?;

        let db = self.lock_db()?;
        let mut state = repository::load_state(&db)?;
        state.status = SubscriptionStatus::Expired;
        repository::save_state(&db, &state)?;

        log::info!("サブスクリプションを解約しました");
        Ok(state)
    }

    /// 過去の購入を復元する
    ///
    /// # 戻り値
    /// 更新後の状態（`active`、新しい30日間の課金期間）、または失敗時はエラー
    ///
    /// 外部ストアでの購入検証はゲートウェイが代行する（モック）
    pub async fn restore_subscription(&self) -> AppResult<SubscriptionState> {
        self.billing_gateway.restore().await?;

        let now = Utc::now();
        let db = self.lock_db()?;
        let mut state = repository::load_state(&db)?;
        state.status = SubscriptionStatus::Active;
        state.start_date = Some(format_timestamp(now));
        state.end_date = Some(format_timestamp(
            now + ChronoDuration::days(BILLING_PERIOD_DAYS),
        ));
        repository::save_state(&db, &state)?;

        log::info!("サブスクリプションを復元しました: end={:?}", state.end_date);
        Ok(state)
    }

    /// サブスクリプションの期限を確認する
    ///
    /// # 戻り値
    /// （期限切れを反映した）現在の状態、または失敗時はエラー
    ///
    /// 純粋な時刻ベースの確認で、繰り返し呼び出しても安全（冪等）。
    /// アプリのフォアグラウンド復帰・セッション開始のたびに呼び出すこと。
    pub fn check_subscription_status(&self) -> AppResult<SubscriptionState> {
        self.check_at(Utc::now())
    }

    /// 指定時刻を基準にサブスクリプションの期限を確認する
    ///
    /// # 引数
    /// * `now` - 判定基準時刻
    ///
    /// # 戻り値
    /// （期限切れを反映した）現在の状態、または失敗時はエラー
    pub fn check_at(&self, now: DateTime<Utc>) -> AppResult<SubscriptionState> {
        let db = self.lock_db()?;
        let mut state = repository::load_state(&db)?;

        let deadline = match state.status {
            SubscriptionStatus::Trial => state.trial_end_date.clone(),
            SubscriptionStatus::Active => state.end_date.clone(),
            SubscriptionStatus::None | SubscriptionStatus::Expired => None,
        };

        if let Some(deadline) = deadline {
            let deadline = parse_timestamp(&deadline)?;
            if now > deadline {
                state.status = SubscriptionStatus::Expired;
                repository::save_state(&db, &state)?;
                log::info!("サブスクリプションが期限切れになりました");
            }
        }

        Ok(state)
    }

    /// 現在のサブスクリプション状態を取得する
    fn current_state(&self) -> AppResult<SubscriptionState> {
        let db = self.lock_db()?;
        repository::load_state(&db)
    }

    /// データベースロックを取得する
    fn lock_db(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックの取得に失敗: {e}")))
    }
}

/// 時刻をRFC3339形式で整形する（カラカス時間）
fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Caracas).to_rfc3339()
}

/// RFC3339形式の文字列を時刻として解析する
fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("保存された日付の解析に失敗: {value}: {e}")))
}
