use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// 無料トライアル期間（日数）
pub const TRIAL_PERIOD_DAYS: i64 = 30;

/// サブスクリプションの1課金期間（日数）
///
/// 実際の更新は外部のストア側で行われる前提の、1期間分の長さ
pub const BILLING_PERIOD_DAYS: i64 = 30;

/// サブスクリプションの状態
///
/// 状態機械: `none → trial → {active, expired}`、
/// `trial → expired`（期限切れ・解約）、`active → expired`（期限切れ・解約）、
/// `expired → active`（再購読・復元）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    None,
    Trial,
    Active,
    Expired,
}

impl SubscriptionStatus {
    /// データベース・JSON表現の文字列を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// 文字列からサブスクリプション状態を解析する
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(SubscriptionStatus::None),
            "trial" => Some(SubscriptionStatus::Trial),
            "active" => Some(SubscriptionStatus::Active),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }
}

impl ToSql for SubscriptionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for SubscriptionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or(FromSqlError::InvalidType)
    }
}

/// サブスクリプション状態データモデル
///
/// 1インストール＝1ワーカーセッションのため、常に1件のみ存在する
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubscriptionState {
    pub status: SubscriptionStatus,
    pub start_date: Option<String>,     // RFC3339形式
    pub end_date: Option<String>,       // RFC3339形式
    pub trial_end_date: Option<String>, // RFC3339形式
}

impl Default for SubscriptionState {
    fn default() -> Self {
        Self {
            status: SubscriptionStatus::None,
            start_date: None,
            end_date: None,
            trial_end_date: None,
        }
    }
}
