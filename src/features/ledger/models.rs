use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// コメントの最大文字数
pub const MAX_COMMENT_LENGTH: usize = 200;

/// 評価の最小値
pub const MIN_RATING: u8 = 1;

/// 評価の最大値
pub const MAX_RATING: u8 = 5;

/// 支払い方法（閉集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Usdt,
    Ton,
}

impl PaymentMethod {
    /// データベース・JSON表現の文字列を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Usdt => "usdt",
            PaymentMethod::Ton => "ton",
        }
    }

    /// 文字列から支払い方法を解析する
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(PaymentMethod::Card),
            "usdt" => Some(PaymentMethod::Usdt),
            "ton" => Some(PaymentMethod::Ton),
            _ => None,
        }
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or(FromSqlError::InvalidType)
    }
}

/// チップ・出金リクエストの決済状態
///
/// `pending → completed` または `pending → failed` のみが合法な遷移で、
/// `completed` と `failed` は終端状態（以後一切変化しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Completed,
    Failed,
}

impl SettlementStatus {
    /// データベース・JSON表現の文字列を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Completed => "completed",
            SettlementStatus::Failed => "failed",
        }
    }

    /// 文字列から決済状態を解析する
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SettlementStatus::Pending),
            "completed" => Some(SettlementStatus::Completed),
            "failed" => Some(SettlementStatus::Failed),
            _ => None,
        }
    }

    /// 終端状態かどうかを判定する
    ///
    /// # 戻り値
    /// `completed` または `failed` の場合はtrue
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SettlementStatus::Completed | SettlementStatus::Failed
        )
    }
}

impl ToSql for SettlementStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for SettlementStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or(FromSqlError::InvalidType)
    }
}

/// 出金先（ウォレットまたは銀行口座）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalDestination {
    Wallet,
    Bank,
}

impl WithdrawalDestination {
    /// データベース・JSON表現の文字列を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalDestination::Wallet => "wallet",
            WithdrawalDestination::Bank => "bank",
        }
    }

    /// 文字列から出金先を解析する
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wallet" => Some(WithdrawalDestination::Wallet),
            "bank" => Some(WithdrawalDestination::Bank),
            _ => None,
        }
    }
}

impl ToSql for WithdrawalDestination {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for WithdrawalDestination {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or(FromSqlError::InvalidType)
    }
}

/// チップデータモデル
///
/// クライアントからワーカーへの1回の支払い。`id` と `created_at` は
/// 作成時に確定し、以後不変。`status` は終端状態に到達後変化しない。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tip {
    pub id: String,
    pub amount: f64,
    pub worker_id: String,
    pub client_id: Option<String>, // 匿名の場合はNone
    pub payment_method: PaymentMethod,
    pub status: SettlementStatus,
    pub comment: Option<String>, // 200文字以内
    pub rating: Option<u8>,      // 1〜5
    pub created_at: String,      // RFC3339形式
}

/// 出金リクエストデータモデル
///
/// ワーカーが蓄積したチップ資金を外部ウォレット・銀行口座へ
/// 移動するためのリクエスト。作成時は `pending` で、外部での
/// 精算確定は本コアのスコープ外。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WithdrawalRequest {
    pub id: String,
    pub worker_id: String,
    pub amount: f64,
    pub destination: WithdrawalDestination,
    pub status: SettlementStatus,
    pub created_at: String, // RFC3339形式
}

/// チップ送信用DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct SendTipDto {
    pub worker_id: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    /// 送信元クライアントのID（匿名の場合はNone）
    pub client_id: Option<String>,
    pub comment: Option<String>,
    pub rating: Option<u8>,
}

/// 出金リクエスト作成用DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestWithdrawalDto {
    pub worker_id: String,
    pub amount: f64,
    pub destination: WithdrawalDestination,
}
