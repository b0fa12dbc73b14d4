/// 外部ゲートウェイ抽象化モジュール
///
/// このモジュールは、コアが依存する外部サービスの境界契約を提供します：
/// - 決済ゲートウェイ（チップ送信時の課金）
/// - 課金ゲートウェイ（サブスクリプションの購入・復元・解約）
/// - レジャーバックエンド（チップ・出金履歴の取得元となるサーバー）
///
/// 実装はすべて注入可能なコラボレーターであり、本番配線では
/// モック実装（`mock`モジュール）を使用します。実際の決済事業者
/// 連携はスコープ外です。
pub mod mock;

use crate::features::ledger::models::{PaymentMethod, Tip, WithdrawalRequest};
use crate::shared::errors::AppResult;
use async_trait::async_trait;

/// 決済ゲートウェイからの課金結果
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    /// ゲートウェイ側のトランザクション参照ID
    pub transaction_id: String,
    /// 実際に課金された金額
    pub charged_amount: f64,
}

/// 決済ゲートウェイ（チップの課金処理）
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// クライアントへの課金を実行する
    ///
    /// # 引数
    /// * `worker_id` - チップ受取先ワーカーのID
    /// * `amount` - 課金額
    /// * `payment_method` - 支払い方法
    ///
    /// # 戻り値
    /// 課金結果、または失敗時はゲートウェイエラー
    async fn charge(
        &self,
        worker_id: &str,
        amount: f64,
        payment_method: PaymentMethod,
    ) -> AppResult<ChargeReceipt>;
}

/// 課金ゲートウェイ（サブスクリプションのストア連携）
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// 無料トライアルを開始する
    async fn start_trial(&self) -> AppResult<()>;

    /// サブスクリプションを購入する
    async fn purchase(&self) -> AppResult<()>;

    /// 過去の購入を復元する
    async fn restore(&self) -> AppResult<()>;

    /// サブスクリプションを解約する
    async fn cancel(&self) -> AppResult<()>;
}

/// レジャーバックエンド（チップ・出金履歴のサーバーオブレコード）
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// ワーカーのチップ履歴を取得する
    ///
    /// # 引数
    /// * `worker_id` - ワーカーのID
    ///
    /// # 戻り値
    /// サーバー側で確認済みのチップのリスト
    async fn fetch_tips(&self, worker_id: &str) -> AppResult<Vec<Tip>>;

    /// ワーカーの出金リクエスト履歴を取得する
    ///
    /// # 引数
    /// * `worker_id` - ワーカーのID
    ///
    /// # 戻り値
    /// サーバー側で確認済みの出金リクエストのリスト
    async fn fetch_withdrawals(&self, worker_id: &str) -> AppResult<Vec<WithdrawalRequest>>;
}
