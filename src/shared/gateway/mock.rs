use super::{BillingGateway, ChargeReceipt, LedgerBackend, PaymentGateway};
use crate::features::ledger::models::{
    PaymentMethod, SettlementStatus, Tip, WithdrawalDestination, WithdrawalRequest,
};
use crate::shared::config::environment::GatewayConfig;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use chrono_tz::America::Caracas;
use std::time::Duration;
use uuid::Uuid;

/// モックゲートウェイの動作設定
///
/// 固定の擬似遅延と失敗制御を持ちます：
/// - `fail` - trueの場合は常に失敗する（テストでの決定的な失敗用）
/// - `failure_rate` - 0.0〜1.0のランダム失敗率（本番モックの揺らぎ用）
#[derive(Debug, Clone)]
pub struct MockGatewayBehavior {
    /// 呼び出しごとの擬似遅延
    pub delay: Duration,
    /// 常に失敗させるフラグ
    pub fail: bool,
    /// ランダム失敗率（0.0〜1.0）
    pub failure_rate: f64,
}

impl Default for MockGatewayBehavior {
    fn default() -> Self {
        // オリジナルのモックAPIと同じ1秒遅延
        Self {
            delay: Duration::from_millis(1000),
            fail: false,
            failure_rate: 0.0,
        }
    }
}

impl MockGatewayBehavior {
    /// ゲートウェイ設定から動作設定を構築する
    ///
    /// # 引数
    /// * `config` - 環境変数由来のゲートウェイ設定
    ///
    /// # 戻り値
    /// モックゲートウェイの動作設定
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            fail: false,
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
        }
    }

    /// 遅延なし・常に成功の動作設定を作成する（テスト用）
    pub fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: false,
            failure_rate: 0.0,
        }
    }

    /// 遅延なし・常に失敗の動作設定を作成する（テスト用）
    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
            failure_rate: 0.0,
        }
    }

    /// 擬似遅延と失敗判定を実行する
    ///
    /// # 引数
    /// * `gateway_name` - エラーメッセージに使用するゲートウェイ名
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はゲートウェイエラー
    async fn simulate(&self, gateway_name: &str) -> AppResult<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail || (self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate) {
            log::warn!("モックゲートウェイ呼び出しが失敗しました: {gateway_name}");
            return Err(AppError::gateway(gateway_name, "API call failed"));
        }

        Ok(())
    }
}

/// 決済ゲートウェイのモック実装
pub struct MockPaymentGateway {
    behavior: MockGatewayBehavior,
}

impl MockPaymentGateway {
    pub fn new(behavior: MockGatewayBehavior) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(
        &self,
        worker_id: &str,
        amount: f64,
        payment_method: PaymentMethod,
    ) -> AppResult<ChargeReceipt> {
        self.behavior.simulate("PaymentGateway").await?;

        let transaction_id = Uuid::new_v4().to_string();
        log::info!(
            "課金成功: worker_id={worker_id}, amount={amount}, method={}, tx={transaction_id}",
            payment_method.as_str()
        );

        Ok(ChargeReceipt {
            transaction_id,
            charged_amount: amount,
        })
    }
}

/// 課金ゲートウェイのモック実装
pub struct MockBillingGateway {
    behavior: MockGatewayBehavior,
}

impl MockBillingGateway {
    pub fn new(behavior: MockGatewayBehavior) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl BillingGateway for MockBillingGateway {
    async fn start_trial(&self) -> AppResult<()> {
        self.behavior.simulate("BillingGateway").await
    }

    async fn purchase(&self) -> AppResult<()> {
        self.behavior.simulate("BillingGateway").await
    }

    async fn restore(&self) -> AppResult<()> {
        self.behavior.simulate("BillingGateway").await
    }

    async fn cancel(&self) -> AppResult<()> {
        self.behavior.simulate("BillingGateway").await
    }
}

/// レジャーバックエンドのモック実装
///
/// サーバーオブレコードの代役として固定のフィクスチャデータを返します。
pub struct MockLedgerBackend {
    behavior: MockGatewayBehavior,
    tips: Vec<Tip>,
    withdrawals: Vec<WithdrawalRequest>,
}

impl MockLedgerBackend {
    /// 空のバックエンドを作成する
    pub fn new(behavior: MockGatewayBehavior) -> Self {
        Self {
            behavior,
            tips: Vec::new(),
            withdrawals: Vec::new(),
        }
    }

    /// 任意のデータを返すバックエンドを作成する（テスト用）
    pub fn with_data(
        behavior: MockGatewayBehavior,
        tips: Vec<Tip>,
        withdrawals: Vec<WithdrawalRequest>,
    ) -> Self {
        Self {
            behavior,
            tips,
            withdrawals,
        }
    }

    /// デモ用フィクスチャを持つバックエンドを作成する
    ///
    /// # 引数
    /// * `behavior` - モックの動作設定
    /// * `worker_id` - フィクスチャを紐付けるワーカーのID
    ///
    /// # 戻り値
    /// 確認済みチップ3件（$5/$10/$3）と完了済み出金1件（$15）を持つバックエンド
    pub fn with_demo_fixture(behavior: MockGatewayBehavior, worker_id: &str) -> Self {
        let days_ago = |days: i64| {
            (Utc::now() - ChronoDuration::days(days))
                .with_timezone(&Caracas)
                .to_rfc3339()
        };

        let tips = vec![
            Tip {
                id: "demo-tip-1".to_string(),
                amount: 5.0,
                worker_id: worker_id.to_string(),
                client_id: None,
                payment_method: PaymentMethod::Card,
                status: SettlementStatus::Completed,
                comment: Some("Great service!".to_string()),
                rating: Some(5),
                created_at: days_ago(1),
            },
            Tip {
                id: "demo-tip-2".to_string(),
                amount: 10.0,
                worker_id: worker_id.to_string(),
                client_id: None,
                payment_method: PaymentMethod::Usdt,
                status: SettlementStatus::Completed,
                comment: None,
                rating: None,
                created_at: days_ago(2),
            },
            Tip {
                id: "demo-tip-3".to_string(),
                amount: 3.0,
                worker_id: worker_id.to_string(),
                client_id: None,
                payment_method: PaymentMethod::Ton,
                status: SettlementStatus::Completed,
                comment: Some("Thanks for the help!".to_string()),
                rating: Some(4),
                created_at: days_ago(3),
            },
        ];

        let withdrawals = vec![WithdrawalRequest {
            id: "demo-withdrawal-1".to_string(),
            worker_id: worker_id.to_string(),
            amount: 15.0,
            destination: WithdrawalDestination::Wallet,
            status: SettlementStatus::Completed,
            created_at: days_ago(5),
        }];

        Self {
            behavior,
            tips,
            withdrawals,
        }
    }
}

#[async_trait]
impl LedgerBackend for MockLedgerBackend {
    async fn fetch_tips(&self, worker_id: &str) -> AppResult<Vec<Tip>> {
        self.behavior.simulate("LedgerBackend").await?;

        Ok(self
            .tips
            .iter()
            .filter(|t| t.worker_id == worker_id)
            .cloned()
            .collect())
    }

    async fn fetch_withdrawals(&self, worker_id: &str) -> AppResult<Vec<WithdrawalRequest>> {
        self.behavior.simulate("LedgerBackend").await?;

        Ok(self
            .withdrawals
            .iter()
            .filter(|w| w.worker_id == worker_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_payment_gateway_success() {
        let gateway = MockPaymentGateway::new(MockGatewayBehavior::instant());
        let receipt = gateway
            .charge("worker-1", 5.0, PaymentMethod::Card)
            .await
            .unwrap();

        assert_eq!(receipt.charged_amount, 5.0);
        assert!(!receipt.transaction_id.is_empty());
    }

    #[tokio::test]
    async fn test_mock_payment_gateway_failure() {
        let gateway = MockPaymentGateway::new(MockGatewayBehavior::failing());
        let result = gateway.charge("worker-1", 5.0, PaymentMethod::Card).await;

        assert!(matches!(result, Err(AppError::Gateway(_))));
    }

    #[tokio::test]
    async fn test_mock_billing_gateway_failure_is_deterministic() {
        let gateway = MockBillingGateway::new(MockGatewayBehavior::failing());

        assert!(gateway.start_trial().await.is_err());
        assert!(gateway.purchase().await.is_err());
        assert!(gateway.restore().await.is_err());
        assert!(gateway.cancel().await.is_err());
    }

    #[tokio::test]
    async fn test_demo_fixture_filters_by_worker() {
        let backend =
            MockLedgerBackend::with_demo_fixture(MockGatewayBehavior::instant(), "worker-1");

        let tips = backend.fetch_tips("worker-1").await.unwrap();
        assert_eq!(tips.len(), 3);

        let other = backend.fetch_tips("worker-2").await.unwrap();
        assert!(other.is_empty());

        let withdrawals = backend.fetch_withdrawals("worker-1").await.unwrap();
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].amount, 15.0);
    }

    #[tokio::test]
    async fn test_fetch_is_repeatable() {
        // 同じ呼び出しを2回行っても同じ列が返ることを確認
        let backend =
            MockLedgerBackend::with_demo_fixture(MockGatewayBehavior::instant(), "worker-1");

        let first = backend.fetch_tips("worker-1").await.unwrap();
        let second = backend.fetch_tips("worker-1").await.unwrap();

        let first_ids: Vec<&str> = first.iter().map(|t| t.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
    }
}
