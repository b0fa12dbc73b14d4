/// サブスクリプション機能モジュール
///
/// このモジュールは、ワーカーのサブスクリプション管理に関連する
/// すべての機能を提供します：
/// - 無料トライアルの開始（30日間）
/// - サブスクリプションの購入・解約・復元（課金ゲートウェイ連携）
/// - 時刻ベースの期限確認（冪等）
pub mod commands;
pub mod models;
pub mod repository;
pub mod service;

// 公開インターフェース
pub use commands::{
    cancel_subscription, check_subscription_status, restore_subscription, start_trial, subscribe,
};

pub use models::{SubscriptionState, SubscriptionStatus};

pub use service::SubscriptionService;
