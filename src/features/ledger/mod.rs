/// レジャー機能モジュール
///
/// このモジュールは、チップと出金リクエストの台帳管理に関連する
/// すべての機能を提供します：
/// - チップの送信（決済ゲートウェイ連携、同期精算）
/// - チップ・出金履歴の取得（サーバー結果のIDマージ）
/// - 出金リクエストの作成（残高チェック付き、直列化）
/// - 利用可能残高の計算（派生値）
pub mod commands;
pub mod models;
pub mod repository;
pub mod service;

// 公開インターフェース
pub use commands::{
    fetch_tips, fetch_withdrawals, get_available_balance, request_withdrawal, send_tip,
};

pub use models::{
    PaymentMethod, RequestWithdrawalDto, SendTipDto, SettlementStatus, Tip,
    WithdrawalDestination, WithdrawalRequest,
};

pub use service::LedgerService;
