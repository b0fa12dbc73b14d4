// 機能モジュール構造
pub mod features;
pub mod shared;

use features::ledger::LedgerService;
use features::subscriptions::SubscriptionService;
use features::{ledger::commands as ledger_commands, subscriptions::commands as subscription_commands};
use log::info;
use shared::config::environment::{
    initialize_logging_system, load_environment_variables, GatewayConfig,
};
use shared::database::connection::initialize_database;
use shared::gateway::mock::{
    MockBillingGateway, MockGatewayBehavior, MockLedgerBackend, MockPaymentGateway,
};
use std::sync::{Arc, Mutex};
use tauri::Manager;

/// デモセッションのワーカーID
///
/// バックエンドのフィクスチャデータを紐付ける先。実サーバー同期の
/// 導入時には認証済みワーカーのIDに置き換わる
const DEMO_WORKER_ID: &str = "1";

/// アプリケーション状態（レジャーコアとサブスクリプションコアを保持）
pub struct AppState {
    pub ledger: LedgerService,
    pub subscriptions: SubscriptionService,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_deep_link::init())
        .setup(|app| {
            // 環境に応じた.envファイルを読み込み（ログシステム初期化前に実行）
            load_environment_variables();

            // ログシステムを初期化（.envファイル読み込み後）
            initialize_logging_system();

            info!("アプリケーション初期化を開始します...");

            // データベースを初期化
            let conn = initialize_database(app.handle())?;
            let db = Arc::new(Mutex::new(conn));

            // モックゲートウェイを構築（実ゲートウェイ連携はスコープ外）
            let gateway_config = GatewayConfig::from_env();
            let behavior = MockGatewayBehavior::from_config(&gateway_config);
            let payment_gateway = Arc::new(MockPaymentGateway::new(behavior.clone()));
            let billing_gateway = Arc::new(MockBillingGateway::new(behavior.clone()));
            let backend = Arc::new(MockLedgerBackend::with_demo_fixture(
                behavior,
                DEMO_WORKER_ID,
            ));

            // コアサービスを構築してアプリケーション状態に登録
            app.manage(AppState {
                ledger: LedgerService::new(db.clone(), payment_gateway, backend),
                subscriptions: SubscriptionService::new(db, billing_gateway),
            });

            info!("アプリケーション初期化が完了しました");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // レジャーコマンド
            ledger_commands::send_tip,
            ledger_commands::fetch_tips,
            ledger_commands::request_withdrawal,
            ledger_commands::fetch_withdrawals,
            ledger_commands::get_available_balance,
            // サブスクリプションコマンド
            subscription_commands::start_trial,
            subscription_commands::subscribe,
            subscription_commands::cancel_subscription,
            subscription_commands::restore_subscription,
            subscription_commands::check_subscription_status,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
