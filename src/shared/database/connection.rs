use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::PathBuf;
use tauri::{AppHandle, Manager};

/// データベース接続を初期化し、テーブルを作成する
///
/// # 引数
/// * `app_handle` - Tauriアプリケーションハンドル
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. アプリケーションデータディレクトリの確保
/// 2. データベースファイルパスの決定
/// 3. データベース接続の開設
/// 4. テーブル作成の実行
pub fn initialize_database(app_handle: &AppHandle) -> AppResult<Connection> {
    // データベースファイルパスを取得
    let database_path = get_database_path(app_handle)?;

    // データベース接続を開く
    let conn = Connection::open(&database_path)?;

    // テーブルを作成
    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {:?}", database_path);

    Ok(conn)
}

/// アプリデータディレクトリ内のデータベースファイルパスを取得する
///
/// # 引数
/// * `app_handle` - Tauriアプリケーションハンドル
///
/// # 戻り値
/// データベースファイルのパス、または失敗時はエラー
pub fn get_database_path(app_handle: &AppHandle) -> AppResult<PathBuf> {
    // アプリケーションデータディレクトリを取得
    let app_data_dir = app_handle.path().app_data_dir().map_err(|e| {
        AppError::configuration(format!("アプリデータディレクトリの取得に失敗: {e}"))
    })?;

    ensure_directory(&app_data_dir)?;

    // 環境に応じたデータベースファイル名を決定
    let db_filename = get_database_filename();
    let database_path = app_data_dir.join(db_filename);

    Ok(database_path)
}

/// ディレクトリが存在しない場合は作成する
fn ensure_directory(dir: &PathBuf) -> AppResult<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| {
            AppError::configuration(format!("アプリデータディレクトリの作成に失敗: {e}"))
        })?;
        log::info!("アプリケーションデータディレクトリを作成: {:?}", dir);
    }
    Ok(())
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # 戻り値
/// データベースファイル名
///
/// # ファイル名の規則
/// - 開発環境: "dev_tipazo.db"
/// - プロダクション環境: "tipazo.db"
fn get_database_filename() -> &'static str {
    // 環境判定
    let is_production = is_production_environment();

    if is_production {
        "tipazo.db"
    } else {
        "dev_tipazo.db"
    }
}

/// プロダクション環境かどうかを判定する
///
/// # 戻り値
/// プロダクション環境の場合はtrue
///
/// # 判定ロジック
/// 1. コンパイル時埋め込み環境変数を最優先
/// 2. 実行時環境変数 ENVIRONMENT を確認
/// 3. デバッグビルドの場合は開発環境
/// 4. リリースビルドの場合はプロダクション環境
fn is_production_environment() -> bool {
    // コンパイル時埋め込み環境変数を最優先
    if let Some(embedded_env) = option_env!("ENVIRONMENT") {
        return embedded_env == "production";
    }

    // 実行時環境変数を確認
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        return env_var == "production";
    }

    // フォールバック: ビルド設定に基づく判定
    !cfg!(debug_assertions)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    create_tips_table(conn)?;
    create_withdrawal_requests_table(conn)?;
    create_subscription_state_table(conn)?;
    create_indexes(conn)?;

    Ok(())
}

/// チップテーブルを作成する
fn create_tips_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tips (
            id TEXT PRIMARY KEY,
            worker_id TEXT NOT NULL,
            client_id TEXT,
            amount REAL NOT NULL,
            payment_method TEXT NOT NULL,
            status TEXT NOT NULL,
            comment TEXT,
            rating INTEGER,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// 出金リクエストテーブルを作成する
fn create_withdrawal_requests_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS withdrawal_requests (
            id TEXT PRIMARY KEY,
            worker_id TEXT NOT NULL,
            amount REAL NOT NULL,
            destination TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// サブスクリプション状態テーブルを作成する
///
/// 1インストール＝1ワーカーセッションのため、常に1行のみを保持する
fn create_subscription_state_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscription_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            status TEXT NOT NULL DEFAULT 'none',
            start_date TEXT,
            end_date TEXT,
            trial_end_date TEXT
        )",
        [],
    )?;

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    // ワーカー単位の履歴取得・残高集計用
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tips_worker_id ON tips(worker_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tips_created_at ON tips(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_withdrawal_requests_worker_id
         ON withdrawal_requests(worker_id)",
        [],
    )?;

    Ok(())
}
