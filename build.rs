use std::env;

fn main() {
    // ビルド時に環境変数を設定
    // 環境変数は外部（スクリプトや `pnpm tauri dev` 実行時の .env ファイル）から提供されることを前提とする
    // 開発環境（pnpm tauri dev）では .env ファイルが自動的に読み込まれる

    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    println!("cargo:rustc-env=ENVIRONMENT={}", environment);

    // モックゲートウェイの応答遅延（ミリ秒）
    let gateway_delay = env::var("GATEWAY_DELAY_MS").unwrap_or_else(|_| "1000".to_string());
    println!("cargo:rustc-env=GATEWAY_DELAY_MS={}", gateway_delay);

    // ログレベル
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    println!("cargo:rustc-env=LOG_LEVEL={}", log_level);

    // ビルド情報を出力
    println!("cargo:warning=ビルド環境: {}", environment);

    tauri_build::build()
}
