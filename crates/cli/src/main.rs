//! # arbundle CLI
//!
//! ファイルをバンドルノードへアップロードし、価格・残高を照会する。
//!
//! ## コマンド
//! - `arbundle upload <FILE> [--tag NAME=VALUE]... [--content-type TYPE]`
//! - `arbundle price <BYTES>`
//! - `arbundle balance`
//! - `arbundle address`
//!
//! ## 環境変数
//! - `ARBUNDLE_WALLET_KEY`: 秘密鍵（Base58文字列、JSONバイト配列、またはそのファイルパス）
//! - `ARBUNDLE_NODE_URL` / `ARBUNDLE_CURRENCY` / `ARBUNDLE_GATEWAY_URL` / `ARBUNDLE_MAX_TAGS_BYTES`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use arbundle_client::{BundleUploader, NodeClient, UploaderConfig};
use arbundle_crypto::SolanaSigner;
use arbundle_types::{Tag, CONTENT_TYPE_TAG};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arbundle", version, about = "バンドルノードへのアップロードツール")]
struct Cli {
    /// ウォレットの秘密鍵（Base58文字列、JSONバイト配列、またはそのファイルパス）。
    /// `price` 以外のコマンドで必須
    #[arg(long, env = "ARBUNDLE_WALLET_KEY", hide_env_values = true)]
    key: Option<String>,

    /// バンドルノードのURL（ARBUNDLE_NODE_URLより優先）
    #[arg(long)]
    node_url: Option<String>,

    /// 支払い通貨（ARBUNDLE_CURRENCYより優先）
    #[arg(long)]
    currency: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// ファイルをアップロードする
    Upload {
        /// アップロードするファイル
        file: PathBuf,
        /// 追加のタグ（NAME=VALUE、複数指定可）
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<Tag>,
        /// Content-Type（省略時は拡張子から推定）
        #[arg(long)]
        content_type: Option<String>,
    },
    /// 指定バイト数の保存価格を表示する
    Price {
        /// バイト数
        bytes: u64,
    },
    /// ウォレットの残高を表示する
    Balance,
    /// ウォレットのアドレスを表示する
    Address,
}

/// `NAME=VALUE` 形式のタグをパースする。
fn parse_tag(s: &str) -> Result<Tag, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("タグは NAME=VALUE 形式で指定してください: {s}"))?;
    if name.is_empty() {
        return Err(format!("タグ名が空です: {s}"));
    }
    Ok(Tag::new(name, value))
}

/// 署名鍵が必要なコマンドで、指定された秘密鍵から署名者を作る。
fn require_signer(key: Option<&str>) -> anyhow::Result<SolanaSigner> {
    let key = key.context("秘密鍵が指定されていません（--key または ARBUNDLE_WALLET_KEY）")?;
    load_signer(key)
}

/// 署名者付きのアップロードクライアントを作る。
fn signed_uploader(config: UploaderConfig, key: Option<&str>) -> anyhow::Result<BundleUploader> {
    let signer = Arc::new(require_signer(key)?);
    tracing::debug!(address = %signer.address(), "署名鍵を読み込みました");
    Ok(BundleUploader::new(config, signer))
}

/// 秘密鍵を読み込む。ファイルパスの場合はその内容を使う。
fn load_signer(key: &str) -> anyhow::Result<SolanaSigner> {
    let key = key.trim();
    let material = if key.starts_with('[') {
        key.to_string()
    } else {
        match std::fs::read_to_string(key) {
            Ok(contents) => contents.trim().to_string(),
            Err(_) => key.to_string(),
        }
    };

    let signer = if material.starts_with('[') {
        SolanaSigner::from_json_array(&material).context("JSONバイト配列の秘密鍵を読み込めません")?
    } else {
        SolanaSigner::from_base58(&material).context("Base58の秘密鍵を読み込めません")?
    };
    Ok(signer)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = UploaderConfig::from_env()?;
    if let Some(node_url) = cli.node_url {
        config.node_url = node_url;
    }
    if let Some(currency) = cli.currency {
        config.currency = currency;
    }

    tracing::debug!(node_url = %config.node_url, currency = %config.currency, "設定を読み込みました");

    match cli.command {
        Command::Price { bytes } => {
            let node = NodeClient::new(config);
            let price = node.get_price(bytes).await?;
            println!(
                "{}",
                serde_json::json!({
                    "bytes": bytes,
                    "currency": node.config().currency,
                    "price": price.to_string(),
                })
            );
        }
        Command::Upload {
            file,
            mut tags,
            content_type,
        } => {
            let uploader = signed_uploader(config, cli.key.as_deref())?;
            let payload = std::fs::read(&file)
                .with_context(|| format!("ファイルを読み込めません: {}", file.display()))?;
            if let Some(content_type) = content_type {
                tags.retain(|t| !t.name.eq_ignore_ascii_case(CONTENT_TYPE_TAG));
                tags.push(Tag::new(CONTENT_TYPE_TAG, content_type));
            }
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let result = uploader.upload(&payload, tags, &file_name).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Balance => {
            let uploader = signed_uploader(config, cli.key.as_deref())?;
            let balance = uploader.get_balance().await?;
            println!(
                "{}",
                serde_json::json!({
                    "address": uploader.address(),
                    "currency": uploader.config().currency,
                    "balance": balance.to_string(),
                })
            );
        }
        Command::Address => {
            println!("{}", require_signer(cli.key.as_deref())?.address());
        }
    }

    Ok(())
}
