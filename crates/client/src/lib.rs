//! # arbundle Client
//!
//! データアイテムを構築・署名し、バンドルノードへアップロードするクライアント。
//!
//! ## 役割
//! - ペイロードとタグから署名済みデータアイテムを作る
//! - `POST /tx/{currency}` で生バイト列を送信する
//! - レシート（またはノードID、ローカルID）からトランザクションIDを解決する
//! - ゲートウェイURIを生成する
//! - 保存価格と残高を照会する

pub mod config;
pub mod content_type;
pub mod error;
pub mod node;
pub mod receipt;
pub mod transport;
pub mod uploader;

#[cfg(test)]
mod test_helpers;

pub use config::{gateway_uri_builder, GatewayUriBuilder, UploaderConfig};
pub use error::UploadError;
pub use node::NodeClient;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
pub use uploader::BundleUploader;
