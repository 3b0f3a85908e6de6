//! # レシートからのトランザクションID解決
//!
//! 2xxレスポンスのボディからトランザクションIDを決める。失敗はしない。
//!
//! 1. `id`・`public`・`signature` が揃ったJSONレシート
//! 2. JSONの `id` フィールド
//! 3. JSONの `data.id` フィールド
//! 4. プレーンテキストのID（43文字のBase64-URLのみ）
//! 5. ローカルで計算したデータアイテムID

use arbundle_types::UploadReceipt;

/// Base64-URLエンコードされた32バイトIDの長さ
const ENCODED_ID_LENGTH: usize = 43;

/// IDの出所
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// 完全なレシート
    Receipt,
    /// JSONの `id`
    NodeId,
    /// JSONの `data.id`
    NestedDataId,
    /// プレーンテキストのボディ
    PlainText,
    /// ローカルで計算したID
    Local,
}

/// 解決結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    /// トランザクションID
    pub transaction_id: String,
    /// 完全なレシート（ある場合のみ）
    pub receipt: Option<UploadReceipt>,
    /// IDの出所
    pub source: IdSource,
}

impl ResolvedId {
    fn new(transaction_id: impl Into<String>, source: IdSource) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            receipt: None,
            source,
        }
    }
}

/// データアイテムIDとして妥当な文字列か（43文字のBase64-URL）。
pub fn is_plausible_id(s: &str) -> bool {
    s.len() == ENCODED_ID_LENGTH
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// レスポンスボディからトランザクションIDを解決する。
pub fn resolve_transaction_id(body: &[u8], local_id: &str) -> ResolvedId {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(text)) if is_plausible_id(text.trim()) => {
            ResolvedId::new(text.trim(), IdSource::PlainText)
        }
        Ok(value @ serde_json::Value::Object(_)) => {
            if let Ok(receipt) = serde_json::from_value::<UploadReceipt>(value.clone()) {
                if receipt.is_complete() {
                    let transaction_id = receipt.id.clone().unwrap_or_default();
                    return ResolvedId {
                        transaction_id,
                        receipt: Some(receipt),
                        source: IdSource::Receipt,
                    };
                }
            }
            if let Some(id) = non_empty_str(value.get("id")) {
                return ResolvedId::new(id, IdSource::NodeId);
            }
            if let Some(id) = non_empty_str(value.get("data").and_then(|d| d.get("id"))) {
                return ResolvedId::new(id, IdSource::NestedDataId);
            }
            ResolvedId::new(local_id, IdSource::Local)
        }
        Ok(_) => ResolvedId::new(local_id, IdSource::Local),
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            if is_plausible_id(text) {
                ResolvedId::new(text, IdSource::PlainText)
            } else {
                ResolvedId::new(local_id, IdSource::Local)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: &str = "local-id";
    const VALID_ID: &str = "Zm9vYmFyYmF6cXV4cXV1eGNvcmdlZ3JhdWx0Z2FycGx";

    #[test]
    fn test_plausible_id() {
        assert_eq!(VALID_ID.len(), 43);
        assert!(is_plausible_id(VALID_ID));
        assert!(!is_plausible_id("abc123"));
        assert!(!is_plausible_id(&format!("{}=", &VALID_ID[..42])));
        assert!(!is_plausible_id("Internal Server Error: something went wrong"));
    }

    /// 完全なレシートはそのIDとレシート本体を返すことを確認
    #[test]
    fn test_full_receipt() {
        let body = serde_json::json!({
            "id": "receipt-id",
            "public": "node-key",
            "signature": "sig",
            "deadlineHeight": 100,
            "timestamp": 1_700_000_000_000u64,
            "version": "1.0.0",
            "validatorSignatures": []
        });
        let resolved = resolve_transaction_id(&serde_json::to_vec(&body).unwrap(), LOCAL);
        assert_eq!(resolved.transaction_id, "receipt-id");
        assert_eq!(resolved.source, IdSource::Receipt);
        let receipt = resolved.receipt.unwrap();
        assert_eq!(receipt.deadline_height, Some(100));
    }

    /// `{"id":"abc123"}` はノードIDとして解決されることを確認
    #[test]
    fn test_bare_id() {
        let resolved = resolve_transaction_id(br#"{"id":"abc123"}"#, LOCAL);
        assert_eq!(resolved.transaction_id, "abc123");
        assert_eq!(resolved.source, IdSource::NodeId);
        assert!(resolved.receipt.is_none());
    }

    /// `data.id` の入れ子形式を確認
    #[test]
    fn test_nested_data_id() {
        let resolved = resolve_transaction_id(br#"{"data":{"id":"nested"}}"#, LOCAL);
        assert_eq!(resolved.transaction_id, "nested");
        assert_eq!(resolved.source, IdSource::NestedDataId);
    }

    /// フィールドが無い・型が違う場合はローカルIDに落ちることを確認
    #[test]
    fn test_fallback_to_local() {
        let bodies: [&[u8]; 7] = [
            b"{}",
            br#"{"id":""}"#,
            br#"{"id":42}"#,
            b"[1,2,3]",
            b"",
            b"OK",
            b"<html>Bad Gateway</html>",
        ];
        for body in bodies {
            let resolved = resolve_transaction_id(body, LOCAL);
            assert_eq!(resolved.transaction_id, LOCAL, "body: {body:?}");
            assert_eq!(resolved.source, IdSource::Local);
        }
    }

    /// 妥当な形式のプレーンテキスト（JSON文字列を含む）はIDとして受け付けることを確認
    #[test]
    fn test_plain_text_id() {
        let resolved = resolve_transaction_id(format!("{VALID_ID}\n").as_bytes(), LOCAL);
        assert_eq!(resolved.transaction_id, VALID_ID);
        assert_eq!(resolved.source, IdSource::PlainText);

        let quoted = format!("\"{VALID_ID}\"");
        let resolved = resolve_transaction_id(quoted.as_bytes(), LOCAL);
        assert_eq!(resolved.transaction_id, VALID_ID);
    }
}
