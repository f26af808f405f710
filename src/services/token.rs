use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// トークンのランダムバイト数（256ビット）
const TOKEN_BYTES: usize = 32;

/// リセットトークン（平文）を生成
///
/// CSPRNG から32バイトを取得してURLセーフなBase64でエンコードする。
/// エントロピー源の失敗はプロセスレベルの異常としてpanicする
/// （リクエスト単位でのリカバリー対象ではない）。
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// トークンの保存用フィンガープリントを導出
///
/// SHA256の小文字hex。決定的かつ一方向なので、DBにはこの値だけを
/// 保存すればDB読み取りだけでは有効なリンクを偽造できない。
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length() {
        // 32バイトのURLセーフBase64（パディングなし）は43文字
        let token = generate();
        assert_eq!(token.len(), 43);
    }

    #[test]
    fn test_generate_url_safe() {
        let token = generate();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_unique() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let token = generate();
        assert_eq!(fingerprint(&token), fingerprint(&token));
    }

    #[test]
    fn test_fingerprint_known_vector() {
        // SHA256("abc") の既知のダイジェスト
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_differs_per_token() {
        assert_ne!(fingerprint("token-a"), fingerprint("token-b"));
    }
}
