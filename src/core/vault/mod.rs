use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::Mac;
use rusqlite::{Connection, OptionalExtension};
use sha2::Sha256;
use std::sync::Arc;
use tokio::sync::Mutex;

type HmacSha256 = hmac::Hmac<Sha256>;

const NONCE_LEN: usize = 12;

/// Machine-bound encrypted key/value store living next to the articles table.
pub struct CredentialVault {
    db: Arc<Mutex<Connection>>,
    cipher: Aes256Gcm,
}

/// HMAC-SHA256(hostname + username) under a fixed label: stable across restarts,
/// useless on another machine or account.
fn machine_key() -> Result<[u8; 32]> {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string());
    let username = whoami::username();

    let mut mac = <HmacSha256 as Mac>::new_from_slice(b"autoblog-credentials-v1")
        .map_err(|e| anyhow!("vault key derivation failed: {}", e))?;
    mac.update(hostname.as_bytes());
    mac.update(username.as_bytes());

    let mut key = [0u8; 32];
    key.copy_from_slice(&mac.finalize().into_bytes());
    Ok(key)
}

impl CredentialVault {
    pub async fn open(db: Arc<Mutex<Connection>>) -> Result<Self> {
        let key = machine_key()?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| anyhow!("vault cipher init failed: {}", e))?;

        db.lock().await.execute(
            "CREATE TABLE IF NOT EXISTS credentials (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(Self { db, cipher })
    }

    /// base64(nonce || ciphertext)
    fn seal(&self, plaintext: &str) -> Result<String> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    fn open_sealed(&self, encoded: &str) -> Result<String> {
        let sealed = BASE64
            .decode(encoded)
            .map_err(|e| anyhow!("Base64 decode failed: {}", e))?;
        if sealed.len() <= NONCE_LEN {
            return Err(anyhow!("Encrypted value too short"));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| anyhow!("Decryption failed; was the vault written on another machine?"))?;
        Ok(String::from_utf8(plaintext)?)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let sealed = self.seal(value)?;
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO credentials (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            (key, &sealed),
        )?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let stored: Option<String> = {
            let db = self.db.lock().await;
            db.query_row(
                "SELECT value FROM credentials WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?
        };
        stored.map(|s| self.open_sealed(&s)).transpose()
    }

    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare("SELECT key FROM credentials ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let removed = db.execute("DELETE FROM credentials WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }
}
