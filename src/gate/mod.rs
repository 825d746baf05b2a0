use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Hard-coded issuance cap per client key.
pub const ISSUE_CAP: u32 = 2;

const GENERIC_KEY: &str = "generic";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuanceRecord {
    pub count: u32,
    pub last_generated: Option<DateTime<Utc>>,
}

pub fn remaining(count: u32) -> u32 {
    ISSUE_CAP.saturating_sub(count)
}

pub fn is_blocked(count: u32) -> bool {
    count >= ISSUE_CAP
}

/// Best-effort client key: first hop of X-Forwarded-For, else the socket peer
/// address, else a shared generic key. Trivially spoofable; the cap is
/// advisory, not a security boundary.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(addr) => addr.to_string(),
        None => match peer {
            Some(p) => p.ip().to_string(),
            None => GENERIC_KEY.to_string(),
        },
    }
}

/// Printed on the certificate footer, date-prefixed for readability.
pub fn generate_certificate_no() -> String {
    format!(
        "{}_{}",
        Utc::now().format("%Y%m%d"),
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

fn stats_file_name(key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("cert_stats_{}.json", safe)
}

/// One JSON file per client key under the data folder. A process-wide mutex
/// serializes the read-modify-write; concurrent processes still race.
#[derive(Clone)]
pub struct StatsStore {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl StatsStore {
    pub fn new(dir: &PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.clone(),
            lock: Arc::new(Mutex::new(())),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(stats_file_name(key))
    }

    pub async fn load(&self, key: &str) -> IssuanceRecord {
        let _guard = self.lock.lock().await;
        self.read_record(key)
    }

    /// Increments after a successful delivery. Never decrements.
    pub async fn record_issue(&self, key: &str) -> std::io::Result<IssuanceRecord> {
        let _guard = self.lock.lock().await;
        let mut record = self.read_record(key);
        record.count += 1;
        record.last_generated = Some(Utc::now());
        let json = serde_json::to_vec_pretty(&record)?;
        std::fs::write(self.path_for(key), json)?;
        Ok(record)
    }

    fn read_record(&self, key: &str) -> IssuanceRecord {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Corrupt stats file {:?}: {}", path, e);
                IssuanceRecord::default()
            }),
            Err(_) => IssuanceRecord::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_and_blocked_mapping() {
        assert_eq!(remaining(0), 2);
        assert_eq!(remaining(1), 1);
        assert_eq!(remaining(2), 0);
        assert_eq!(remaining(3), 0);
        assert!(!is_blocked(0));
        assert!(!is_blocked(1));
        assert!(is_blocked(2));
        assert!(is_blocked(3));
    }

    #[test]
    fn client_key_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let peer: SocketAddr = "192.0.2.1:443".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
        assert_eq!(client_key(&HeaderMap::new(), Some(peer)), "192.0.2.1");
        assert_eq!(client_key(&HeaderMap::new(), None), "generic");
    }

    #[test]
    fn certificate_no_has_date_prefix() {
        let no = generate_certificate_no();
        let (date, tail) = no.split_once('_').unwrap();
        assert_eq!(date.len(), 8);
        assert!(date.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(tail.len(), 8);
    }

    #[test]
    fn stats_file_name_is_fs_safe() {
        assert_eq!(
            stats_file_name("203.0.113.7"),
            "cert_stats_203_0_113_7.json"
        );
        assert_eq!(stats_file_name("generic"), "cert_stats_generic.json");
    }

    #[tokio::test]
    async fn record_issue_increments_by_one() {
        let dir = std::env::temp_dir().join(format!("belgem_stats_{}", uuid::Uuid::new_v4()));
        let store = StatsStore::new(&dir).unwrap();

        assert_eq!(store.load("generic").await.count, 0);
        let rec = store.record_issue("generic").await.unwrap();
        assert_eq!(rec.count, 1);
        assert!(rec.last_generated.is_some());
        let rec = store.record_issue("generic").await.unwrap();
        assert_eq!(rec.count, 2);
        assert!(is_blocked(store.load("generic").await.count));

        std::fs::remove_dir_all(&dir).ok();
    }
}
