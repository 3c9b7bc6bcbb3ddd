//! SQLite-backed ledgers.
//!
//! Both tables live in one database file. Every query runs on tokio's
//! blocking pool against a single shared connection; atomicity of binding
//! and permit creation comes from the SQL statements themselves, never from
//! a read followed by a write.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{PermitLookup, SerialNumberLedger, TemporaryPermitLedger};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quickcert_types::{
    CertificateRecord, Clock, DeviceKey, PermitDuration, SerialNumber, SystemClock,
    TemporaryPermit,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS certs (
        sn TEXT PRIMARY KEY NOT NULL,
        key TEXT,
        note TEXT
    );

    CREATE TABLE IF NOT EXISTS temporary_permits (
        key TEXT PRIMARY KEY NOT NULL,
        expiration INTEGER NOT NULL
    );
";

/// Serial number and temporary permit ledger stored in SQLite.
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Option<Connection>>>,
    permit_duration: PermitDuration,
    clock: Arc<dyn Clock>,
}

impl SqliteLedger {
    /// Opens (or creates) the ledger database at `path`.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened ledger database");
        Self::from_connection(conn)
    }

    /// Opens an in-memory ledger (for testing).
    pub fn open_in_memory() -> LedgerResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> LedgerResult<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!("Ledger schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            permit_duration: PermitDuration::default(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Sets the length of newly created trial permits.
    #[must_use]
    pub fn with_permit_duration(mut self, duration: PermitDuration) -> Self {
        self.permit_duration = duration;
        self
    }

    /// Replaces the clock used for permit expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn permit_duration(&self) -> PermitDuration {
        self.permit_duration
    }

    /// Closes the connection. Every later call fails with `NotConnected`.
    pub fn disconnect(&self) -> LedgerResult<()> {
        let mut guard = self.conn.lock().map_err(|_| LedgerError::NotConnected)?;
        match guard.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| LedgerError::Database(e))?;
                info!("Closed ledger database");
                Ok(())
            }
            None => Err(LedgerError::NotConnected),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    async fn with_conn<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut Connection) -> LedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| LedgerError::NotConnected)?;
            let conn = guard.as_mut().ok_or(LedgerError::NotConnected)?;
            f(conn)
        })
        .await
        .map_err(|e| LedgerError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for SqliteLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedger")
            .field("connected", &self.is_connected())
            .field("permit_duration", &self.permit_duration)
            .finish_non_exhaustive()
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn parse_serial(raw: String) -> LedgerResult<SerialNumber> {
    SerialNumber::new(raw).map_err(|e| LedgerError::InvalidData(e.to_string()))
}

fn parse_key(raw: &str) -> LedgerResult<DeviceKey> {
    DeviceKey::parse(raw).map_err(|e| LedgerError::InvalidData(e.to_string()))
}

#[async_trait]
impl SerialNumberLedger for SqliteLedger {
    async fn provision(&self, serial: &SerialNumber) -> LedgerResult<()> {
        let sn = serial.as_str().to_owned();
        self.with_conn(move |conn| {
            match conn.execute(
                "INSERT INTO certs (sn, key, note) VALUES (?1, NULL, NULL)",
                params![sn],
            ) {
                Ok(_) => Ok(()),
                Err(e) if is_constraint_violation(&e) => Err(LedgerError::AlreadyExists(sn)),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn provision_many(&self, serials: &[SerialNumber]) -> LedgerResult<()> {
        let sns: Vec<String> = serials.iter().map(|s| s.as_str().to_owned()).collect();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare("INSERT INTO certs (sn, key, note) VALUES (?1, NULL, NULL)")?;
                for sn in &sns {
                    match stmt.execute(params![sn]) {
                        Ok(_) => {}
                        // Dropping the transaction rolls back the rows inserted so far.
                        Err(e) if is_constraint_violation(&e) => return Err(LedgerError::SomeAlreadyExist),
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn bind(&self, serial: &SerialNumber, key: &DeviceKey) -> LedgerResult<()> {
        let sn = serial.as_str().to_owned();
        let key = key.as_str().to_owned();
        self.with_conn(move |conn| {
            let affected = conn.execute(
                "UPDATE certs SET key = ?1 WHERE sn = ?2 AND (key IS NULL OR key = ?1)",
                params![key, sn],
            )?;
            if affected == 0 {
                return Err(LedgerError::NotFoundOrAlreadyBound);
            }
            Ok(())
        })
        .await
    }

    async fn exists(&self, serial: &SerialNumber) -> LedgerResult<bool> {
        let sn = serial.as_str().to_owned();
        self.with_conn(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM certs WHERE sn = ?1)",
                params![sn],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn update_note(&self, serial: &SerialNumber, note: &str) -> LedgerResult<()> {
        let sn = serial.as_str().to_owned();
        let note = note.to_owned();
        self.with_conn(move |conn| {
            let affected = conn.execute("UPDATE certs SET note = ?1 WHERE sn = ?2", params![note, sn])?;
            if affected == 0 {
                return Err(LedgerError::NotFound(sn));
            }
            Ok(())
        })
        .await
    }

    async fn list_all(&self) -> LedgerResult<Vec<CertificateRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT sn, key, note FROM certs ORDER BY rowid")?;
            let rows = stmt.query_map([], |row| {
                let sn: String = row.get(0)?;
                let key: Option<String> = row.get(1)?;
                let note: Option<String> = row.get(2)?;
                Ok((sn, key, note))
            })?;

            let mut records = Vec::new();
            for row in rows {
                let (sn, key, note) = row?;
                records.push(CertificateRecord {
                    serial_number: parse_serial(sn)?,
                    key: key.as_deref().map(parse_key).transpose()?,
                    note,
                });
            }
            Ok(records)
        })
        .await
    }

    async fn list_unbound(&self) -> LedgerResult<Vec<SerialNumber>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT sn FROM certs WHERE key IS NULL ORDER BY rowid")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut serials = Vec::new();
            for row in rows {
                serials.push(parse_serial(row?)?);
            }
            Ok(serials)
        })
        .await
    }
}

#[async_trait]
impl TemporaryPermitLedger for SqliteLedger {
    async fn get_remaining(&self, key: &DeviceKey) -> LedgerResult<PermitLookup> {
        let now = self.clock.now();
        Ok(match self.find(key).await? {
            Some(permit) => PermitLookup::Remaining(permit.remaining_secs(now)),
            None => PermitLookup::AllowNewPermit,
        })
    }

    async fn create(&self, key: &DeviceKey) -> LedgerResult<i64> {
        let now = self.clock.now();
        let expiration = now + self.permit_duration.as_chrono();
        let key = key.as_str().to_owned();
        self.with_conn(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO temporary_permits (key, expiration) VALUES (?1, ?2)",
                params![key, expiration.timestamp()],
            )?;
            if inserted == 0 {
                return Err(LedgerError::PermitExists);
            }
            Ok(expiration.timestamp() - now.timestamp())
        })
        .await
    }

    async fn find(&self, key: &DeviceKey) -> LedgerResult<Option<TemporaryPermit>> {
        let raw_key = key.as_str().to_owned();
        let key = key.clone();
        self.with_conn(move |conn| {
            let expiration: Option<i64> = conn
                .query_row(
                    "SELECT expiration FROM temporary_permits WHERE key = ?1",
                    params![raw_key],
                    |row| row.get(0),
                )
                .optional()?;
            expiration
                .map(|secs| {
                    DateTime::<Utc>::from_timestamp(secs, 0)
                        .map(|expiration| TemporaryPermit { key, expiration })
                        .ok_or_else(|| LedgerError::InvalidData(format!("expiration out of range: {secs}")))
                })
                .transpose()
        })
        .await
    }
}
