use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder};
use std::collections::HashSet;
use std::fs;
use tracing::debug;

use crate::config::DbConfig;
use crate::error::Error;

/// Unique UUID values known to the database, used as filename stems on disk.
pub type IdentifierSet = HashSet<String>;

/// A record in the release-proof category that may need its archive
/// content scanned.
#[derive(Debug, Clone)]
pub struct ProofRecord {
    pub id: u64,
    pub uuid: String,
    pub deleted_at: Option<String>,
    pub created_at: Option<String>,
    pub filename: Option<String>,
    pub zip_content: Option<String>,
    pub platform: Option<String>,
}

impl ProofRecord {
    /// A new submission is soft-hidden at creation time, so its deletion
    /// timestamp equals its creation timestamp.
    pub fn is_new(&self) -> bool {
        match (&self.deleted_at, &self.created_at) {
            (Some(deleted), Some(created)) => deleted == created,
            _ => false,
        }
    }

    pub fn needs_content_scan(&self) -> bool {
        self.zip_content
            .as_deref()
            .map_or(true, |content| content.is_empty())
    }
}

/// Return the database password stored in the configured password file,
/// falling back to the configured password when the file is unreadable.
pub fn resolve_password(config: &DbConfig) -> String {
    match fs::read_to_string(&config.password_file) {
        Ok(password) => password.trim().to_string(),
        Err(_) => config.password.clone(),
    }
}

/// Open a short-lived connection to the database. A connection failure is a
/// precondition failure for every other operation; the caller treats it as
/// fatal.
pub fn connect(config: &DbConfig) -> Result<Conn, Error> {
    let opts = OptsBuilder::new()
        .ip_or_hostname(Some(config.host.clone()))
        .tcp_port(config.port)
        .user(Some(config.user.clone()))
        .pass(Some(resolve_password(config)))
        .db_name(Some(config.name.clone()));
    let conn = Conn::new(opts)?;
    debug!("connected to database '{}' on {}", config.name, config.host);
    Ok(conn)
}

/// Stream every `(id, uuid)` pair from the files table into an identifier
/// set. Returns the raw row count read alongside the set; duplicates
/// collapse so the two are not asserted equal.
pub fn fetch_identifiers(conn: &mut Conn) -> Result<(usize, IdentifierSet), Error> {
    let rows: Vec<(u64, String)> = conn.query("SELECT `id`, `uuid` FROM `files`")?;
    Ok(build_identifier_set(rows.into_iter().map(|(_, uuid)| uuid)))
}

pub fn build_identifier_set<I>(uuids: I) -> (usize, IdentifierSet)
where
    I: IntoIterator<Item = String>,
{
    let mut set = IdentifierSet::new();
    let mut rows = 0;
    for uuid in uuids {
        set.insert(uuid);
        rows += 1;
    }
    (rows, set)
}

/// Fetch every record in the release-proof category. Timestamps are read as
/// text; the comparison in [`ProofRecord::is_new`] is string equality.
pub fn fetch_proof_records(conn: &mut Conn) -> Result<Vec<ProofRecord>, Error> {
    let query = "SELECT `id`, `uuid`, CAST(`deletedat` AS CHAR), \
                 CAST(`createdat` AS CHAR), `filename`, `file_zip_content`, `platform` \
                 FROM `files` WHERE `section` = 'releaseproof'";
    let records = conn.query_map(
        query,
        |(id, uuid, deleted_at, created_at, filename, zip_content, platform): (
            u64,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
        )| ProofRecord {
            id,
            uuid,
            deleted_at,
            created_at,
            filename,
            zip_content,
            platform,
        },
    )?;
    debug!("fetched {} release-proof records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_build_identifier_set_collapses_duplicates() {
        let uuids = vec![
            "aaaa".to_string(),
            "bbbb".to_string(),
            "aaaa".to_string(),
        ];
        let (rows, set) = build_identifier_set(uuids);
        assert_eq!(rows, 3);
        assert_eq!(set.len(), 2);
        assert!(set.contains("aaaa"));
        assert!(set.contains("bbbb"));
    }

    #[test]
    fn test_build_identifier_set_empty() {
        let (rows, set) = build_identifier_set(Vec::new());
        assert_eq!(rows, 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_resolve_password_fallback() {
        let config = DbConfig {
            password_file: "/nonexistent/password.txt".to_string(),
            ..DbConfig::default()
        };
        assert_eq!(resolve_password(&config), "password");
    }

    #[test]
    fn test_resolve_password_empty_path_falls_back() {
        let config = DbConfig::default();
        assert_eq!(resolve_password(&config), "password");
    }

    #[test]
    fn test_resolve_password_from_file_trims_whitespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  s3cret  ").unwrap();
        let config = DbConfig {
            password_file: file.path().to_string_lossy().into_owned(),
            ..DbConfig::default()
        };
        assert_eq!(resolve_password(&config), "s3cret");
    }

    fn record(deleted: Option<&str>, created: Option<&str>, zip: Option<&str>) -> ProofRecord {
        ProofRecord {
            id: 1,
            uuid: "ea9ba9bb-2c0c-40a4-8de6-cf6b8bcf44fa".to_string(),
            deleted_at: deleted.map(String::from),
            created_at: created.map(String::from),
            filename: None,
            zip_content: zip.map(String::from),
            platform: None,
        }
    }

    #[test]
    fn test_proof_record_is_new() {
        assert!(record(Some("2020-01-01"), Some("2020-01-01"), None).is_new());
        assert!(!record(Some("2020-01-02"), Some("2020-01-01"), None).is_new());
        assert!(!record(None, Some("2020-01-01"), None).is_new());
        assert!(!record(None, None, None).is_new());
    }

    #[test]
    fn test_proof_record_needs_content_scan() {
        assert!(record(None, None, None).needs_content_scan());
        assert!(record(None, None, Some("")).needs_content_scan());
        assert!(!record(None, None, Some("FILE.NFO")).needs_content_scan());
    }
}
