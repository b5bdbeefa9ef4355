use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::record::CrawlRecord;

const SEL_ARTICLE_ID: &str = "SELECT id FROM articles WHERE name = ?1";
const INSERT_ARTICLE: &str = "INSERT INTO articles (name, id, expanded) VALUES (?1, ?2, 0)";
const SEL_REDIRECT_ID: &str = "SELECT id FROM redirect_names WHERE name = ?1";
const INSERT_REDIRECT: &str = "INSERT INTO redirect_names (name, id) VALUES (?1, ?2)";
const INSERT_LINK: &str = "INSERT OR IGNORE INTO links (from_id, to_id) VALUES (?1, ?2)";
const INSERT_REDIRECT_EDGE: &str =
    "INSERT OR IGNORE INTO redirects (article_id, redirect_id) VALUES (?1, ?2)";
const MARK_EXPANDED: &str = "UPDATE articles SET expanded = 1 WHERE id = ?1";

/// The crawl-graph store: a SQLite database of articles, link edges and
/// redirect aliases, mirrored by in-memory working sets so membership
/// checks never touch disk.
///
/// Single-writer: all mutating operations take `&mut self` and block until
/// the underlying transaction commits or aborts. Callers that share a
/// store across threads must serialize access themselves.
pub struct GraphStore {
    conn: Connection,
    known: HashSet<String>,
    expanded: HashSet<String>,
    known_redirects: HashSet<String>,
    // Highest IDs ever committed; new allocations continue from here.
    article_seq: i64,
    redirect_seq: i64,
}

impl GraphStore {
    /// Create an empty store at `path`. Fails if a file already exists
    /// there; an existing store is never overwritten.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.is_dir() {
                fs::create_dir_all(dir)?;
                info!("created directory {}", dir.display());
            }
        }

        let conn = Connection::open(path)?;
        Self::apply_pragmas(&conn)?;
        Self::init_schema(&conn)?;

        Ok(GraphStore {
            conn,
            known: HashSet::new(),
            expanded: HashSet::new(),
            known_redirects: HashSet::new(),
            article_seq: 0,
            redirect_seq: 0,
        })
    }

    /// Open an existing store and rebuild the working sets from it.
    /// Opening never creates: a missing file is an error, not an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        Self::apply_pragmas(&conn)?;

        let mut store = GraphStore {
            conn,
            known: HashSet::new(),
            expanded: HashSet::new(),
            known_redirects: HashSet::new(),
            article_seq: 0,
            redirect_seq: 0,
        };
        store.rebuild_working_sets()?;
        Ok(store)
    }

    fn apply_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;
        Ok(())
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE articles (
                name TEXT PRIMARY KEY,
                id INTEGER NOT NULL UNIQUE,
                expanded INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE links (
                from_id INTEGER NOT NULL,
                to_id INTEGER NOT NULL,
                PRIMARY KEY (from_id, to_id),
                FOREIGN KEY(from_id) REFERENCES articles(id),
                FOREIGN KEY(to_id) REFERENCES articles(id)
            ) WITHOUT ROWID;

            CREATE TABLE redirect_names (
                name TEXT PRIMARY KEY,
                id INTEGER NOT NULL UNIQUE
            );

            CREATE TABLE redirects (
                article_id INTEGER NOT NULL,
                redirect_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, redirect_id),
                FOREIGN KEY(article_id) REFERENCES articles(id),
                FOREIGN KEY(redirect_id) REFERENCES redirect_names(id)
            ) WITHOUT ROWID;
            ",
        )?;
        Ok(())
    }

    // Working sets

    /// Full scan of the persisted tables into the three in-memory sets.
    /// A count mismatch between table and set means the store is corrupt
    /// and must not be used.
    fn rebuild_working_sets(&mut self) -> Result<()> {
        self.known.clear();
        self.expanded.clear();
        self.known_redirects.clear();

        {
            let mut stmt = self.conn.prepare("SELECT name, expanded FROM articles")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let name: String = row.get(0)?;
                let expanded: bool = row.get(1)?;
                if expanded {
                    self.expanded.insert(name.clone());
                }
                self.known.insert(name);
            }
        }

        {
            let mut stmt = self.conn.prepare("SELECT name FROM redirect_names")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                self.known_redirects.insert(row.get(0)?);
            }
        }

        let article_rows = self.article_count()?;
        if article_rows != self.known.len() as i64 {
            return Err(StoreError::ConsistencyCheckFailed {
                table: "articles",
                persisted: article_rows,
                cached: self.known.len() as i64,
            });
        }
        let redirect_rows = self.redirect_count()?;
        if redirect_rows != self.known_redirects.len() as i64 {
            return Err(StoreError::ConsistencyCheckFailed {
                table: "redirect_names",
                persisted: redirect_rows,
                cached: self.known_redirects.len() as i64,
            });
        }

        self.article_seq =
            self.conn
                .query_row("SELECT COALESCE(MAX(id), 0) FROM articles", [], |row| {
                    row.get(0)
                })?;
        self.redirect_seq =
            self.conn
                .query_row("SELECT COALESCE(MAX(id), 0) FROM redirect_names", [], |row| {
                    row.get(0)
                })?;

        info!(
            known = self.known.len(),
            expanded = self.expanded.len(),
            redirects = self.known_redirects.len(),
            "working sets rebuilt"
        );
        Ok(())
    }

    // Allocation

    /// Resolve each name to its article ID, allocating dense sequential IDs
    /// for names seen for the first time. Output order matches input order;
    /// duplicate names in one batch resolve to one allocation. The whole
    /// batch commits or none of it does.
    pub fn ensure_article_ids(&mut self, names: &[&str]) -> Result<Vec<i64>> {
        let mut seq = self.article_seq;
        let mut fresh = HashMap::new();

        let tx = self.conn.transaction()?;
        let ids = resolve_article_ids(&tx, &self.known, &mut seq, &mut fresh, names)?;
        tx.commit()?;

        self.article_seq = seq;
        self.known.extend(fresh.into_keys());
        Ok(ids)
    }

    /// Same contract as [`ensure_article_ids`](Self::ensure_article_ids),
    /// over the independent redirect namespace.
    pub fn ensure_redirect_ids(&mut self, names: &[&str]) -> Result<Vec<i64>> {
        let mut seq = self.redirect_seq;
        let mut fresh = HashMap::new();

        let tx = self.conn.transaction()?;
        let ids = resolve_redirect_ids(&tx, &self.known_redirects, &mut seq, &mut fresh, names)?;
        tx.commit()?;

        self.redirect_seq = seq;
        self.known_redirects.extend(fresh.into_keys());
        Ok(ids)
    }

    // Expansion

    /// Record an article's outbound links and redirect targets and flag it
    /// expanded, as one atomic transaction. Expansion is strictly
    /// once-per-article; a repeat attempt fails without writing anything.
    pub fn expand(&mut self, name: &str, links: &[&str], redirects: &[&str]) -> Result<()> {
        if self.expanded.contains(name) {
            return Err(StoreError::AlreadyExpanded(name.to_string()));
        }

        let mut article_seq = self.article_seq;
        let mut redirect_seq = self.redirect_seq;
        let mut fresh_articles = HashMap::new();
        let mut fresh_redirects = HashMap::new();

        let tx = self.conn.transaction()?;
        let id = resolve_article_ids(
            &tx,
            &self.known,
            &mut article_seq,
            &mut fresh_articles,
            &[name],
        )?[0];
        let link_ids = resolve_article_ids(
            &tx,
            &self.known,
            &mut article_seq,
            &mut fresh_articles,
            links,
        )?;
        let redirect_ids = resolve_redirect_ids(
            &tx,
            &self.known_redirects,
            &mut redirect_seq,
            &mut fresh_redirects,
            redirects,
        )?;

        for to_id in &link_ids {
            tx.execute(INSERT_LINK, params![id, to_id])?;
        }
        for redirect_id in &redirect_ids {
            tx.execute(INSERT_REDIRECT_EDGE, params![id, redirect_id])?;
        }
        tx.execute(MARK_EXPANDED, params![id])?;
        tx.commit()?;

        // Caches mutate only after the commit returns; an aborted
        // transaction leaves them untouched.
        self.article_seq = article_seq;
        self.redirect_seq = redirect_seq;
        self.known.extend(fresh_articles.into_keys());
        self.known_redirects.extend(fresh_redirects.into_keys());
        self.expanded.insert(name.to_string());

        debug!(
            article = name,
            links = links.len(),
            redirects = redirects.len(),
            "expanded"
        );
        Ok(())
    }

    /// [`expand`](Self::expand) for a crawler-produced record.
    pub fn expand_record(&mut self, record: &CrawlRecord) -> Result<()> {
        let links: Vec<&str> = record.links.iter().map(String::as_str).collect();
        let redirects: Vec<&str> = record.redirects.iter().map(String::as_str).collect();
        self.expand(&record.name, &links, &redirects)
    }

    // Accessors

    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    pub fn is_expanded(&self, name: &str) -> bool {
        self.expanded.contains(name)
    }

    pub fn is_known_redirect(&self, name: &str) -> bool {
        self.known_redirects.contains(name)
    }

    /// Number of articles whose edges have been recorded.
    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    pub fn article_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn redirect_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM redirect_names", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn link_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn redirect_edge_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM redirects", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn article_id(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(SEL_ARTICLE_ID, params![name], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    pub fn redirect_id(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(SEL_REDIRECT_ID, params![name], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    /// All article names in first-reference order. Scans the persisted
    /// table on every call, so the result observes every commit so far.
    pub fn article_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM articles ORDER BY id")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// `(name, expanded)` pairs for every article, in first-reference order.
    pub fn articles(&self) -> Result<Vec<(String, bool)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, expanded FROM articles ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Known-but-unexpanded articles: the crawler's next work items.
    pub fn frontier(&self) -> Vec<String> {
        let mut names: Vec<String> = self.known.difference(&self.expanded).cloned().collect();
        names.sort();
        names
    }

    /// Names linked from `name`, in allocation order of the targets.
    pub fn out_links(&self, name: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT target.name FROM links
             JOIN articles source ON source.id = links.from_id
             JOIN articles target ON target.id = links.to_id
             WHERE source.name = ?1
             ORDER BY links.to_id",
        )?;
        let names = stmt
            .query_map(params![name], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Redirect aliases declared by `name`, in allocation order.
    pub fn redirects_from(&self, name: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT redirect_names.name FROM redirects
             JOIN articles ON articles.id = redirects.article_id
             JOIN redirect_names ON redirect_names.id = redirects.redirect_id
             WHERE articles.name = ?1
             ORDER BY redirects.redirect_id",
        )?;
        let names = stmt
            .query_map(params![name], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn resolve_article_ids(
    tx: &Transaction<'_>,
    known: &HashSet<String>,
    seq: &mut i64,
    fresh: &mut HashMap<String, i64>,
    names: &[&str],
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(names.len());
    for &name in names {
        let id = if let Some(&id) = fresh.get(name) {
            id
        } else if known.contains(name) {
            tx.query_row(SEL_ARTICLE_ID, params![name], |row| row.get(0))?
        } else {
            let id = *seq + 1;
            tx.execute(INSERT_ARTICLE, params![name, id])
                .map_err(|e| conflict_error(e, name))?;
            *seq = id;
            fresh.insert(name.to_string(), id);
            id
        };
        ids.push(id);
    }
    Ok(ids)
}

fn resolve_redirect_ids(
    tx: &Transaction<'_>,
    known_redirects: &HashSet<String>,
    seq: &mut i64,
    fresh: &mut HashMap<String, i64>,
    names: &[&str],
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(names.len());
    for &name in names {
        let id = if let Some(&id) = fresh.get(name) {
            id
        } else if known_redirects.contains(name) {
            tx.query_row(SEL_REDIRECT_ID, params![name], |row| row.get(0))?
        } else {
            let id = *seq + 1;
            tx.execute(INSERT_REDIRECT, params![name, id])
                .map_err(|e| conflict_error(e, name))?;
            *seq = id;
            fresh.insert(name.to_string(), id);
            id
        };
        ids.push(id);
    }
    Ok(ids)
}

/// An insert that collides where the working set said the name was new
/// means the cache and the table have diverged (the single-writer
/// discipline was violated).
fn conflict_error(err: rusqlite::Error, name: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::AllocationConflict {
                name: name.to_string(),
            }
        }
        other => StoreError::Storage(other),
    }
}
