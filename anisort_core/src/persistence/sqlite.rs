//! SQLite repository
//!
//! Timestamps are stored as Unix milliseconds. Multi-valued metadata fields are
//! stored joined with the protocol list separator.

use super::{
    FileAction, FileActionKind, FileStatus, LocalFile, NewFileAction, Repository, ensure_paired,
};
use crate::error::{ConcurrencyError, InternalError, IoError};
use crate::metadata::{AnimeMetadata, EpisodeMetadata, FileLookup, FileMetadata, GroupMetadata};
use crate::protocol::codec::LIST_SEPARATOR;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS local_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    hash TEXT,
    size INTEGER,
    status TEXT NOT NULL,
    remote_file_id INTEGER,
    version INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_local_files_hash ON local_files(hash);

CREATE TABLE IF NOT EXISTS file_actions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    local_file_id INTEGER NOT NULL REFERENCES local_files(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    success INTEGER NOT NULL,
    info TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_file_actions_file ON file_actions(local_file_id, created_at);

CREATE TABLE IF NOT EXISTS anime (
    aid INTEGER PRIMARY KEY,
    romaji_name TEXT,
    kanji_name TEXT,
    english_name TEXT,
    year TEXT,
    kind TEXT,
    episode_count INTEGER
);

CREATE TABLE IF NOT EXISTS episodes (
    eid INTEGER PRIMARY KEY,
    aid INTEGER NOT NULL,
    number TEXT,
    english_name TEXT,
    romaji_name TEXT,
    kanji_name TEXT
);

CREATE TABLE IF NOT EXISTS release_groups (
    gid INTEGER PRIMARY KEY,
    name TEXT,
    short_name TEXT
);

CREATE TABLE IF NOT EXISTS remote_files (
    fid INTEGER PRIMARY KEY,
    aid INTEGER,
    eid INTEGER,
    gid INTEGER,
    state INTEGER,
    size INTEGER,
    ed2k TEXT,
    crc32 TEXT,
    quality TEXT,
    source TEXT,
    audio_codecs TEXT NOT NULL DEFAULT '',
    video_codec TEXT,
    video_resolution TEXT,
    file_type TEXT,
    dub_languages TEXT NOT NULL DEFAULT '',
    sub_languages TEXT NOT NULL DEFAULT '',
    length_seconds INTEGER,
    anidb_filename TEXT
);
"#;

const LOCAL_FILE_COLUMNS: &str =
    "id, path, hash, size, status, remote_file_id, version, created_at, updated_at";

/// Repository backed by a SQLite database file
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open or create the database at `db_path` and bring the schema up to date
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Io(IoError::from_std(e).with_path(db_path)))?;
        }

        let connect_options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(connect_options)
            .await
            .map_err(|e| InternalError::persistence(format!("Failed to open database: {e}")))?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let repository = Self { pool };
        repository.migrate().await?;
        Ok(repository)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        let version = self.schema_version().await?;
        if version >= CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        debug!("Migrating database schema from v{version} to v{CURRENT_SCHEMA_VERSION}");
        let mut tx = self.pool.begin().await?;
        sqlx::raw_sql(SCHEMA_V1)
            .execute(&mut *tx)
            .await
            .map_err(|e| InternalError::persistence(format!("Failed to apply migration 1: {e}")))?;
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(CURRENT_SCHEMA_VERSION)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Highest applied migration, 0 for a fresh database
    pub async fn schema_version(&self) -> Result<i64> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
        )
        .fetch_one(&self.pool)
        .await?;
        if exists == 0 {
            return Ok(0);
        }

        let version = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version.unwrap_or(0))
    }

    async fn local_file_by_path(&self, path: &str) -> Result<Option<LocalFile>> {
        let row = sqlx::query(&format!(
            "SELECT {LOCAL_FILE_COLUMNS} FROM local_files WHERE path = ?"
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(local_file_from_row).transpose()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_or_create_local_file(&self, path: &Path) -> Result<LocalFile> {
        let path_str = path.to_string_lossy();
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO local_files (path, status, version, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?)
            ON CONFLICT(path) DO NOTHING
            "#,
        )
        .bind(path_str.as_ref())
        .bind(FileStatus::NotYetImported.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.local_file_by_path(&path_str)
            .await?
            .ok_or_else(|| InternalError::persistence("inserted local file is missing").into())
    }

    async fn find_local_file(&self, path: &Path) -> Result<Option<LocalFile>> {
        self.local_file_by_path(&path.to_string_lossy()).await
    }

    async fn update_local_file(&self, file: &LocalFile) -> Result<LocalFile> {
        let mut conn = self.pool.acquire().await?;
        update_file_row(&mut conn, file).await
    }

    async fn file_actions(&self, local_file_id: i64) -> Result<Vec<FileAction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, local_file_id, kind, success, info, created_at
            FROM file_actions
            WHERE local_file_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(local_file_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(file_action_from_row).collect()
    }

    async fn append_file_action(&self, action: NewFileAction) -> Result<FileAction> {
        let mut conn = self.pool.acquire().await?;
        insert_action_row(&mut conn, action).await
    }

    async fn commit_file_change(
        &self,
        file: &LocalFile,
        action: NewFileAction,
    ) -> Result<(LocalFile, FileAction)> {
        ensure_paired(file, &action)?;
        let mut tx = self.pool.begin().await?;
        let updated = update_file_row(&mut tx, file).await?;
        let action = insert_action_row(&mut tx, action).await?;
        tx.commit().await?;
        Ok((updated, action))
    }

    async fn upsert_lookup(&self, lookup: &FileLookup) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(anime) = &lookup.anime {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO anime
                    (aid, romaji_name, kanji_name, english_name, year, kind, episode_count)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(i64::from(anime.aid))
            .bind(anime.romaji_name.as_deref())
            .bind(anime.kanji_name.as_deref())
            .bind(anime.english_name.as_deref())
            .bind(anime.year.as_deref())
            .bind(anime.kind.as_deref())
            .bind(anime.episode_count.map(i64::from))
            .execute(&mut *tx)
            .await?;
        }

        if let Some(episode) = &lookup.episode {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO episodes
                    (eid, aid, number, english_name, romaji_name, kanji_name)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(i64::from(episode.eid))
            .bind(i64::from(episode.aid))
            .bind(episode.number.as_deref())
            .bind(episode.english_name.as_deref())
            .bind(episode.romaji_name.as_deref())
            .bind(episode.kanji_name.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        if let Some(group) = &lookup.group {
            sqlx::query(
                "INSERT OR REPLACE INTO release_groups (gid, name, short_name) VALUES (?, ?, ?)",
            )
            .bind(i64::from(group.gid))
            .bind(group.name.as_deref())
            .bind(group.short_name.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        let file = &lookup.file;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO remote_files
                (fid, aid, eid, gid, state, size, ed2k, crc32, quality, source, audio_codecs,
                 video_codec, video_resolution, file_type, dub_languages, sub_languages,
                 length_seconds, anidb_filename)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(i64::from(file.fid))
        .bind(file.aid.map(i64::from))
        .bind(file.eid.map(i64::from))
        .bind(file.gid.map(i64::from))
        .bind(file.state.map(i64::from))
        .bind(file.size.map(|size| size as i64))
        .bind(file.ed2k.map(|hash| hash.to_string()))
        .bind(file.crc32.as_deref())
        .bind(file.quality.as_deref())
        .bind(file.source.as_deref())
        .bind(join_list(&file.audio_codecs))
        .bind(file.video_codec.as_deref())
        .bind(file.video_resolution.map(|resolution| resolution.to_string()))
        .bind(file.file_type.as_deref())
        .bind(join_list(&file.dub_languages))
        .bind(join_list(&file.sub_languages))
        .bind(file.length_seconds.map(i64::from))
        .bind(file.anidb_filename.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Stored AniDB file {}", file.fid);
        Ok(())
    }

    async fn find_lookup(&self, fid: u32) -> Result<Option<FileLookup>> {
        let Some(row) = sqlx::query("SELECT * FROM remote_files WHERE fid = ?")
            .bind(i64::from(fid))
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let file = remote_file_from_row(&row)?;

        let anime = match file.aid {
            Some(aid) => sqlx::query("SELECT * FROM anime WHERE aid = ?")
                .bind(i64::from(aid))
                .fetch_optional(&self.pool)
                .await?
                .as_ref()
                .map(anime_from_row)
                .transpose()?,
            None => None,
        };
        let episode = match file.eid {
            Some(eid) => sqlx::query("SELECT * FROM episodes WHERE eid = ?")
                .bind(i64::from(eid))
                .fetch_optional(&self.pool)
                .await?
                .as_ref()
                .map(episode_from_row)
                .transpose()?,
            None => None,
        };
        let group = match file.gid {
            Some(gid) => sqlx::query("SELECT * FROM release_groups WHERE gid = ?")
                .bind(i64::from(gid))
                .fetch_optional(&self.pool)
                .await?
                .as_ref()
                .map(group_from_row)
                .transpose()?,
            None => None,
        };

        Ok(Some(FileLookup {
            file,
            anime,
            episode,
            group,
        }))
    }
}

fn timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn id(value: Option<i64>) -> Option<u32> {
    value.and_then(|value| u32::try_from(value).ok())
}

fn join_list(values: &[String]) -> String {
    values.join(&LIST_SEPARATOR.to_string())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn local_file_from_row(row: &SqliteRow) -> Result<LocalFile> {
    let hash: Option<String> = row.try_get("hash")?;
    let status: String = row.try_get("status")?;
    let path: String = row.try_get("path")?;
    let version: i64 = row.try_get("version")?;

    Ok(LocalFile {
        id: row.try_get("id")?,
        path: PathBuf::from(path),
        hash: hash.map(|hash| hash.parse()).transpose()?,
        size: row.try_get::<Option<i64>, _>("size")?.map(|size| size as u64),
        status: status.parse()?,
        remote_file_id: id(row.try_get("remote_file_id")?),
        version: version as u32,
        created_at: timestamp(row.try_get("created_at")?),
        updated_at: timestamp(row.try_get("updated_at")?),
    })
}

fn file_action_from_row(row: &SqliteRow) -> Result<FileAction> {
    let kind: String = row.try_get("kind")?;
    Ok(FileAction {
        id: row.try_get("id")?,
        local_file_id: row.try_get("local_file_id")?,
        kind: kind.parse::<FileActionKind>()?,
        success: row.try_get("success")?,
        info: row.try_get("info")?,
        created_at: timestamp(row.try_get("created_at")?),
    })
}

fn anime_from_row(row: &SqliteRow) -> Result<AnimeMetadata> {
    Ok(AnimeMetadata {
        aid: row.try_get::<i64, _>("aid")? as u32,
        romaji_name: row.try_get("romaji_name")?,
        kanji_name: row.try_get("kanji_name")?,
        english_name: row.try_get("english_name")?,
        year: row.try_get("year")?,
        kind: row.try_get("kind")?,
        episode_count: id(row.try_get("episode_count")?),
    })
}

fn episode_from_row(row: &SqliteRow) -> Result<EpisodeMetadata> {
    Ok(EpisodeMetadata {
        eid: row.try_get::<i64, _>("eid")? as u32,
        aid: row.try_get::<i64, _>("aid")? as u32,
        number: row.try_get("number")?,
        english_name: row.try_get("english_name")?,
        romaji_name: row.try_get("romaji_name")?,
        kanji_name: row.try_get("kanji_name")?,
    })
}

fn group_from_row(row: &SqliteRow) -> Result<GroupMetadata> {
    Ok(GroupMetadata {
        gid: row.try_get::<i64, _>("gid")? as u32,
        name: row.try_get("name")?,
        short_name: row.try_get("short_name")?,
    })
}

fn remote_file_from_row(row: &SqliteRow) -> Result<FileMetadata> {
    let ed2k: Option<String> = row.try_get("ed2k")?;
    let resolution: Option<String> = row.try_get("video_resolution")?;
    let audio_codecs: String = row.try_get("audio_codecs")?;
    let dub_languages: String = row.try_get("dub_languages")?;
    let sub_languages: String = row.try_get("sub_languages")?;

    Ok(FileMetadata {
        fid: row.try_get::<i64, _>("fid")? as u32,
        aid: id(row.try_get("aid")?),
        eid: id(row.try_get("eid")?),
        gid: id(row.try_get("gid")?),
        state: row
            .try_get::<Option<i64>, _>("state")?
            .and_then(|state| u16::try_from(state).ok()),
        size: row.try_get::<Option<i64>, _>("size")?.map(|size| size as u64),
        ed2k: ed2k.map(|hash| hash.parse()).transpose()?,
        crc32: row.try_get("crc32")?,
        quality: row.try_get("quality")?,
        source: row.try_get("source")?,
        audio_codecs: split_list(&audio_codecs),
        video_codec: row.try_get("video_codec")?,
        video_resolution: resolution.and_then(|resolution| resolution.parse().ok()),
        file_type: row.try_get("file_type")?,
        dub_languages: split_list(&dub_languages),
        sub_languages: split_list(&sub_languages),
        length_seconds: id(row.try_get("length_seconds")?),
        anidb_filename: row.try_get("anidb_filename")?,
    })
}

async fn update_file_row(conn: &mut SqliteConnection, file: &LocalFile) -> Result<LocalFile> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE local_files
        SET path = ?, hash = ?, size = ?, status = ?, remote_file_id = ?,
            version = version + 1, updated_at = ?
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(file.path.to_string_lossy().as_ref())
    .bind(file.hash.map(|hash| hash.to_string()))
    .bind(file.size.map(|size| size as i64))
    .bind(file.status.as_str())
    .bind(file.remote_file_id.map(i64::from))
    .bind(now.timestamp_millis())
    .bind(file.id)
    .bind(i64::from(file.version))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let found = sqlx::query_scalar::<_, i64>("SELECT version FROM local_files WHERE id = ?")
            .bind(file.id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match found {
            Some(found) => {
                ConcurrencyError::stale_record("local_file", file.id, file.version, found as u32)
            }
            None => ConcurrencyError::vanished("local_file", file.id),
        }
        .into());
    }

    Ok(LocalFile {
        version: file.version + 1,
        updated_at: now,
        ..file.clone()
    })
}

async fn insert_action_row(conn: &mut SqliteConnection, action: NewFileAction) -> Result<FileAction> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM local_files WHERE id = ?")
        .bind(action.local_file_id)
        .fetch_one(&mut *conn)
        .await?;
    if exists == 0 {
        return Err(ConcurrencyError::vanished("local_file", action.local_file_id).into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO file_actions (local_file_id, kind, success, info, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(action.local_file_id)
    .bind(action.kind.as_str())
    .bind(action.success)
    .bind(action.info.as_deref())
    .bind(action.created_at.timestamp_millis())
    .execute(&mut *conn)
    .await?;

    Ok(action.stored(result.last_insert_rowid()))
}
