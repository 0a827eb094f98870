//! 스키마 마이그레이션
//!
//! 리비전은 `down_revision`으로 이전 리비전을 가리키는 단일 연결 리스트입니다.
//! 적용 상태는 `profile_schema_version` 테이블에 기록하며, 각 단계는 하나의 트랜잭션으로 실행됩니다.
//! base까지 다운그레이드하면 버전 테이블도 삭제되어 마이그레이션 이전과 같은 테이블 집합이 남습니다.

use crate::config::connection_pool::{with_session, ConnectionHandle};
use crate::config::dialect::Dialect;
use crate::tool::error::ProfileError;
use sqlx::{Connection, QueryBuilder};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 적용된 리비전을 기록하는 테이블
pub const VERSION_TABLE: &str = "profile_schema_version";

/// base 리비전 이전 상태를 가리키는 대상 이름
pub const BASE: &str = "base";
/// 최신 리비전을 가리키는 대상 이름
pub const HEAD: &str = "head";

/// 하나의 스키마 리비전
pub struct Revision {
    pub id: &'static str,
    pub down_revision: Option<&'static str>,
    pub description: &'static str,
    pub upgrade: fn(&Dialect) -> Vec<String>,
    pub downgrade: fn(&Dialect) -> Vec<String>,
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Revision")
            .field("id", &self.id)
            .field("down_revision", &self.down_revision)
            .field("description", &self.description)
            .finish()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}, {}",
            self.down_revision.unwrap_or("<base>"),
            self.id,
            self.description
        )
    }
}

/// 등록된 리비전 (순서 무관, `MigrationChain`이 연결 순서로 정렬)
pub static REVISIONS: &[Revision] = &[Revision {
    id: "4c1d9e7a2b10",
    down_revision: None,
    description: "create user_profile table",
    upgrade: create_user_profile,
    downgrade: drop_user_profile,
}];

fn create_user_profile(dialect: &Dialect) -> Vec<String> {
    let (id_column, timestamp_type, now) = match dialect {
        Dialect::Postgres => ("id BIGSERIAL PRIMARY KEY", "TIMESTAMPTZ", "now()"),
        Dialect::SqliteFile(_) | Dialect::SqliteMemory => (
            "id INTEGER PRIMARY KEY AUTOINCREMENT",
            "DATETIME",
            "CURRENT_TIMESTAMP",
        ),
        Dialect::Other(_) => (
            "id BIGINT AUTO_INCREMENT PRIMARY KEY",
            "DATETIME(6)",
            "CURRENT_TIMESTAMP(6)",
        ),
    };

    vec![
        format!(
            "CREATE TABLE user_profile (
                {id_column},
                name VARCHAR(6) NOT NULL,
                region VARCHAR(10) NOT NULL,
                company VARCHAR(10),
                bio VARCHAR(128),
                hobbies VARCHAR(10),
                interests TEXT,
                age INTEGER,
                created_at {timestamp_type} NOT NULL DEFAULT {now},
                updated_at {timestamp_type} NOT NULL DEFAULT {now},
                CONSTRAINT chk_user_profile_age_range CHECK (age >= 0 AND age <= 200)
            )"
        ),
        "CREATE INDEX idx_user_profile_name ON user_profile (name)".to_string(),
        "CREATE INDEX idx_user_profile_region ON user_profile (region)".to_string(),
        "CREATE INDEX ix_user_profile_id ON user_profile (id)".to_string(),
    ]
}

fn drop_user_profile(dialect: &Dialect) -> Vec<String> {
    // 기본 정책 방언은 인덱스 삭제에 테이블 이름이 필요함
    let on_table = match dialect {
        Dialect::Other(_) => " ON user_profile",
        _ => "",
    };
    let mut statements: Vec<String> = [
        "ix_user_profile_id",
        "idx_user_profile_region",
        "idx_user_profile_name",
    ]
    .iter()
    .map(|index| format!("DROP INDEX {index}{on_table}"))
    .collect();
    statements.push("DROP TABLE user_profile".to_string());
    statements
}

/// base부터 head까지 검증된 리비전 순서
#[derive(Debug, Clone)]
pub struct MigrationChain {
    ordered: Vec<&'static Revision>,
}

impl MigrationChain {
    /// 리비전 연결을 검증하고 base부터 정렬합니다.
    ///
    /// base가 정확히 하나이고, 분기나 끊긴 링크, 중복 식별자가 없어야 합니다.
    pub fn new(revisions: &'static [Revision]) -> Result<Self, ProfileError> {
        let mut seen = HashSet::new();
        for revision in revisions {
            if !seen.insert(revision.id) {
                return Err(ProfileError::Migration(format!(
                    "중복된 리비전 식별자: {}",
                    revision.id
                )));
            }
        }

        let bases: Vec<&'static Revision> = revisions
            .iter()
            .filter(|r| r.down_revision.is_none())
            .collect();
        let mut tip = match bases.as_slice() {
            [base] => *base,
            [] => {
                return Err(ProfileError::Migration(
                    "base 리비전이 없습니다".to_string(),
                ))
            }
            _ => {
                return Err(ProfileError::Migration(format!(
                    "base 리비전이 여러 개입니다: {}",
                    bases.iter().map(|r| r.id).collect::<Vec<_>>().join(", ")
                )))
            }
        };

        let mut ordered = vec![tip];
        loop {
            let children: Vec<&'static Revision> = revisions
                .iter()
                .filter(|r| r.down_revision == Some(tip.id))
                .collect();
            match children.as_slice() {
                [] => break,
                [child] => {
                    tip = *child;
                    ordered.push(tip);
                }
                _ => {
                    return Err(ProfileError::Migration(format!(
                        "리비전 {}에서 분기가 발생했습니다",
                        tip.id
                    )))
                }
            }
        }

        if ordered.len() != revisions.len() {
            let linked: HashSet<&str> = ordered.iter().map(|r| r.id).collect();
            let dangling: Vec<&str> = revisions
                .iter()
                .map(|r| r.id)
                .filter(|id| !linked.contains(id))
                .collect();
            return Err(ProfileError::Migration(format!(
                "연결되지 않은 리비전: {}",
                dangling.join(", ")
            )));
        }

        Ok(Self { ordered })
    }

    /// base부터 head 순서의 리비전
    pub fn revisions(&self) -> &[&'static Revision] {
        &self.ordered
    }

    pub fn head(&self) -> &'static Revision {
        // new()가 최소 하나의 리비전을 보장
        self.ordered[self.ordered.len() - 1]
    }

    /// 대상 이름을 체인 위치로 변환합니다. base는 `None`.
    fn position(&self, target: &str) -> Result<Option<usize>, ProfileError> {
        match target {
            BASE => Ok(None),
            HEAD => Ok(Some(self.ordered.len() - 1)),
            id => self
                .ordered
                .iter()
                .position(|r| r.id == id)
                .map(Some)
                .ok_or_else(|| ProfileError::Migration(format!("알 수 없는 리비전: {id}"))),
        }
    }
}

/// 한 단계가 끝난 뒤 버전 테이블에 남길 상태
enum Stamp {
    Set(&'static str),
    Clear,
}

/// 연결 핸들에 대해 리비전을 적용하거나 되돌립니다.
pub struct MigrationRunner {
    handle: Arc<ConnectionHandle>,
    chain: MigrationChain,
}

impl MigrationRunner {
    /// 등록된 리비전으로 실행기를 생성합니다.
    pub fn new(handle: Arc<ConnectionHandle>) -> Result<Self, ProfileError> {
        Ok(Self::with_chain(handle, MigrationChain::new(REVISIONS)?))
    }

    pub fn with_chain(handle: Arc<ConnectionHandle>, chain: MigrationChain) -> Self {
        Self { handle, chain }
    }

    pub fn chain(&self) -> &MigrationChain {
        &self.chain
    }

    /// base부터 head 순서의 리비전 목록
    pub fn history(&self) -> &[&'static Revision] {
        self.chain.revisions()
    }

    /// 사용자 테이블 이름 목록 (엔진 내부 테이블 제외, 정렬됨)
    pub async fn table_names(&self) -> Result<Vec<String>, ProfileError> {
        let sql = match self.handle.dialect() {
            Dialect::Postgres => {
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = current_schema() ORDER BY table_name"
            }
            Dialect::SqliteFile(_) | Dialect::SqliteMemory => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
            Dialect::Other(_) => {
                "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() ORDER BY table_name"
            }
        };

        let mut session = self.handle.session().await?;
        let names = with_session!(&mut session, |conn, DB| {
            sqlx::query_scalar::<DB, String>(sql)
                .fetch_all(&mut *conn)
                .await
        });
        Ok(names?)
    }

    /// 현재 적용된 리비전. 아무것도 적용되지 않았으면 `None`.
    pub async fn current(&self) -> Result<Option<&'static Revision>, ProfileError> {
        if !self.table_names().await?.iter().any(|t| t == VERSION_TABLE) {
            return Ok(None);
        }

        let sql = format!("SELECT version_num FROM {VERSION_TABLE}");
        let mut session = self.handle.session().await?;
        let version = with_session!(&mut session, |conn, DB| {
            sqlx::query_scalar::<DB, String>(&sql)
                .fetch_optional(&mut *conn)
                .await
        })?;

        match version {
            None => Ok(None),
            Some(id) => match self.chain.position(&id)? {
                Some(index) => Ok(Some(self.chain.revisions()[index])),
                None => Ok(None),
            },
        }
    }

    async fn current_position(&self) -> Result<Option<usize>, ProfileError> {
        match self.current().await? {
            Some(revision) => self.chain.position(revision.id),
            None => Ok(None),
        }
    }

    /// 대상 리비전까지 순서대로 적용합니다. `None`이면 head까지.
    ///
    /// 적용한 리비전 식별자를 반환합니다. 이미 대상에 있으면 빈 목록입니다.
    pub async fn upgrade(&self, target: Option<&str>) -> Result<Vec<&'static str>, ProfileError> {
        let target = self.chain.position(target.unwrap_or(HEAD))?;
        let current = self.current_position().await?;

        if target < current {
            return Err(ProfileError::Migration(
                "대상 리비전이 현재 리비전보다 이전입니다. downgrade를 사용하세요".to_string(),
            ));
        }

        let start = current.map_or(0, |i| i + 1);
        let end = target.map_or(0, |i| i + 1);
        let dialect = self.handle.dialect().clone();
        let mut applied = Vec::new();

        for revision in &self.chain.revisions()[start..end] {
            info!("마이그레이션 적용: {}", revision);
            let statements = (revision.upgrade)(&dialect);
            self.run_step(revision, statements, Stamp::Set(revision.id))
                .await?;
            applied.push(revision.id);
        }

        if applied.is_empty() {
            debug!("적용할 마이그레이션이 없습니다");
        }
        Ok(applied)
    }

    /// 대상 리비전까지 역순으로 되돌립니다. `base`이면 모든 리비전을 되돌립니다.
    pub async fn downgrade(&self, target: &str) -> Result<Vec<&'static str>, ProfileError> {
        let target = self.chain.position(target)?;
        let current = self.current_position().await?;

        if target > current {
            return Err(ProfileError::Migration(
                "대상 리비전이 현재 리비전보다 이후입니다. upgrade를 사용하세요".to_string(),
            ));
        }

        let start = target.map_or(0, |i| i + 1);
        let end = current.map_or(0, |i| i + 1);
        let dialect = self.handle.dialect().clone();
        let mut reverted = Vec::new();

        for revision in self.chain.revisions()[start..end].iter().rev() {
            info!("마이그레이션 되돌리기: {}", revision);
            let statements = (revision.downgrade)(&dialect);
            let stamp = match revision.down_revision {
                Some(previous) => Stamp::Set(previous),
                None => Stamp::Clear,
            };
            self.run_step(revision, statements, stamp).await?;
            reverted.push(revision.id);
        }

        Ok(reverted)
    }

    /// 한 리비전의 문장들과 버전 기록을 하나의 트랜잭션으로 실행합니다.
    async fn run_step(
        &self,
        revision: &Revision,
        statements: Vec<String>,
        stamp: Stamp,
    ) -> Result<(), ProfileError> {
        let mut session = self.handle.session().await?;
        let outcome = with_session!(&mut session, |conn, DB| {
            let step = async move {
                let mut tx = conn.begin().await?;

                sqlx::query(&format!(
                    "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} \
                     (version_num VARCHAR(32) NOT NULL PRIMARY KEY)"
                ))
                .execute(&mut *tx)
                .await?;

                for statement in &statements {
                    sqlx::query(statement.as_str()).execute(&mut *tx).await?;
                }

                sqlx::query(&format!("DELETE FROM {VERSION_TABLE}"))
                    .execute(&mut *tx)
                    .await?;
                match stamp {
                    Stamp::Set(id) => {
                        let mut insert = QueryBuilder::<DB>::new(format!(
                            "INSERT INTO {VERSION_TABLE} (version_num) VALUES ("
                        ));
                        insert.push_bind(id.to_string());
                        insert.push(")");
                        insert.build().execute(&mut *tx).await?;
                    }
                    Stamp::Clear => {
                        sqlx::query(&format!("DROP TABLE {VERSION_TABLE}"))
                            .execute(&mut *tx)
                            .await?;
                    }
                }

                tx.commit().await
            };
            step.await
        });

        outcome.map_err(|e| {
            let err = ProfileError::Migration(format!("리비전 {} 실패: {e}", revision.id));
            err.log("마이그레이션");
            err
        })
    }
}
