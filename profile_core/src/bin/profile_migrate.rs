//! 스키마 마이그레이션 실행 도구
//!
//! 사용법: `profile_migrate <upgrade [REV] | downgrade [REV|base] | current | history>`
//!
//! 연결 URL은 `DATABASE_URL` 환경 변수(.env 포함)에서 읽습니다.

use anyhow::{bail, Result};
use profile_core::config::{ConnectionFactory, DatabaseSettings};
use profile_core::logging::init_logging;
use profile_core::service::db::migration::{MigrationRunner, BASE, HEAD};
use std::env;
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "사용법: profile_migrate <upgrade [REV] | downgrade [REV|base] | current | history>";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info")?;

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!("{USAGE}");
    };
    let target = args.get(1).map(String::as_str);

    let settings = DatabaseSettings::from_env()?;
    info!("▶ 마이그레이션 대상: {}", settings.redacted_url());

    let handle = Arc::new(ConnectionFactory::from_settings(&settings).await?);
    let runner = MigrationRunner::new(handle.clone())?;

    match command.as_str() {
        "upgrade" => {
            let applied = runner.upgrade(target).await?;
            if applied.is_empty() {
                println!("이미 {} 상태입니다", target.unwrap_or(HEAD));
            }
            for id in applied {
                println!("적용: {id}");
            }
        }
        "downgrade" => {
            // 대상이 없으면 한 단계만 되돌림
            let target = match target {
                Some(target) => target.to_string(),
                None => match runner.current().await? {
                    Some(revision) => revision.down_revision.unwrap_or(BASE).to_string(),
                    None => BASE.to_string(),
                },
            };
            for id in runner.downgrade(&target).await? {
                println!("되돌림: {id}");
            }
        }
        "current" => match runner.current().await? {
            Some(revision) => println!("{} (head: {})", revision.id, runner.chain().head().id),
            None => println!("<base>"),
        },
        "history" => {
            for revision in runner.history().iter().rev() {
                println!("{revision}");
            }
        }
        other => {
            handle.close().await;
            bail!("알 수 없는 명령 '{other}'\n{USAGE}");
        }
    }

    handle.close().await;
    Ok(())
}
