use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::location_match::rebuild_all;
use crate::core::matcher::GeofenceIndex;
use crate::db::log::ttlog;
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::db::{shifts, stats};
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, RED, RESET};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        vacuum,
        info,
        rebuild_matches,
    } = cmd
    {
        let mut pool = DbPool::new(&cfg.database)?;

        //
        // 1) MIGRATE
        //
        if *migrate {
            println!("{}▶ Running migrations…{}", CYAN, RESET);
            let applied = run_pending_migrations(&pool.conn)?;
            println!(
                "{}✔ Migration completed ({} applied).{}\n",
                GREEN, applied, RESET
            );
        }

        //
        // 2) INFO
        //
        if *info {
            stats::print_db_info(&mut pool, &cfg.database)?;
        }

        //
        // 3) CHECK
        //
        if *check {
            println!("{}▶ Running integrity check…{}", CYAN, RESET);

            let integrity: String = pool
                .conn
                .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

            if integrity == "ok" {
                println!("{}✔ Integrity check passed.{}\n", GREEN, RESET);
            } else {
                println!("{}✘ Integrity check failed:{} {}\n", RED, RESET, integrity);
            }
        }

        //
        // 4) REBUILD MATCH CACHE
        //
        if *rebuild_matches {
            println!("{}▶ Rebuilding location matches…{}", CYAN, RESET);
            let matched = pool.with_transaction(|tx| {
                let index = GeofenceIndex::load(tx)?;
                let ids = shifts::list_shift_ids(tx)?;
                let matched = rebuild_all(tx, &index, &cfg.segmentation, &ids)?;
                ttlog(
                    tx,
                    "rebuild_matches",
                    "location_matches",
                    &format!("{matched} points matched"),
                )?;
                Ok(matched)
            })?;
            println!("{}✔ {} points matched.{}\n", GREEN, matched, RESET);
        }

        //
        // 5) VACUUM
        //
        if *vacuum {
            println!("{}▶ Running VACUUM…{}", CYAN, RESET);
            pool.conn.execute_batch("VACUUM;")?;
            println!("{}✔ Vacuum completed.{}\n", GREEN, RESET);
        }
    }

    Ok(())
}
