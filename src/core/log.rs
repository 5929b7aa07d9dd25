use crate::db::log::{LogEntry, load_log};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::table::visible_len;
use ansi_term::Colour;

const OP_TARGET_MAX: usize = 60;

/// Colour of an operation in the audit listing.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "location_add" | "import" => Colour::Green,
        "location_del" | "dismiss" => Colour::Red,
        "location_edit" | "override" | "override_reset" | "annotate" => Colour::Yellow,
        "migration_applied" => Colour::Purple,
        "recompute" | "backfill" => Colour::Blue,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

/// "operation (target)" with only the operation coloured, cut to the column width.
fn render_op_target(entry: &LogEntry) -> String {
    let color = color_for_operation(&entry.operation);
    let plain = if entry.target.is_empty() {
        entry.operation.clone()
    } else {
        format!("{} ({})", entry.operation, entry.target)
    };

    let visible = if plain.chars().count() > OP_TARGET_MAX {
        let mut s: String = plain.chars().take(OP_TARGET_MAX - 3).collect();
        s.push_str("...");
        s
    } else {
        plain
    };

    match visible.split_once(' ') {
        Some((op, rest)) => format!("{} {}", color.paint(op), rest),
        None => color.paint(visible.as_str()).to_string(),
    }
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &mut DbPool) -> AppResult<()> {
        let entries = load_log(&pool.conn)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let rendered: Vec<(String, String)> = entries
            .iter()
            .map(|e| {
                let date = chrono::DateTime::parse_from_rfc3339(&e.date)
                    .map(|dt| dt.format("%FT%T%:z").to_string())
                    .unwrap_or_else(|_| e.date.clone());
                (date, render_op_target(e))
            })
            .collect();

        let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
        let date_w = rendered.iter().map(|(d, _)| d.len()).max().unwrap_or(10);
        let op_w = rendered
            .iter()
            .map(|(_, op)| visible_len(op))
            .max()
            .unwrap_or(10)
            .min(OP_TARGET_MAX);

        println!("📜 Internal log:\n");

        for (entry, (date, op_target)) in entries.iter().zip(rendered) {
            let padding = " ".repeat(op_w.saturating_sub(visible_len(&op_target)));
            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                entry.id,
                date,
                op_target,
                padding,
                entry.message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }
}
