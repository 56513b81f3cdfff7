use std::path::PathBuf;

use anyhow::Result;

use euro_soccer_eda::dataset::{self, DEFAULT_DB_FILE};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let db_path = parse_db_path_arg()
        .or_else(|| std::env::var("APP_SOCCER_DB").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    let show_all = std::env::args().any(|a| a == "--all-columns");

    let conn = dataset::open_db(&db_path)?;
    let tables = dataset::list_tables(&conn)?;

    println!("Table profile");
    println!("DB: {}", db_path.display());
    println!("Tables: {}", tables.join(", "));

    for name in &tables {
        let table = dataset::load_table(&conn, name)?;
        println!(
            "\n{}: rows={} columns={} duplicates={}",
            table.name,
            table.len(),
            table.width(),
            table.duplicate_count()
        );
        for (column, nulls) in table.null_counts() {
            if nulls == 0 && !show_all {
                continue;
            }
            let pct = if table.is_empty() {
                0.0
            } else {
                nulls as f64 * 100.0 / table.len() as f64
            };
            println!("  {column:<28} nulls={nulls:>7} ({pct:.2}%)");
        }
    }

    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
