use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Dates and times are stored as ISO text (`YYYY-MM-DD`, `HH:MM`) so that
    // lexical order matches chronological order.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS reservations (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  email TEXT NOT NULL,
  party_size INTEGER NOT NULL CHECK (party_size > 0),
  date TEXT NOT NULL,
  start_time TEXT NOT NULL,
  duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
  created_at TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_reservations_date ON reservations(date);"#)
        .execute(pool)
        .await?;

    // One row per date that has seen a booking attempt. Bumped as the first
    // statement of every guarded insert to take the write lock up front.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS date_guards (
  date TEXT PRIMARY KEY,
  writes INTEGER NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
