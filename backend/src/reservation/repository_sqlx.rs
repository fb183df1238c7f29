use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::any::AnyRow;
use sqlx::{Any, AnyPool, Executor, Row};

use crate::reservation::model::{NewReservation, Reservation, ReservationId};
use crate::reservation::repository::{Admission, ReservationRepository};
use crate::time::{fmt_date, fmt_time, parse_date, parse_time};

/// SQLx-backed implementation of ReservationRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxReservationRepository {
    pool: AnyPool,
}

impl SqlxReservationRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

const SELECT_BY_DATE: &str = r#"
SELECT id, name, email, party_size, date, start_time, duration_minutes, created_at
FROM reservations
WHERE date = ?
ORDER BY start_time, id;
"#;

#[async_trait]
impl ReservationRepository for SqlxReservationRepository {
    async fn insert(&self, new: &NewReservation) -> anyhow::Result<Reservation> {
        insert_row(&self.pool, new).await
    }

    async fn insert_if(
        &self,
        new: &NewReservation,
        admit: Admission<'_>,
    ) -> anyhow::Result<Option<Reservation>> {
        let mut tx = self.pool.begin().await?;

        // The first statement writes, so SQLite grants the database write lock
        // before the day is read. Competing bookings from any connection or
        // process wait here and then see this one's insert.
        sqlx::query(
            r#"
INSERT INTO date_guards (date, writes) VALUES (?, 1)
ON CONFLICT(date) DO UPDATE SET writes = writes + 1;
"#,
        )
        .bind(fmt_date(new.date))
        .execute(&mut *tx)
        .await
        .context("failed to take date guard")?;

        let rows = sqlx::query(SELECT_BY_DATE)
            .bind(fmt_date(new.date))
            .fetch_all(&mut *tx)
            .await?;
        let existing = map_rows(&rows, new.date)?;

        if !admit(existing.as_slice())? {
            tx.rollback().await?;
            return Ok(None);
        }

        let stored = insert_row(&mut *tx, new).await?;
        tx.commit().await?;
        Ok(Some(stored))
    }

    async fn fetch_by_date(&self, date: NaiveDate) -> anyhow::Result<Vec<Reservation>> {
        let rows = sqlx::query(SELECT_BY_DATE)
            .bind(fmt_date(date))
            .fetch_all(&self.pool)
            .await?;

        map_rows(&rows, date)
    }

    async fn fetch_by_id(&self, id: ReservationId) -> anyhow::Result<Option<Reservation>> {
        let row = sqlx::query(
            r#"
SELECT id, name, email, party_size, date, start_time, duration_minutes, created_at
FROM reservations
WHERE id = ?;
"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_reservation(&r)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: ReservationId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?;")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_date(&self, date: NaiveDate) -> anyhow::Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM reservations WHERE date = ?;")
            .bind(fmt_date(date))
            .fetch_one(&self.pool)
            .await?;

        i64_to_u64(row.try_get("n")?)
    }
}

async fn insert_row<'e, E>(exec: E, new: &NewReservation) -> anyhow::Result<Reservation>
where
    E: Executor<'e, Database = Any>,
{
    let row = sqlx::query(
        r#"
INSERT INTO reservations (
  name, email, party_size, date, start_time, duration_minutes, created_at
)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING id;
"#,
    )
    .bind(new.name.clone())
    .bind(new.email.clone())
    .bind(i64::from(new.party_size))
    .bind(fmt_date(new.date))
    .bind(fmt_time(new.start_time))
    .bind(i64::from(new.duration_minutes))
    .bind(new.created_at.to_rfc3339())
    .fetch_one(exec)
    .await?;

    let id: i64 = row.try_get("id")?;
    Ok(new.clone().into_reservation(id))
}

/* =========================
Row mapping + conversions
========================= */

/// A single unreadable row fails the whole date.
fn map_rows(rows: &[AnyRow], date: NaiveDate) -> anyhow::Result<Vec<Reservation>> {
    rows.iter()
        .map(row_to_reservation)
        .collect::<anyhow::Result<Vec<_>>>()
        .with_context(|| format!("malformed reservation row on {date}"))
}

fn row_to_reservation(r: &AnyRow) -> anyhow::Result<Reservation> {
    let date_str: String = r.try_get("date")?;
    let start_str: String = r.try_get("start_time")?;
    let created_str: String = r.try_get("created_at")?;

    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .with_context(|| format!("invalid created_at '{created_str}'"))?
        .with_timezone(&Utc);

    Ok(Reservation {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        email: r.try_get("email")?,
        party_size: i64_to_u32(r.try_get("party_size")?)?,
        date: parse_date(&date_str)?,
        start_time: parse_time(&start_str)?,
        duration_minutes: i64_to_u32(r.try_get("duration_minutes")?)?,
        created_at,
    })
}

/* =========================
Numeric safety helpers
========================= */

fn i64_to_u32(v: i64) -> anyhow::Result<u32> {
    u32::try_from(v).map_err(|_| anyhow!("out of range for u32: {v}"))
}

fn i64_to_u64(v: i64) -> anyhow::Result<u64> {
    u64::try_from(v).map_err(|_| anyhow!("negative i64 where u64 expected: {v}"))
}
