//! Member repository.

use ad_scoring::{activity_score, ActivityInputs};
use sqlx::FromRow;
use sqlx_postgres::PgPool;
use tracing::info;

use super::StoreError;
use crate::domain::{Member, MemberRecord};

/// Filters for the member list endpoint.
#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    /// Substring match on name.
    pub name: Option<String>,
    /// Exact match on party.
    pub party: Option<String>,
    /// Substring match on district.
    pub district: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

/// List members with optional filters and offset/limit paging.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn list(pool: &PgPool, filter: &MemberFilter) -> Result<Vec<Member>, StoreError> {
    let members = sqlx::query_as::<_, Member>(
        r"
        SELECT * FROM members
        WHERE ($1::text IS NULL OR name LIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR party = $2)
          AND ($3::text IS NULL OR district LIKE '%' || $3 || '%')
        ORDER BY id
        OFFSET $4 LIMIT $5
        ",
    )
    .bind(filter.name.as_deref())
    .bind(filter.party.as_deref())
    .bind(filter.district.as_deref())
    .bind(filter.skip.max(0))
    .bind(filter.limit.clamp(1, 1000))
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Fetch one member by primary key.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Member>, StoreError> {
    let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(member)
}

/// Look up a member ID by exact name.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn find_id_by_name(pool: &PgPool, name: &str) -> Result<Option<i64>, StoreError> {
    let id =
        sqlx::query_scalar::<_, i64>("SELECT id FROM members WHERE name = $1 ORDER BY id LIMIT 1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(id)
}

/// Count all member rows.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn count(pool: &PgPool) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Delete every member row. Used when a stale bootstrap roster is replaced.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn delete_all(pool: &PgPool) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM members").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Members ordered by activity score, optionally filtered by party.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn ranking(
    pool: &PgPool,
    party: Option<&str>,
    limit: i64,
) -> Result<Vec<Member>, StoreError> {
    let members = sqlx::query_as::<_, Member>(
        r"
        SELECT * FROM members
        WHERE ($1::text IS NULL OR party = $1)
        ORDER BY activity_score DESC, id
        LIMIT $2
        ",
    )
    .bind(party)
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Insert a member from a roster record, or merge it into the existing row
/// matched by name. Merging never clears a field the upstream record left
/// absent. Returns `true` when a new row was inserted.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn upsert_from_record(pool: &PgPool, record: &MemberRecord) -> Result<bool, StoreError> {
    let existing = find_id_by_name(pool, &record.name).await?;

    if let Some(id) = existing {
        sqlx::query(
            r"
            UPDATE members SET
                hanja_name = COALESCE($2, hanja_name),
                eng_name = COALESCE($3, eng_name),
                birth_date = COALESCE($4, birth_date),
                birth_gbn = COALESCE($5, birth_gbn),
                party = COALESCE($6, party),
                district = COALESCE($7, district),
                position = COALESCE($8, position),
                committee = COALESCE($9, committee),
                committees = COALESCE($10, committees),
                reele_gbn = COALESCE($11, reele_gbn),
                units = COALESCE($12, units),
                tel_no = COALESCE($13, tel_no),
                email = COALESCE($14, email),
                homepage = COALESCE($15, homepage),
                last_updated = CURRENT_DATE
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(record.hanja_name.as_deref())
        .bind(record.eng_name.as_deref())
        .bind(record.birth_date)
        .bind(record.birth_gbn.as_deref())
        .bind(record.party.as_deref())
        .bind(record.district.as_deref())
        .bind(record.position.as_deref())
        .bind(record.committee.as_deref())
        .bind(record.committees.as_deref())
        .bind(record.reele_gbn.as_deref())
        .bind(record.units.as_deref())
        .bind(record.tel_no.as_deref())
        .bind(record.email.as_deref())
        .bind(record.homepage.as_deref())
        .execute(pool)
        .await?;

        Ok(false)
    } else {
        sqlx::query(
            r"
            INSERT INTO members (
                name, hanja_name, eng_name, birth_date, birth_gbn,
                party, district, position, committee, committees,
                reele_gbn, units, tel_no, email, homepage,
                last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, CURRENT_DATE)
            ",
        )
        .bind(&record.name)
        .bind(record.hanja_name.as_deref())
        .bind(record.eng_name.as_deref())
        .bind(record.birth_date)
        .bind(record.birth_gbn.as_deref())
        .bind(record.party.as_deref())
        .bind(record.district.as_deref())
        .bind(record.position.as_deref())
        .bind(record.committee.as_deref())
        .bind(record.committees.as_deref())
        .bind(record.reele_gbn.as_deref())
        .bind(record.units.as_deref())
        .bind(record.tel_no.as_deref())
        .bind(record.email.as_deref())
        .bind(record.homepage.as_deref())
        .execute(pool)
        .await?;

        Ok(true)
    }
}

/// Statistical fields feeding the activity score, one row per member.
#[derive(Debug, Clone, FromRow)]
pub struct MemberStats {
    pub id: i64,
    pub num_bills: i64,
    pub attendance_rate: f64,
    pub speech_count: i64,
    pub bill_pass_rate: f64,
}

/// Recompute every member's activity score in one pass.
///
/// The legislature is a few hundred rows, so this loads all statistics,
/// scores them, and writes the results back in a single transaction.
///
/// # Errors
/// Returns `StoreError` on query or commit failure.
pub async fn refresh_activity_scores(pool: &PgPool) -> Result<u64, StoreError> {
    let stats = sqlx::query_as::<_, MemberStats>(
        "SELECT id, num_bills, attendance_rate, speech_count, bill_pass_rate FROM members",
    )
    .fetch_all(pool)
    .await?;

    let mut tx = pool.begin().await?;
    let count = stats.len() as u64;
    for row in stats {
        let score = activity_score(ActivityInputs {
            num_bills: row.num_bills,
            attendance_rate: row.attendance_rate,
            speech_count: row.speech_count,
            bill_pass_rate: row.bill_pass_rate,
        });
        sqlx::query("UPDATE members SET activity_score = $2 WHERE id = $1")
            .bind(row.id)
            .bind(score)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!(count, "activity scores refreshed");
    Ok(count)
}

/// IDs of rows whose name was already seen on an earlier (lower-id) row.
///
/// Pure so the duplicate policy is testable without a database: the first
/// row wins, every later repeat of the same name is a duplicate.
#[must_use]
pub fn later_duplicate_ids(rows: &[(i64, String)]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .filter_map(|(id, name)| (!seen.insert(name.as_str())).then_some(*id))
        .collect()
}

/// Remove members whose name repeats an earlier row. Returns the number of
/// rows removed.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn clean_duplicates(pool: &PgPool) -> Result<u64, StoreError> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM members ORDER BY id")
        .fetch_all(pool)
        .await?;

    let duplicates = later_duplicate_ids(&rows);
    if duplicates.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM members WHERE id = ANY($1)")
        .bind(&duplicates)
        .execute(pool)
        .await?;

    info!(removed = result.rows_affected(), "duplicate members removed");
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_duplicates_keep_the_first_row_per_name() {
        let rows = vec![
            (1, "A".to_string()),
            (2, "B".to_string()),
            (3, "A".to_string()),
        ];
        assert_eq!(later_duplicate_ids(&rows), vec![3]);
    }

    #[test]
    fn no_duplicates_means_nothing_to_remove() {
        let rows = vec![(1, "A".to_string()), (2, "B".to_string())];
        assert!(later_duplicate_ids(&rows).is_empty());
    }

    #[test]
    fn triple_repeat_removes_both_later_rows() {
        let rows = vec![
            (10, "A".to_string()),
            (11, "A".to_string()),
            (12, "A".to_string()),
        ];
        assert_eq!(later_duplicate_ids(&rows), vec![11, 12]);
    }
}
