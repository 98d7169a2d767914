use serde::Serialize;
use sqlx::SqlitePool;

use crate::booking::{FlowKind, Ticket};

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    // Create migrations tracking table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await?;

    let applied: bool =
        sqlx::query_scalar("SELECT COUNT(*) > 0 FROM _migrations WHERE name = '001_tickets'")
            .fetch_one(pool)
            .await?;

    if !applied {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tickets (
                ticket_id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                flow_kind TEXT NOT NULL,
                service_id TEXT NOT NULL,
                service_name TEXT NOT NULL,
                date TEXT,
                time TEXT,
                visit_type TEXT,
                payment_method TEXT,
                base_fee INTEGER NOT NULL,
                platform_fee INTEGER NOT NULL,
                discount_percent INTEGER NOT NULL DEFAULT 0,
                final_amount INTEGER NOT NULL,
                issued_at TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tickets_issued_at ON tickets(issued_at)")
            .execute(pool)
            .await?;

        sqlx::query("INSERT INTO _migrations (name) VALUES ('001_tickets')")
            .execute(pool)
            .await?;
        tracing::info!("Applied migration: 001_tickets");
    }

    tracing::info!("Database migrations up to date");
    Ok(())
}

/// A confirmed ticket as stored in the ledger.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TicketRecord {
    pub ticket_id: String,
    pub session_id: String,
    pub flow_kind: String,
    pub service_id: String,
    pub service_name: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub visit_type: Option<String>,
    pub payment_method: Option<String>,
    pub base_fee: i64,
    pub platform_fee: i64,
    pub discount_percent: i64,
    pub final_amount: i64,
    pub issued_at: String,
}

const TICKET_SELECT: &str = "SELECT ticket_id, session_id, flow_kind, service_id, service_name,
        date, time, visit_type, payment_method, base_fee, platform_fee,
        discount_percent, final_amount, issued_at
     FROM tickets";

pub async fn record_ticket(
    pool: &SqlitePool,
    session_id: &str,
    kind: FlowKind,
    ticket: &Ticket,
) -> anyhow::Result<()> {
    let visit_type = ticket
        .visit_type
        .map(serde_json::to_value)
        .transpose()?
        .and_then(|v| v.as_str().map(str::to_string));

    sqlx::query(
        "INSERT INTO tickets (ticket_id, session_id, flow_kind, service_id, service_name,
         date, time, visit_type, payment_method, base_fee, platform_fee,
         discount_percent, final_amount, issued_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&ticket.ticket_id)
    .bind(session_id)
    .bind(kind.as_str())
    .bind(&ticket.service_id)
    .bind(&ticket.service_name)
    .bind(&ticket.date)
    .bind(&ticket.time)
    .bind(visit_type)
    .bind(&ticket.payment_method)
    .bind(ticket.base_fee)
    .bind(ticket.platform_fee)
    .bind(i64::from(ticket.discount_percent))
    .bind(ticket.final_amount)
    .bind(ticket.issued_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent tickets first.
pub async fn list_tickets(pool: &SqlitePool, limit: i64) -> anyhow::Result<Vec<TicketRecord>> {
    let query = format!("{} ORDER BY issued_at DESC, ticket_id DESC LIMIT ?", TICKET_SELECT);
    let rows = sqlx::query_as::<_, TicketRecord>(&query)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_ticket(pool: &SqlitePool, ticket_id: &str) -> anyhow::Result<Option<TicketRecord>> {
    let query = format!("{} WHERE ticket_id = ?", TICKET_SELECT);
    let row = sqlx::query_as::<_, TicketRecord>(&query)
        .bind(ticket_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

// ── Tests ──

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::booking::VisitType;
    use chrono::{TimeZone, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    /// Single-connection in-memory pool; every connection to `:memory:` is a fresh database.
    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn ticket(id: &str, minute: u32) -> Ticket {
        Ticket {
            ticket_id: id.into(),
            service_id: "doc-1".into(),
            service_name: "Dr. Meera Rao".into(),
            date: Some("2026-03-01".into()),
            time: Some("10:00".into()),
            visit_type: Some(VisitType::InPerson),
            payment_method: Some("Health Insurance".into()),
            base_fee: 2500,
            platform_fee: 50,
            discount_percent: 80,
            final_amount: 510,
            issued_at: Utc.with_ymd_and_hms(2026, 2, 20, 12, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();
        assert!(list_tickets(&pool, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_and_find() {
        let pool = memory_pool().await;
        record_ticket(&pool, "s1", FlowKind::DoctorConsultation, &ticket("TKT-1", 0))
            .await
            .unwrap();

        let row = find_ticket(&pool, "TKT-1").await.unwrap().unwrap();
        assert_eq!(row.session_id, "s1");
        assert_eq!(row.flow_kind, "doctor_consultation");
        assert_eq!(row.visit_type.as_deref(), Some("in_person"));
        assert_eq!(row.discount_percent, 80);
        assert_eq!(row.final_amount, 510);

        assert!(find_ticket(&pool, "TKT-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_ticket_id_rejected() {
        let pool = memory_pool().await;
        let t = ticket("TKT-1", 0);
        record_ticket(&pool, "s1", FlowKind::Emergency, &t).await.unwrap();
        assert!(record_ticket(&pool, "s2", FlowKind::Emergency, &t).await.is_err());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let pool = memory_pool().await;
        for (i, id) in ["TKT-1", "TKT-2", "TKT-3"].iter().enumerate() {
            record_ticket(&pool, "s", FlowKind::Childcare, &ticket(id, i as u32))
                .await
                .unwrap();
        }

        let rows = list_tickets(&pool, 2).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.ticket_id.as_str()).collect();
        assert_eq!(ids, vec!["TKT-3", "TKT-2"]);
    }
}
