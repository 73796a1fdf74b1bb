use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use commission_core::{
    CalculationTreatment, CommissionKind, CommissionRepository, GroupKey, RateConfig, RecordId,
    RecordSnapshot, RepositoryError, StoredRecord, Tier, TierResult, TierSnapshot,
    WithholdingRate,
};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const SELECT_COLUMNS: &str = "id, record_id, developer_name, record_developer_name, invoice_no,
    sequence_no, record_date, agent_name, client_name, reservation_date, base_commission, base_amount_hint,
    commission_kind, status, bdo_account, remarks,
    agent_calc_type, agent_rate, agent_developers_rate, agent_ewt_rate,
    agent_net_of_vat, agent_amount, agent_vat, agent_ewt, agent_net_commission,
    um_calc_type, um_rate, um_developers_rate, um_ewt_rate,
    um_net_of_vat, um_amount, um_vat, um_ewt, um_net_commission,
    tl_calc_type, tl_rate, tl_developers_rate, tl_ewt_rate,
    tl_net_of_vat, tl_amount, tl_vat, tl_ewt, tl_net_commission";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file if needed.
    ///
    /// Accepts a bare path, a `sqlite:` URL or `:memory:`. The pool holds a
    /// single connection so an in-memory database lives as long as the
    /// repository.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database location: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn database_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn bind_tier<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    tier: &TierSnapshot,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(tier.config.calc_type.as_str())
        .bind(decimal_to_text(tier.config.rate))
        .bind(decimal_to_text(tier.config.developers_rate))
        .bind(tier.config.ewt_rate.as_str())
        .bind(tier.result.net_of_vat.map(decimal_to_text))
        .bind(tier.result.amount.map(decimal_to_text))
        .bind(tier.result.vat.map(decimal_to_text))
        .bind(tier.result.ewt.map(decimal_to_text))
        .bind(tier.result.net_commission.map(decimal_to_text))
}

fn get_text(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<String, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", column, e)))
}

fn row_to_tier(
    row: &sqlx::sqlite::SqliteRow,
    tier: Tier,
) -> Result<TierSnapshot, RepositoryError> {
    let prefix = tier.as_str();
    let column = |name: &str| format!("{prefix}_{name}");

    let calc_type_text = get_text(row, &column("calc_type"))?;
    let calc_type = CalculationTreatment::parse(&calc_type_text).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid calculation type: {}", calc_type_text))
    })?;
    let ewt_text = get_text(row, &column("ewt_rate"))?;
    let ewt_rate = WithholdingRate::parse(&ewt_text)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid EWT rate: {}", ewt_text)))?;

    Ok(TierSnapshot {
        config: RateConfig {
            rate: get_decimal(row, &column("rate"))?,
            developers_rate: get_decimal(row, &column("developers_rate"))?,
            ewt_rate,
            calc_type,
        },
        result: TierResult {
            net_of_vat: get_optional_decimal(row, &column("net_of_vat"))?,
            amount: get_optional_decimal(row, &column("amount"))?,
            vat: get_optional_decimal(row, &column("vat"))?,
            ewt: get_optional_decimal(row, &column("ewt"))?,
            net_commission: get_optional_decimal(row, &column("net_commission"))?,
        },
    })
}

fn row_to_stored_record(row: &sqlx::sqlite::SqliteRow) -> Result<StoredRecord, RepositoryError> {
    let kind_text = get_text(row, "commission_kind")?;
    let commission_kind = CommissionKind::parse(&kind_text).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid commission kind: {}", kind_text))
    })?;
    let record_id: i64 = row.try_get("record_id").map_err(database_error)?;
    let sequence_no: i64 = row.try_get("sequence_no").map_err(database_error)?;

    let snapshot = RecordSnapshot {
        id: record_id as u64,
        sequence_no: sequence_no as u32,
        date: row
            .try_get::<NaiveDate, _>("record_date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get record_date: {}", e)))?,
        developer_name: get_text(row, "record_developer_name")?,
        agent_name: get_text(row, "agent_name")?,
        client_name: get_text(row, "client_name")?,
        reservation_date: row.try_get::<Option<NaiveDate>, _>("reservation_date").map_err(
            |e| RepositoryError::Database(format!("Failed to get reservation_date: {}", e)),
        )?,
        base_commission: get_optional_decimal(row, "base_commission")?,
        base_amount_hint: get_optional_decimal(row, "base_amount_hint")?,
        commission_kind,
        status: get_text(row, "status")?,
        bdo_account: get_text(row, "bdo_account")?,
        remarks: get_text(row, "remarks")?,
        agent: row_to_tier(row, Tier::Agent)?,
        unit_manager: row_to_tier(row, Tier::UnitManager)?,
        team_leader: row_to_tier(row, Tier::TeamLeader)?,
    };

    Ok(StoredRecord {
        id: row.try_get("id").map_err(database_error)?,
        key: GroupKey::new(
            get_text(row, "developer_name")?,
            get_text(row, "invoice_no")?,
        ),
        snapshot,
    })
}

#[async_trait]
impl CommissionRepository for SqliteRepository {
    async fn save_record(
        &self,
        key: &GroupKey,
        snapshot: &RecordSnapshot,
    ) -> Result<i64, RepositoryError> {
        let now = Utc::now();

        let query = sqlx::query(
            "INSERT INTO commission_record (
                record_id, developer_name, record_developer_name, invoice_no, sequence_no,
                record_date,
                agent_name, client_name, reservation_date, base_commission, base_amount_hint,
                commission_kind, status, bdo_account, remarks,
                agent_calc_type, agent_rate, agent_developers_rate, agent_ewt_rate,
                agent_net_of_vat, agent_amount, agent_vat, agent_ewt, agent_net_commission,
                um_calc_type, um_rate, um_developers_rate, um_ewt_rate,
                um_net_of_vat, um_amount, um_vat, um_ewt, um_net_commission,
                tl_calc_type, tl_rate, tl_developers_rate, tl_ewt_rate,
                tl_net_of_vat, tl_amount, tl_vat, tl_ewt, tl_net_commission,
                created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?
            )
            ON CONFLICT (developer_name, invoice_no, record_id) DO UPDATE SET
                record_developer_name = excluded.record_developer_name,
                sequence_no = excluded.sequence_no,
                record_date = excluded.record_date,
                agent_name = excluded.agent_name,
                client_name = excluded.client_name,
                reservation_date = excluded.reservation_date,
                base_commission = excluded.base_commission,
                base_amount_hint = excluded.base_amount_hint,
                commission_kind = excluded.commission_kind,
                status = excluded.status,
                bdo_account = excluded.bdo_account,
                remarks = excluded.remarks,
                agent_calc_type = excluded.agent_calc_type,
                agent_rate = excluded.agent_rate,
                agent_developers_rate = excluded.agent_developers_rate,
                agent_ewt_rate = excluded.agent_ewt_rate,
                agent_net_of_vat = excluded.agent_net_of_vat,
                agent_amount = excluded.agent_amount,
                agent_vat = excluded.agent_vat,
                agent_ewt = excluded.agent_ewt,
                agent_net_commission = excluded.agent_net_commission,
                um_calc_type = excluded.um_calc_type,
                um_rate = excluded.um_rate,
                um_developers_rate = excluded.um_developers_rate,
                um_ewt_rate = excluded.um_ewt_rate,
                um_net_of_vat = excluded.um_net_of_vat,
                um_amount = excluded.um_amount,
                um_vat = excluded.um_vat,
                um_ewt = excluded.um_ewt,
                um_net_commission = excluded.um_net_commission,
                tl_calc_type = excluded.tl_calc_type,
                tl_rate = excluded.tl_rate,
                tl_developers_rate = excluded.tl_developers_rate,
                tl_ewt_rate = excluded.tl_ewt_rate,
                tl_net_of_vat = excluded.tl_net_of_vat,
                tl_amount = excluded.tl_amount,
                tl_vat = excluded.tl_vat,
                tl_ewt = excluded.tl_ewt,
                tl_net_commission = excluded.tl_net_commission,
                updated_at = excluded.updated_at
            RETURNING id",
        )
        .bind(snapshot.id as i64)
        .bind(key.developer_name.as_str())
        .bind(snapshot.developer_name.as_str())
        .bind(key.invoice_no.as_str())
        .bind(snapshot.sequence_no as i64)
        .bind(snapshot.date)
        .bind(snapshot.agent_name.as_str())
        .bind(snapshot.client_name.as_str())
        .bind(snapshot.reservation_date)
        .bind(snapshot.base_commission.map(decimal_to_text))
        .bind(snapshot.base_amount_hint.map(decimal_to_text))
        .bind(snapshot.commission_kind.as_str())
        .bind(snapshot.status.as_str())
        .bind(snapshot.bdo_account.as_str())
        .bind(snapshot.remarks.as_str());

        let query = bind_tier(query, &snapshot.agent);
        let query = bind_tier(query, &snapshot.unit_manager);
        let query = bind_tier(query, &snapshot.team_leader);

        let row = query
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)?;

        let id: i64 = row.try_get("id").map_err(database_error)?;
        debug!(group = %key, record = snapshot.id, id, "record saved");
        Ok(id)
    }

    async fn get_record(
        &self,
        id: i64,
    ) -> Result<StoredRecord, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM commission_record WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_stored_record(&row)
    }

    async fn list_records(
        &self,
        key: &GroupKey,
    ) -> Result<Vec<StoredRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM commission_record
             WHERE developer_name = ? AND invoice_no = ?
             ORDER BY sequence_no"
        ))
        .bind(key.developer_name.as_str())
        .bind(key.invoice_no.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_stored_record).collect()
    }

    async fn delete_record(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM commission_record WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn retain_records(
        &self,
        key: &GroupKey,
        keep: &[RecordId],
    ) -> Result<u64, RepositoryError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("DELETE FROM commission_record WHERE developer_name = ");
        builder
            .push_bind(key.developer_name.as_str())
            .push(" AND invoice_no = ")
            .push_bind(key.invoice_no.as_str());
        if !keep.is_empty() {
            builder.push(" AND record_id NOT IN (");
            let mut ids = builder.separated(", ");
            for id in keep {
                ids.push_bind(*id as i64);
            }
            ids.push_unseparated(")");
        }

        let removed = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(database_error)?
            .rows_affected();
        debug!(group = %key, removed, "stale records pruned");
        Ok(removed)
    }

    async fn list_groups(&self) -> Result<Vec<GroupKey>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT developer_name, invoice_no FROM commission_record
             ORDER BY developer_name, invoice_no",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter()
            .map(|row| -> Result<GroupKey, RepositoryError> {
                Ok(GroupKey::new(
                    get_text(row, "developer_name")?,
                    get_text(row, "invoice_no")?,
                ))
            })
            .collect()
    }
}
