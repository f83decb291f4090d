//! SeaORM implementation of LotStore
//!
//! Every park/leave runs inside one database transaction. Spot claims are
//! conditional updates (`... WHERE vehicle_id IS NULL`), so a writer that
//! lost a race sees zero affected rows and reports a retryable conflict
//! instead of overwriting the winner.

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    Statement, TransactionTrait,
};

use crate::domain::{
    DomainError, DomainResult, LotStore, LotTransaction, ParkingSpot, SpotId, SpotOccupancy,
    SpotType, Vehicle,
};
use crate::infrastructure::database::entities::{parking_spot, vehicle};

pub struct SeaOrmLotStore {
    db: DatabaseConnection,
}

impl SeaOrmLotStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn spot_to_domain(m: parking_spot::Model) -> DomainResult<ParkingSpot> {
    let spot_type = m.spot_type.parse::<SpotType>().map_err(|_| {
        DomainError::Storage(format!("spot {} has unknown type '{}'", m.id, m.spot_type))
    })?;
    Ok(ParkingSpot {
        id: m.id,
        spot_type,
        vehicle_id: m.vehicle_id,
    })
}

/// Lock contention and serialization failures mean another writer got there
/// first; everything else is an infrastructure failure.
fn is_contention(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    [
        "database is locked",
        "database table is locked",
        "could not serialize access",
        "deadlock detected",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

fn db_err(e: DbErr) -> DomainError {
    let message = e.to_string();
    if is_contention(&message) {
        DomainError::Conflict(message)
    } else {
        DomainError::Storage(format!("Database error: {}", message))
    }
}

async fn count_free<C: ConnectionTrait>(
    conn: &C,
    spot_types: Option<&[SpotType]>,
) -> Result<u64, DbErr> {
    let mut query =
        parking_spot::Entity::find().filter(parking_spot::Column::VehicleId.is_null());
    if let Some(types) = spot_types {
        query = query
            .filter(parking_spot::Column::SpotType.is_in(types.iter().map(|t| t.as_str())));
    }
    query.count(conn).await
}

// ── LotStore impl ───────────────────────────────────────────────

#[async_trait]
impl LotStore for SeaOrmLotStore {
    async fn begin(&self) -> DomainResult<Box<dyn LotTransaction>> {
        let txn = self.db.begin().await.map_err(db_err)?;
        Ok(Box::new(SeaOrmLotTransaction { txn }))
    }

    async fn count_free_spots(&self) -> DomainResult<u64> {
        count_free(&self.db, None).await.map_err(db_err)
    }

    async fn count_free_spots_by_types(&self, spot_types: &[SpotType]) -> DomainResult<u64> {
        count_free(&self.db, Some(spot_types)).await.map_err(db_err)
    }

    async fn occupancy(&self) -> DomainResult<Vec<SpotOccupancy>> {
        let rows: Vec<(String, i64, i64)> = parking_spot::Entity::find()
            .select_only()
            .column(parking_spot::Column::SpotType)
            .column_as(Expr::col(parking_spot::Column::Id).count(), "total")
            .column_as(Expr::col(parking_spot::Column::VehicleId).count(), "occupied")
            .group_by(parking_spot::Column::SpotType)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(SpotType::ALL
            .iter()
            .map(|&spot_type| {
                let (total, occupied) = rows
                    .iter()
                    .find(|(t, _, _)| t == spot_type.as_str())
                    .map(|(_, total, occupied)| (*total as u64, *occupied as u64))
                    .unwrap_or((0, 0));
                SpotOccupancy {
                    spot_type,
                    total,
                    free: total - occupied,
                }
            })
            .collect())
    }

    async fn provision_spots(&self, layout: &[(SpotType, u32)]) -> DomainResult<u64> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = parking_spot::Entity::find()
            .count(&txn)
            .await
            .map_err(db_err)?;
        if existing > 0 {
            debug!("Lot already has {} spots, skipping provisioning", existing);
            txn.rollback().await.map_err(db_err)?;
            return Ok(0);
        }

        let models: Vec<parking_spot::ActiveModel> = layout
            .iter()
            .flat_map(|&(spot_type, count)| (0..count).map(move |_| spot_type))
            .map(|spot_type| parking_spot::ActiveModel {
                id: NotSet,
                spot_type: Set(spot_type.as_str().to_string()),
                vehicle_id: Set(None),
            })
            .collect();

        let created = models.len() as u64;
        if created > 0 {
            parking_spot::Entity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }
        txn.commit().await.map_err(db_err)?;

        debug!("Provisioned {} parking spots", created);
        Ok(created)
    }

    async fn ping(&self) -> DomainResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

// ── LotTransaction impl ─────────────────────────────────────────

pub struct SeaOrmLotTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl LotTransaction for SeaOrmLotTransaction {
    async fn vehicle_exists(&mut self, vehicle_id: &str) -> DomainResult<bool> {
        let found = vehicle::Entity::find_by_id(vehicle_id.to_string())
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn insert_vehicle(&mut self, v: &Vehicle) -> DomainResult<()> {
        debug!("Saving vehicle: {}", v.id);

        let model = vehicle::ActiveModel {
            id: Set(v.id.clone()),
            vehicle_type: Set(v.vehicle_type.as_str().to_string()),
            parked_at: Set(v.parked_at),
        };
        match model.insert(&self.txn).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(DomainError::AlreadyParked(v.id.clone()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn delete_vehicle(&mut self, vehicle_id: &str) -> DomainResult<()> {
        debug!("Deleting vehicle: {}", vehicle_id);

        let result = vehicle::Entity::delete_by_id(vehicle_id.to_string())
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::VehicleNotFound(vehicle_id.to_string()));
        }
        Ok(())
    }

    async fn free_spots_by_types(
        &mut self,
        spot_types: &[SpotType],
    ) -> DomainResult<Vec<ParkingSpot>> {
        let models = parking_spot::Entity::find()
            .filter(parking_spot::Column::VehicleId.is_null())
            .filter(parking_spot::Column::SpotType.is_in(spot_types.iter().map(|t| t.as_str())))
            .order_by_asc(parking_spot::Column::Id)
            .all(&self.txn)
            .await
            .map_err(db_err)?;
        models.into_iter().map(spot_to_domain).collect()
    }

    async fn count_free_spots(&mut self) -> DomainResult<u64> {
        count_free(&self.txn, None).await.map_err(db_err)
    }

    async fn occupy(&mut self, spot_id: SpotId, vehicle_id: &str) -> DomainResult<()> {
        let result = parking_spot::Entity::update_many()
            .col_expr(parking_spot::Column::VehicleId, Expr::value(vehicle_id.to_string()))
            .filter(parking_spot::Column::Id.eq(spot_id))
            .filter(parking_spot::Column::VehicleId.is_null())
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::Conflict(format!(
                "spot {} is no longer free",
                spot_id
            )));
        }
        Ok(())
    }

    async fn spots_occupied_by(&mut self, vehicle_id: &str) -> DomainResult<Vec<SpotId>> {
        parking_spot::Entity::find()
            .select_only()
            .column(parking_spot::Column::Id)
            .filter(parking_spot::Column::VehicleId.eq(vehicle_id))
            .order_by_asc(parking_spot::Column::Id)
            .into_tuple::<SpotId>()
            .all(&self.txn)
            .await
            .map_err(db_err)
    }

    async fn release(&mut self, spot_id: SpotId) -> DomainResult<()> {
        parking_spot::Entity::update_many()
            .col_expr(parking_spot::Column::VehicleId, Expr::value(Option::<String>::None))
            .filter(parking_spot::Column::Id.eq(spot_id))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let this = *self;
        this.txn.commit().await.map_err(db_err)
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        let this = *self;
        this.txn.rollback().await.map_err(db_err)
    }
}

// ── Tests ──────────────────────────────────────────────────────
