//! Create parking_spots table
//!
//! `vehicle_id` is the nullable occupant back-reference. Spots are never
//! deleted by the allocator, so the foreign key only restricts.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_vehicles::Vehicles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSpots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSpots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingSpots::SpotType).string().not_null())
                    .col(ColumnDef::new(ParkingSpots::VehicleId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_spots_vehicle")
                            .from(ParkingSpots::Table, ParkingSpots::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_vehicle")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::VehicleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_type_vehicle")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::SpotType)
                    .col(ParkingSpots::VehicleId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSpots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSpots {
    Table,
    Id,
    SpotType,
    VehicleId,
}
