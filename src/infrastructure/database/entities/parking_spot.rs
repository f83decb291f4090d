//! ParkingSpot entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "parking_spots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Spot type: MOTORCYCLE, COMPACT, REGULAR
    pub spot_type: String,

    /// Occupying vehicle, NULL when the spot is free
    #[sea_orm(nullable)]
    pub vehicle_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
