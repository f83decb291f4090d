//! Vehicle entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Vehicle type: MOTORCYCLE, CAR, VAN
    pub vehicle_type: String,

    pub parked_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parking_spot::Entity")]
    ParkingSpots,
}

impl Related<super::parking_spot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingSpots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
