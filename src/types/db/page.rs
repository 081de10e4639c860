use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Technical name, the unit of permission granularity
    #[sea_orm(unique)]
    pub name: String,
    pub display_name: String,
    #[sea_orm(unique)]
    pub route: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub active: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
