use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub artisan_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub original_price: i64,
    pub suggested_price: Option<String>,
    pub category: String,
    pub tags: Json,
    pub features: Json,
    pub specifications: Json,
    pub story: String,
    pub transcription: Option<String>,
    pub status: String,
    pub ai_generated: bool,
    pub ai_metadata: Option<Json>,
    pub in_stock: bool,
    pub stock_count: i32,
    pub shipping_info: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ArtisanId",
        to = "super::users::Column::Id"
    )]
    Artisan,
    #[sea_orm(has_many = "super::listing_images::Entity")]
    ListingImages,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artisan.def()
    }
}

impl Related<super::listing_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListingImages.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
