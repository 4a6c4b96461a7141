use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod account {
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "accounts")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub username: String,
        #[sea_orm(unique)]
        pub email: String,
        #[sea_orm(column_type = "Text")]
        pub password_hash: String,
        pub activation_code: String,
        pub activation_datetime: Option<DateTimeUtc>,
        pub recovery_code: String,
        pub recovery_datetime: Option<DateTimeUtc>,
        pub delete_code: String,
        pub delete_datetime: Option<DateTimeUtc>,
        pub unlock_code: String,
        pub created: DateTimeUtc,
        pub language: String,
        pub two_factor: Option<bool>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00001_create_account"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(account::Entity))
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(account::Entity).to_owned())
            .await
    }
}
