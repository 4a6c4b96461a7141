use sea_orm_migration::prelude::*;

use crate::m00001_create_account::account;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00002_add_reminder_datetime"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(account::Entity)
                    .add_column(
                        ColumnDef::new(Alias::new("reminder_datetime"))
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(account::Entity)
                    .drop_column(Alias::new("reminder_datetime"))
                    .to_owned(),
            )
            .await
    }
}
