use sea_orm_migration::prelude::*;

use crate::m20251202_000002_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The unique key on user_id is what serializes concurrent logins.
        manager
            .create_table(
                Table::create()
                    .table(ActiveSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActiveSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActiveSessions::UserId).string().not_null().unique_key())
                    .col(ColumnDef::new(ActiveSessions::TokenId).string().not_null().unique_key())
                    .col(ColumnDef::new(ActiveSessions::DeviceName).string_len(255).not_null())
                    .col(ColumnDef::new(ActiveSessions::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ActiveSessions::UserAgent).text().null())
                    .col(ColumnDef::new(ActiveSessions::LastActivity).big_integer().not_null())
                    .col(ColumnDef::new(ActiveSessions::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_active_sessions_user_id")
                            .from(ActiveSessions::Table, ActiveSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActiveSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ActiveSessions {
    Table,
    Id,
    UserId,
    TokenId,
    DeviceName,
    IpAddress,
    UserAgent,
    LastActivity,
    CreatedAt,
}
