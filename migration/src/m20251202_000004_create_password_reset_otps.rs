use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PasswordResetOtps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordResetOtps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PasswordResetOtps::Email).string_len(255).not_null())
                    .col(ColumnDef::new(PasswordResetOtps::OtpHash).string().not_null())
                    .col(ColumnDef::new(PasswordResetOtps::ExpiresAt).big_integer().not_null())
                    .col(ColumnDef::new(PasswordResetOtps::IsVerified).boolean().not_null().default(false))
                    .col(ColumnDef::new(PasswordResetOtps::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_password_reset_otps_email")
                    .table(PasswordResetOtps::Table)
                    .col(PasswordResetOtps::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PasswordResetOtps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PasswordResetOtps {
    Table,
    Id,
    Email,
    OtpHash,
    ExpiresAt,
    IsVerified,
    CreatedAt,
}
