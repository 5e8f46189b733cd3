use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Units::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Units::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Units::Code).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Units::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Units::Type).string_len(20).not_null())
                    .col(ColumnDef::new(Units::ParentUnitId).integer().null())
                    .col(ColumnDef::new(Units::Role).string_len(20).not_null())
                    .col(ColumnDef::new(Units::Description).text().null())
                    .col(ColumnDef::new(Units::PositionX).integer().null())
                    .col(ColumnDef::new(Units::PositionY).integer().null())
                    .col(ColumnDef::new(Units::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Units::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Units::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_units_parent_unit_id")
                            .from(Units::Table, Units::ParentUnitId)
                            .to(Units::Table, Units::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_units_parent_unit_id")
                    .table(Units::Table)
                    .col(Units::ParentUnitId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_units_type_is_active")
                    .table(Units::Table)
                    .col(Units::Type)
                    .col(Units::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Units::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Units {
    Table,
    Id,
    Code,
    Name,
    Type,
    ParentUnitId,
    Role,
    Description,
    PositionX,
    PositionY,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
