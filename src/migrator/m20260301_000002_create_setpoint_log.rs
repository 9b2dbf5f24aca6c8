use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SetpointLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SetpointLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SetpointLog::SiteId).integer().not_null())
                    .col(ColumnDef::new(SetpointLog::ZoneId).integer())
                    .col(ColumnDef::new(SetpointLog::Trigger).string().not_null())
                    .col(ColumnDef::new(SetpointLog::Phase).string().not_null())
                    .col(ColumnDef::new(SetpointLog::EntityId).string())
                    .col(ColumnDef::new(SetpointLog::ZoneTempF).double())
                    .col(ColumnDef::new(SetpointLog::SupplyTempF).double())
                    .col(ColumnDef::new(SetpointLog::ReturnTempF).double())
                    .col(ColumnDef::new(SetpointLog::CompressorOn).boolean())
                    .col(ColumnDef::new(SetpointLog::Payload).json().not_null())
                    .col(
                        ColumnDef::new(SetpointLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SetpointLog::Table, SetpointLog::SiteId)
                            .to(Site::Table, Site::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SetpointLog::Table, SetpointLog::ZoneId)
                            .to(Zone::Table, Zone::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Trailing-window reads for cycling anomalies scan by zone + time.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_setpoint_log_zone_created")
                    .table(SetpointLog::Table)
                    .col(SetpointLog::ZoneId)
                    .col(SetpointLog::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SetpointLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SetpointLog {
    Table,
    Id,
    SiteId,
    ZoneId,
    Trigger,
    Phase,
    EntityId,
    ZoneTempF,
    SupplyTempF,
    ReturnTempF,
    CompressorOn,
    Payload,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Zone {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Id,
}
