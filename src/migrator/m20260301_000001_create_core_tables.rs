use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Site::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Site::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Site::Name).string().not_null())
                    .col(
                        ColumnDef::new(Site::UtcOffsetMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Site::Notes).text())
                    .col(
                        ColumnDef::new(Site::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Equipment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Equipment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Equipment::SiteId).integer().not_null())
                    .col(ColumnDef::new(Equipment::Name).string().not_null())
                    .col(ColumnDef::new(Equipment::EquipmentType).string().not_null())
                    .col(
                        ColumnDef::new(Equipment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Equipment::Table, Equipment::SiteId)
                            .to(Site::Table, Site::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profile::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profile::Name).string().not_null())
                    .col(ColumnDef::new(Profile::OrgId).integer())
                    .col(
                        ColumnDef::new(Profile::IsGlobal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Profile::OccupiedHeatF).double())
                    .col(ColumnDef::new(Profile::OccupiedCoolF).double())
                    .col(ColumnDef::new(Profile::OccupiedHvacMode).string())
                    .col(ColumnDef::new(Profile::OccupiedFanMode).string())
                    .col(ColumnDef::new(Profile::UnoccupiedHeatF).double())
                    .col(ColumnDef::new(Profile::UnoccupiedCoolF).double())
                    .col(ColumnDef::new(Profile::UnoccupiedHvacMode).string())
                    .col(ColumnDef::new(Profile::UnoccupiedFanMode).string())
                    .col(
                        ColumnDef::new(Profile::FeelsLikeEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Profile::FeelsLikeMaxF)
                            .double()
                            .not_null()
                            .default(2.0),
                    )
                    .col(
                        ColumnDef::new(Profile::SmartStartEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Profile::SmartStartMaxF)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(
                        ColumnDef::new(Profile::SmartStartLeadMinutes)
                            .integer()
                            .not_null()
                            .default(60),
                    )
                    .col(
                        ColumnDef::new(Profile::OccupancyEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Profile::OccupancyMaxF)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(
                        ColumnDef::new(Profile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Profile::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Zone::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Zone::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Zone::SiteId).integer().not_null())
                    .col(ColumnDef::new(Zone::Name).string().not_null())
                    .col(ColumnDef::new(Zone::EquipmentId).integer().not_null())
                    .col(
                        ColumnDef::new(Zone::ThermostatEntityId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Zone::ProfileId).integer())
                    .col(
                        ColumnDef::new(Zone::IsOverride)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Zone::OccupiedHeatF).double())
                    .col(ColumnDef::new(Zone::OccupiedCoolF).double())
                    .col(ColumnDef::new(Zone::OccupiedHvacMode).string())
                    .col(ColumnDef::new(Zone::OccupiedFanMode).string())
                    .col(ColumnDef::new(Zone::UnoccupiedHeatF).double())
                    .col(ColumnDef::new(Zone::UnoccupiedCoolF).double())
                    .col(ColumnDef::new(Zone::UnoccupiedHvacMode).string())
                    .col(ColumnDef::new(Zone::UnoccupiedFanMode).string())
                    .col(
                        ColumnDef::new(Zone::GuardrailMinF)
                            .double()
                            .not_null()
                            .default(45.0),
                    )
                    .col(
                        ColumnDef::new(Zone::GuardrailMaxF)
                            .double()
                            .not_null()
                            .default(95.0),
                    )
                    .col(
                        ColumnDef::new(Zone::ManagerOffsetMaxF)
                            .double()
                            .not_null()
                            .default(4.0),
                    )
                    .col(ColumnDef::new(Zone::AnomalyThresholds).json_binary())
                    .col(ColumnDef::new(Zone::LastKnownState).json_binary())
                    .col(ColumnDef::new(Zone::LastDirective).text())
                    .col(
                        ColumnDef::new(Zone::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Zone::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Zone::Table, Zone::SiteId)
                            .to(Site::Table, Site::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Zone::Table, Zone::ProfileId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Space::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Space::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Space::ZoneId).integer().not_null())
                    .col(ColumnDef::new(Space::Name).string().not_null())
                    .col(ColumnDef::new(Space::ZoneWeight).double())
                    .col(
                        ColumnDef::new(Space::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Space::Table, Space::ZoneId)
                            .to(Zone::Table, Zone::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SensorEntity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorEntity::EntityId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorEntity::SpaceId).integer())
                    .col(ColumnDef::new(SensorEntity::EquipmentId).integer())
                    .col(ColumnDef::new(SensorEntity::Role).string().not_null())
                    .col(ColumnDef::new(SensorEntity::Weight).double())
                    .col(ColumnDef::new(SensorEntity::LastValue).string())
                    .col(ColumnDef::new(SensorEntity::LastSeen).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(SensorEntity::Table, SensorEntity::SpaceId)
                            .to(Space::Table, Space::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoreHours::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoreHours::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StoreHours::SiteId).integer().not_null())
                    .col(
                        ColumnDef::new(StoreHours::DayOfWeek)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StoreHours::OpenTime).time())
                    .col(ColumnDef::new(StoreHours::CloseTime).time())
                    .col(
                        ColumnDef::new(StoreHours::Closed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StoreHours::Table, StoreHours::SiteId)
                            .to(Site::Table, Site::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HoursException::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HoursException::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HoursException::SiteId).integer().not_null())
                    .col(ColumnDef::new(HoursException::Kind).string().not_null())
                    .col(ColumnDef::new(HoursException::StartDate).date().not_null())
                    .col(ColumnDef::new(HoursException::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(HoursException::Closed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(HoursException::OpenTime).time())
                    .col(ColumnDef::new(HoursException::CloseTime).time())
                    .col(ColumnDef::new(HoursException::FirstOpenTime).time())
                    .col(ColumnDef::new(HoursException::FirstCloseTime).time())
                    .col(ColumnDef::new(HoursException::MiddleOpenTime).time())
                    .col(ColumnDef::new(HoursException::MiddleCloseTime).time())
                    .col(ColumnDef::new(HoursException::LastOpenTime).time())
                    .col(ColumnDef::new(HoursException::LastCloseTime).time())
                    .foreign_key(
                        ForeignKey::create()
                            .from(HoursException::Table, HoursException::SiteId)
                            .to(Site::Table, Site::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HoursException::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StoreHours::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SensorEntity::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Space::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Zone::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Equipment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Site::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Id,
    Name,
    UtcOffsetMinutes,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Equipment {
    Table,
    Id,
    SiteId,
    Name,
    EquipmentType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Profile {
    Table,
    Id,
    Name,
    OrgId,
    IsGlobal,
    OccupiedHeatF,
    OccupiedCoolF,
    OccupiedHvacMode,
    OccupiedFanMode,
    UnoccupiedHeatF,
    UnoccupiedCoolF,
    UnoccupiedHvacMode,
    UnoccupiedFanMode,
    FeelsLikeEnabled,
    FeelsLikeMaxF,
    SmartStartEnabled,
    SmartStartMaxF,
    SmartStartLeadMinutes,
    OccupancyEnabled,
    OccupancyMaxF,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Zone {
    Table,
    Id,
    SiteId,
    Name,
    EquipmentId,
    ThermostatEntityId,
    ProfileId,
    IsOverride,
    OccupiedHeatF,
    OccupiedCoolF,
    OccupiedHvacMode,
    OccupiedFanMode,
    UnoccupiedHeatF,
    UnoccupiedCoolF,
    UnoccupiedHvacMode,
    UnoccupiedFanMode,
    GuardrailMinF,
    GuardrailMaxF,
    ManagerOffsetMaxF,
    AnomalyThresholds,
    LastKnownState,
    LastDirective,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Space {
    Table,
    Id,
    ZoneId,
    Name,
    ZoneWeight,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SensorEntity {
    Table,
    EntityId,
    SpaceId,
    EquipmentId,
    Role,
    Weight,
    LastValue,
    LastSeen,
}

#[derive(DeriveIden)]
enum StoreHours {
    Table,
    Id,
    SiteId,
    DayOfWeek,
    OpenTime,
    CloseTime,
    Closed,
}

#[derive(DeriveIden)]
enum HoursException {
    Table,
    Id,
    SiteId,
    Kind,
    StartDate,
    EndDate,
    Closed,
    OpenTime,
    CloseTime,
    FirstOpenTime,
    FirstCloseTime,
    MiddleOpenTime,
    MiddleCloseTime,
    LastOpenTime,
    LastCloseTime,
}
