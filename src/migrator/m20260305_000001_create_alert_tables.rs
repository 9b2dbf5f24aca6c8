use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertDefinition::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertDefinition::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AlertDefinition::Name).string().not_null())
                    .col(
                        ColumnDef::new(AlertDefinition::TargetKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AlertDefinition::EntityId).string())
                    .col(ColumnDef::new(AlertDefinition::EquipmentType).string())
                    .col(ColumnDef::new(AlertDefinition::SensorRole).string())
                    .col(ColumnDef::new(AlertDefinition::Metric).string())
                    .col(
                        ColumnDef::new(AlertDefinition::ConditionType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AlertDefinition::ThresholdValue).double())
                    .col(ColumnDef::new(AlertDefinition::TargetValue).string())
                    .col(ColumnDef::new(AlertDefinition::TargetValueType).string())
                    .col(ColumnDef::new(AlertDefinition::StaleMinutes).integer())
                    .col(ColumnDef::new(AlertDefinition::DeltaValue).double())
                    .col(ColumnDef::new(AlertDefinition::DeltaDirection).string())
                    .col(ColumnDef::new(AlertDefinition::WindowMinutes).integer())
                    .col(
                        ColumnDef::new(AlertDefinition::SustainMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AlertDefinition::EvalPath)
                            .string()
                            .not_null()
                            .default("auto"),
                    )
                    .col(
                        ColumnDef::new(AlertDefinition::Scope)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertDefinition::Severity)
                            .string()
                            .not_null()
                            .default("warning"),
                    )
                    .col(
                        ColumnDef::new(AlertDefinition::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AlertDefinition::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AlertEvalState::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertEvalState::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AlertEvalState::DefinitionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertEvalState::TargetKey)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AlertEvalState::LastValue).string())
                    .col(
                        ColumnDef::new(AlertEvalState::LastValueTs)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(AlertEvalState::ConditionMet)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AlertEvalState::ConditionMetSince)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(AlertEvalState::Fired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AlertEvalState::Window)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertEvalState::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AlertEvalState::Table, AlertEvalState::DefinitionId)
                            .to(AlertDefinition::Table, AlertDefinition::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uniq_eval_state_definition_target")
                    .table(AlertEvalState::Table)
                    .col(AlertEvalState::DefinitionId)
                    .col(AlertEvalState::TargetKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AlertInstance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertInstance::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AlertInstance::DefinitionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertInstance::TargetKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertInstance::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(AlertInstance::FirstDetectedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertInstance::FiredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertInstance::ResolvedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(AlertInstance::TriggerValue).string())
                    .col(ColumnDef::new(AlertInstance::PeakValue).double())
                    .col(ColumnDef::new(AlertInstance::LastValue).string())
                    .col(
                        ColumnDef::new(AlertInstance::Context)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertInstance::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AlertInstance::Table, AlertInstance::DefinitionId)
                            .to(AlertDefinition::Table, AlertDefinition::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Partial unique index: at most one active instance per
        // (definition, target). sea-query has no builder for the WHERE
        // clause, so raw SQL it is.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uniq_alert_instance_active \
                 ON alert_instance (definition_id, target_key) \
                 WHERE status = 'active'",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AlertSubscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertSubscription::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::DefinitionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::RecipientName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AlertSubscription::Email).string())
                    .col(ColumnDef::new(AlertSubscription::Phone).string())
                    .col(
                        ColumnDef::new(AlertSubscription::DashboardEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::EmailEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::SmsEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AlertSubscription::QuietHoursStart).time())
                    .col(ColumnDef::new(AlertSubscription::QuietHoursEnd).time())
                    .col(
                        ColumnDef::new(AlertSubscription::UtcOffsetMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::SendResolved)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::MaxRepeats)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::RepeatIntervalMinutes)
                            .integer()
                            .not_null()
                            .default(60),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AlertSubscription::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AlertSubscription::Table, AlertSubscription::DefinitionId)
                            .to(AlertDefinition::Table, AlertDefinition::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notification::InstanceId).uuid().not_null())
                    .col(ColumnDef::new(Notification::SubscriptionId).uuid())
                    .col(ColumnDef::new(Notification::Channel).string().not_null())
                    .col(ColumnDef::new(Notification::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Notification::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Notification::Recipient).string())
                    .col(ColumnDef::new(Notification::Title).string().not_null())
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(ColumnDef::new(Notification::Severity).string().not_null())
                    .col(
                        ColumnDef::new(Notification::RepeatSeq)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Notification::Error).text())
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::SentAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Notification::Table, Notification::InstanceId)
                            .to(AlertInstance::Table, AlertInstance::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AlertSubscription::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AlertInstance::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AlertEvalState::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AlertDefinition::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AlertDefinition {
    Table,
    Id,
    Name,
    TargetKind,
    EntityId,
    EquipmentType,
    SensorRole,
    Metric,
    ConditionType,
    ThresholdValue,
    TargetValue,
    TargetValueType,
    StaleMinutes,
    DeltaValue,
    DeltaDirection,
    WindowMinutes,
    SustainMinutes,
    EvalPath,
    Scope,
    Severity,
    Enabled,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AlertEvalState {
    Table,
    Id,
    DefinitionId,
    TargetKey,
    LastValue,
    LastValueTs,
    ConditionMet,
    ConditionMetSince,
    Fired,
    Window,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AlertInstance {
    Table,
    Id,
    DefinitionId,
    TargetKey,
    Status,
    FirstDetectedAt,
    FiredAt,
    ResolvedAt,
    TriggerValue,
    PeakValue,
    LastValue,
    Context,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AlertSubscription {
    Table,
    Id,
    DefinitionId,
    RecipientName,
    Email,
    Phone,
    DashboardEnabled,
    EmailEnabled,
    SmsEnabled,
    QuietHoursStart,
    QuietHoursEnd,
    UtcOffsetMinutes,
    SendResolved,
    MaxRepeats,
    RepeatIntervalMinutes,
    Enabled,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notification {
    Table,
    Id,
    InstanceId,
    SubscriptionId,
    Channel,
    Kind,
    Status,
    Recipient,
    Title,
    Message,
    Severity,
    RepeatSeq,
    Error,
    CreatedAt,
    SentAt,
}
