use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profile::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profile::Username).string().not_null())
                    .col(ColumnDef::new(Profile::DisplayName).string().null())
                    .col(ColumnDef::new(Profile::ReferralCode).string().null())
                    .col(
                        ColumnDef::new(Profile::ReferralsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Profile::InviteQuota)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Profile::InvitesUsed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Profile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_profiles_username")
                    .table(Profile::Table)
                    .col(Profile::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Referral codes are looked up on every attribution request
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_profiles_referral_code")
                    .table(Profile::Table)
                    .col(Profile::ReferralCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReferralChain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferralChain::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReferralChain::ReferrerProfileId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralChain::ReferredProfileId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralChain::ReferralCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralChain::AttributionType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralChain::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // A profile can be referred at most once. The uniqueness constraint
        // backs the application-level pre-check so concurrent duplicate
        // attributions cannot both land.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referral_chains_referred")
                    .table(ReferralChain::Table)
                    .col(ReferralChain::ReferredProfileId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referral_chains_referrer")
                    .table(ReferralChain::Table)
                    .col(ReferralChain::ReferrerProfileId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_referral_chains_referrer").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_referral_chains_referred").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ReferralChain::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_profiles_referral_code").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_profiles_username").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Profile {
    #[sea_orm(iden = "profiles")]
    Table,
    Id,
    Username,
    DisplayName,
    ReferralCode,
    ReferralsCount,
    InviteQuota,
    InvitesUsed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReferralChain {
    #[sea_orm(iden = "referral_chains")]
    Table,
    Id,
    ReferrerProfileId,
    ReferredProfileId,
    ReferralCode,
    AttributionType,
    CreatedAt,
}
