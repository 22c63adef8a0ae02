use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_master_list_table::Migration),
            Box::new(m20240601_000002_create_grns_table::Migration),
            Box::new(m20240601_000003_create_locations_table::Migration),
            Box::new(m20240601_000004_create_dock_locations_table::Migration),
            Box::new(m20240601_000005_create_products_table::Migration),
        ]
    }
}

mod m20240601_000001_create_master_list_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_master_list_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MasterListItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MasterListItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MasterListItems::ItemNo).string().not_null())
                        .col(
                            ColumnDef::new(MasterListItems::CreatedAt)
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
                        .name("idx_master_list_items_item_no")
                        .table(MasterListItems::Table)
                        .col(MasterListItems::ItemNo)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MasterListItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MasterListItems {
        Table,
        Id,
        ItemNo,
        CreatedAt,
    }
}

mod m20240601_000002_create_grns_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_grns_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Line items live inside the receipt row as a JSON document
            manager
                .create_table(
                    Table::create()
                        .table(Grns::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Grns::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Grns::PoNumber).string().not_null())
                        .col(ColumnDef::new(Grns::ReceivingNo).string().not_null())
                        .col(
                            ColumnDef::new(Grns::Status)
                                .string_len(16)
                                .not_null()
                                .default("Pending"),
                        )
                        .col(
                            ColumnDef::new(Grns::ReceivingDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Grns::Supplier).string().not_null().default(""))
                        .col(
                            ColumnDef::new(Grns::OkQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Grns::RejectedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Grns::Items).json().not_null())
                        .col(
                            ColumnDef::new(Grns::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Grns::UpdatedAt)
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
                        .name("idx_grns_receiving_no")
                        .table(Grns::Table)
                        .col(Grns::ReceivingNo)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_grns_status")
                        .table(Grns::Table)
                        .col(Grns::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_grns_po_number")
                        .table(Grns::Table)
                        .col(Grns::PoNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Grns::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Grns {
        Table,
        Id,
        PoNumber,
        ReceivingNo,
        Status,
        ReceivingDate,
        Supplier,
        OkQuantity,
        RejectedQuantity,
        Items,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000003_create_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Locations::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Locations::LocationCode).string().not_null())
                        .col(ColumnDef::new(Locations::Capacity).integer().not_null())
                        .col(
                            ColumnDef::new(Locations::CurrentLoad)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Locations::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Locations::Products).json().not_null())
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Locations::UpdatedAt)
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
                        .name("idx_locations_location_code")
                        .table(Locations::Table)
                        .col(Locations::LocationCode)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
        LocationCode,
        Capacity,
        CurrentLoad,
        Stock,
        Products,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000004_create_dock_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_dock_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DockLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DockLocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DockLocations::DockCode).string().not_null())
                        .col(ColumnDef::new(DockLocations::Capacity).integer().not_null())
                        .col(ColumnDef::new(DockLocations::Description).string().null())
                        .col(
                            ColumnDef::new(DockLocations::LocationCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DockLocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DockLocations::UpdatedAt)
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
                        .name("idx_dock_locations_dock_code")
                        .table(DockLocations::Table)
                        .col(DockLocations::DockCode)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_dock_locations_location_code")
                        .table(DockLocations::Table)
                        .col(DockLocations::LocationCode)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DockLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DockLocations {
        Table,
        Id,
        DockCode,
        Capacity,
        Description,
        LocationCode,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000005_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Description).string().null())
                        .col(
                            ColumnDef::new(Products::MinStockLevel)
                                .integer()
                                .not_null()
                                .default(10),
                        )
                        .col(
                            ColumnDef::new(Products::MaxStockLevel)
                                .integer()
                                .not_null()
                                .default(100),
                        )
                        .col(
                            ColumnDef::new(Products::TotalStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::Amount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
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
                        .name("idx_products_sku")
                        .table(Products::Table)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Sku,
        Description,
        MinStockLevel,
        MaxStockLevel,
        TotalStock,
        Amount,
        LocationId,
        CreatedAt,
        UpdatedAt,
    }
}
