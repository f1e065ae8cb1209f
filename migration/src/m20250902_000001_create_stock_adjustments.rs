use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}

/// Stock adjustments (库存调整审计记录，只追加不修改)
#[derive(DeriveIden)]
enum StockAdjustments {
    Table,
    Id,
    ProductId,
    AdminId,
    PreviousStock,
    NewStock,
    Adjustment,
    Reason,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockAdjustments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockAdjustments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    // NULL 表示系统操作 (例如订单取消)
                    .col(ColumnDef::new(StockAdjustments::AdminId).big_integer().null())
                    .col(
                        ColumnDef::new(StockAdjustments::PreviousStock)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::NewStock)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAdjustments::Adjustment)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockAdjustments::Reason).text().null())
                    .col(
                        ColumnDef::new(StockAdjustments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // 不加 ON DELETE CASCADE，审计记录不能随商品一起删除
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_adjustments_product")
                            .from(StockAdjustments::Table, StockAdjustments::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_stock_adjustments_product_created")
                    .table(StockAdjustments::Table)
                    .col(StockAdjustments::ProductId)
                    .col(StockAdjustments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(StockAdjustments::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
