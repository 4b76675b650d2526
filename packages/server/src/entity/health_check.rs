use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per successful health check. Rows are append-only.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "health_check")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub check_id: i32,

    pub datetime: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
