use serde::{Deserialize, Serialize};

use crate::{check::CheckConfig, database::DatabaseConfig};

#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
pub struct BackendConfig {
	pub database: DatabaseConfig,
	pub check: CheckConfig,
}
