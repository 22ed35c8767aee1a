// Generic object lookups by type or reference.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::gateway::Gateway;
use crate::query::Query;

impl Gateway {
    /// All objects of one type (`Users`, `Groups`, `DHCPScopes`, ...).
    ///
    /// Returns the unwrapped `result` member as-is; its shape differs per
    /// object type.
    pub async fn get_refs(&self, object_type: &str) -> Result<Value, Error> {
        debug!(object_type, "listing objects");
        self.get(object_type, &Query::new())
            .await?
            .result_or_default()
    }

    /// One object by reference (`Ranges/12`, `IPAMRecords/172.16.17.5`).
    pub async fn get_single_ref<T: DeserializeOwned>(&self, reference: &str) -> Result<T, Error> {
        debug!(reference, "fetching object");
        self.get(reference, &Query::new()).await?.result()
    }
}
