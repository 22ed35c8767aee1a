// IPAM record endpoints
//
// Record listing is paginated through `command/GetIPAMRecords` with
// `limit`/`offset`; single-address lookups go through `IPAMRecords/<addr>`.

use async_stream::try_stream;
use futures_util::Stream;
use tracing::debug;

use crate::error::Error;
use crate::gateway::Gateway;
use crate::models::{IpamRecord, IpamRecordPage, SingleIpamRecord};
use crate::query::Query;

/// Only assigned records are ever listed.
pub const ASSIGNED_FILTER: &str = "state=Assigned";

const IPAM_RECORDS_COMMAND: &str = "command/GetIPAMRecords";

impl Gateway {
    /// Fetch one page of assigned records for `range_name`.
    pub async fn ipam_records_page(
        &self,
        range_name: &str,
        limit: usize,
        offset: usize,
    ) -> Result<IpamRecordPage, Error> {
        let query = Query::new()
            .filter(ASSIGNED_FILTER)
            .param("rangeRef", range_name)
            .limit(limit)
            .offset(offset);
        self.get(IPAM_RECORDS_COMMAND, &query)
            .await?
            .result_or_default()
    }

    /// Stream every assigned record in `range_name`, page by page.
    ///
    /// Stops on an empty page or once `totalResults` records have been
    /// read. Only when the suite omits `totalResults` does a page shorter
    /// than `page_size` end the range. The first error ends the stream.
    pub fn ipam_records<'a>(
        &'a self,
        range_name: &'a str,
        page_size: usize,
    ) -> impl Stream<Item = Result<IpamRecord, Error>> + 'a {
        let page_size = page_size.max(1);

        try_stream! {
            let mut offset = 0usize;
            loop {
                let page = self.ipam_records_page(range_name, page_size, offset).await?;
                let fetched = page.ipam_records.len();
                debug!(range = range_name, offset, fetched, total = ?page.total_results, "fetched record page");

                for record in page.ipam_records {
                    yield record;
                }

                offset += fetched;
                let exhausted = match page.total_results {
                    Some(total) => offset >= total,
                    None => fetched < page_size,
                };
                if fetched == 0 || exhausted {
                    break;
                }
            }
        }
    }

    /// Full record for one address.
    ///
    /// `GET IPAMRecords/<address>`
    pub async fn ipam_record(&self, address: &str) -> Result<IpamRecord, Error> {
        debug!(address, "fetching IPAM record");
        let endpoint = format!("IPAMRecords/{}", address.trim());
        let single: SingleIpamRecord = self.get(&endpoint, &Query::new()).await?.result()?;
        Ok(single.ipam_record)
    }
}
