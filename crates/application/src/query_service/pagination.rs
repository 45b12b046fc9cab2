use quire_core::AppResult;
use quire_domain::Record;

use crate::{Dataset, RecordStore, RecordWindow};

use super::{Page, PageRequest, PageSize};

/// Slices a dataset into one page.
///
/// Lazy datasets are counted and windowed by the store; materialized ones are sliced in memory.
pub async fn paginate(
    store: &dyn RecordStore,
    dataset: Dataset,
    request: PageRequest,
) -> AppResult<Page<Record>> {
    match dataset {
        Dataset::Query(query) => match request.page_size {
            PageSize::Limited(limit) => {
                let total_count = store.count_records(&query).await?;
                let items = store
                    .query_records(
                        &query,
                        Some(RecordWindow {
                            offset: request.offset(),
                            limit,
                        }),
                    )
                    .await?;
                Ok(Page::new(items, request, total_count))
            }
            PageSize::All => {
                let items = store.query_records(&query, None).await?;
                let total_count = items.len();
                Ok(Page::new(items, request, total_count))
            }
        },
        Dataset::Materialized(records) => {
            let total_count = records.len();
            let items = match request.page_size {
                PageSize::Limited(limit) => records
                    .into_iter()
                    .skip(request.offset())
                    .take(limit)
                    .collect(),
                PageSize::All => records,
            };
            Ok(Page::new(items, request, total_count))
        }
    }
}
