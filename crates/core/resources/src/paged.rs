use std::{collections::BTreeMap, fmt, sync::Arc};

use dashboard_coalesced::{CoalescionService, OperationKey};
use dashboard_config::{Pagination, Settings};
use dashboard_models::v0::{Page, PageRequest, Sort, SortDirection};
use dashboard_result::{create_error, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{EntitlementPolicy, Transport, TransportRequest};

/// Query parameters owned by the paging protocol
const RESERVED_PARAMS: [&str; 4] = ["page", "size", "sort", "order"];

/// Filters applied to a collection, `null` means unset
pub type FilterSet = BTreeMap<String, Value>;

/// Name of a paginated collection on the backend
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(name: impl Into<String>) -> Self {
        CollectionId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully resolved request, the identity of a page fetch
#[derive(Serialize)]
struct PageQuery<'a> {
    filters: &'a BTreeMap<&'a str, &'a Value>,
    index: u32,
    size: u32,
    sort: &'a Sort,
}

/// Page as sent by the backend
#[derive(Deserialize)]
struct PageBody<T> {
    items: Vec<T>,
    total: u64,
}

/// Retrieves pages of filterable, sortable collections.
///
/// Identical fetches in flight at the same time share one transport call.
/// Nothing is retried. Surfaces where only the latest response matters
/// should pair each call with a [`SequenceGuard`](crate::SequenceGuard).
pub struct PagedResourceFetcher<T> {
    transport: Arc<dyn Transport>,
    coalescion: CoalescionService<OperationKey, Page<T>>,
    pagination: Pagination,
    entitlement: EntitlementPolicy,
}

impl<T: DeserializeOwned + Send + Sync + 'static> PagedResourceFetcher<T> {
    pub fn new(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        PagedResourceFetcher {
            transport,
            coalescion: CoalescionService::from_config(crate::coalescion_config(settings)),
            pagination: settings.pagination.clone(),
            entitlement: (&settings.transport).into(),
        }
    }

    /// Fill in defaults so logically identical requests look identical
    fn resolve(&self, page: &PageRequest) -> Result<(u32, Sort)> {
        if page.size == 0 {
            return Err(create_error!(FailedValidation {
                error: "page size must be positive".to_string()
            }));
        }

        let size = page.size.min(self.pagination.max_page_size.max(1));
        let sort = page.sort.clone().unwrap_or_else(|| {
            Sort::new(
                self.pagination.default_sort_field.clone(),
                SortDirection::default(),
            )
        });

        Ok((size, sort))
    }

    /// Fetch one page of `collection`
    pub async fn fetch_page(
        &self,
        collection: &CollectionId,
        filters: &FilterSet,
        page: &PageRequest,
    ) -> Result<Arc<Page<T>>> {
        let (size, sort) = self.resolve(page)?;
        let index = page.index;

        let filters: BTreeMap<&str, &Value> = filters
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        if let Some(name) = filters.keys().find(|name| RESERVED_PARAMS.contains(*name)) {
            return Err(create_error!(FailedValidation {
                error: format!("filter `{name}` clashes with a paging parameter")
            }));
        }

        let key = OperationKey::build(
            collection.as_str(),
            &PageQuery {
                filters: &filters,
                index,
                size,
                sort: &sort,
            },
        )?;

        let mut request = TransportRequest::get(format!("/{collection}"))
            .param("page", index.to_string())
            .param("size", size.to_string())
            .param("sort", sort.field.clone())
            .param("order", sort.direction.as_str());

        for (name, value) in &filters {
            request = request.param(*name, filter_param(value));
        }

        let transport = self.transport.clone();
        let entitlement = self.entitlement.clone();

        self.coalescion
            .execute(key, move || async move {
                let body = transport.call(request).await.into_result(&entitlement)?;
                let body: PageBody<T> = serde_json::from_value(body).map_err(|error| {
                    create_error!(InvalidResponse {
                        error: error.to_string()
                    })
                })?;

                Ok::<_, dashboard_result::Error>(Page::new(
                    body.items,
                    index,
                    size,
                    body.total,
                    sort,
                ))
            })
            .await
    }

    /// Forget in-flight fetches, used on session reset
    pub fn clear(&self) {
        self.coalescion.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.coalescion.pending_count()
    }
}

fn filter_param(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}
