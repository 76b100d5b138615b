auto_derived!(
    /// Direction to order a collection in
    #[derive(Copy, Hash, Default)]
    #[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
    pub enum SortDirection {
        Ascending,
        #[default]
        Descending,
    }

    /// Field and direction a page is ordered by
    #[derive(Hash)]
    pub struct Sort {
        /// Name of the field to order by
        pub field: String,
        /// Ordering direction
        pub direction: SortDirection,
    }

    /// Which page of a collection to retrieve
    #[derive(Hash)]
    pub struct PageRequest {
        /// Zero-based page index
        pub index: u32,
        /// Maximum number of items per page
        pub size: u32,
        /// Ordering, falls back to the collection default
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        pub sort: Option<Sort>,
    }

    /// One page of a collection
    pub struct Page<T> {
        /// Items on this page
        pub items: Vec<T>,
        /// Zero-based page index
        pub page_index: u32,
        /// Maximum number of items per page
        pub page_size: u32,
        /// Number of items across all pages
        pub total_items: u64,
        /// Number of pages
        pub total_pages: u64,
        /// Ordering that was applied
        pub sort: Sort,
    }
);

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Sort {
            field: field.into(),
            direction,
        }
    }
}

impl PageRequest {
    pub fn new(index: u32, size: u32) -> Self {
        PageRequest {
            index,
            size,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }
}

impl<T> Page<T> {
    /// Assemble a page, making sure `items.len() <= page_size` and
    /// `page_index < max(total_pages, 1)` hold regardless of what
    /// the backend reported.
    ///
    /// An index past the end is clamped to the last page. Items sent for
    /// the out of range index are dropped since they don't belong to it.
    pub fn new(
        mut items: Vec<T>,
        page_index: u32,
        page_size: u32,
        total_items: u64,
        sort: Sort,
    ) -> Self {
        let page_size = page_size.max(1);
        items.truncate(page_size as usize);

        let total_items = total_items.max(items.len() as u64);
        let total_pages = total_items.div_ceil(page_size as u64);

        let last_index = total_pages.saturating_sub(1).min(u32::MAX as u64) as u32;
        let page_index = if page_index > last_index || total_pages == 0 {
            items.clear();
            page_index.min(last_index)
        } else {
            page_index
        };

        Page {
            items,
            page_index,
            page_size,
            total_items,
            total_pages,
            sort,
        }
    }

    /// Page with nothing in it
    pub fn empty(page_size: u32, sort: Sort) -> Self {
        Page::new(Vec::new(), 0, page_size, 0, sort)
    }

    pub fn has_next(&self) -> bool {
        (self.page_index as u64 + 1) < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }
}
