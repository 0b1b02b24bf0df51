use bon::Builder;

/// Query parameters for item list endpoints.
#[derive(Debug, Clone, Default, Builder)]
pub struct ItemListParams {
    /// Quick search over title, creator, and year (or everything with
    /// `qmode = "everything"`).
    #[builder(into)]
    pub q: Option<String>,
    #[builder(into)]
    pub qmode: Option<String>,
    /// Item type filter, e.g. `"note"` or `"-attachment || note"`.
    #[builder(into)]
    pub item_type: Option<String>,
    #[builder(into)]
    pub tag: Option<String>,
    /// Sort field: `dateAdded`, `dateModified`, `title`, `creator`, `date`, ...
    #[builder(into)]
    pub sort: Option<String>,
    /// `"asc"` or `"desc"`.
    #[builder(into)]
    pub direction: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<u32>,
}

impl ItemListParams {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_opt(&mut query, "q", self.q.as_deref());
        push_opt(&mut query, "qmode", self.qmode.as_deref());
        push_opt(&mut query, "itemType", self.item_type.as_deref());
        push_opt(&mut query, "tag", self.tag.as_deref());
        push_opt(&mut query, "sort", self.sort.as_deref());
        push_opt(&mut query, "direction", self.direction.as_deref());
        push_num(&mut query, "limit", self.limit);
        push_num(&mut query, "start", self.start);
        query
    }
}

/// Query parameters for collection list endpoints.
#[derive(Debug, Clone, Default, Builder)]
pub struct CollectionListParams {
    #[builder(into)]
    pub sort: Option<String>,
    #[builder(into)]
    pub direction: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<u32>,
}

impl CollectionListParams {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_opt(&mut query, "sort", self.sort.as_deref());
        push_opt(&mut query, "direction", self.direction.as_deref());
        push_num(&mut query, "limit", self.limit);
        push_num(&mut query, "start", self.start);
        query
    }
}

fn push_opt(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        query.push((name, value.to_string()));
    }
}

fn push_num(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<u32>) {
    if let Some(value) = value {
        query.push((name, value.to_string()));
    }
}
