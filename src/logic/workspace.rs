use crate::model::{Endpoint, EndpointStatus, HttpMethod};

/// Filter over a loaded endpoint set. Empty categories match everything;
/// within one category the listed values are ORed, across categories the
/// predicates are ANDed.
#[derive(Debug, Clone, Default)]
pub struct EndpointFilter {
    pub statuses: Vec<EndpointStatus>,
    pub methods: Vec<HttpMethod>,
    pub search: Option<String>,
}

impl EndpointFilter {
    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        let matches_status =
            self.statuses.is_empty() || self.statuses.contains(&endpoint.status);
        let matches_method = self.methods.is_empty() || self.methods.contains(&endpoint.method);
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                endpoint
                    .name
                    .as_deref()
                    .map(|n| n.to_lowercase().contains(&query))
                    .unwrap_or(false)
                    || endpoint.path.to_lowercase().contains(&query)
                    || endpoint
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&query))
                        .unwrap_or(false)
            }
        };
        matches_status && matches_method && matches_search
    }
}

/// The working set of endpoints loaded for the active project. Pure
/// derivations over the in-memory collection; no I/O.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    endpoints: Vec<Endpoint>,
}

impl Workspace {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn filtered<'a>(
        &'a self,
        filter: &'a EndpointFilter,
    ) -> impl Iterator<Item = &'a Endpoint> {
        self.endpoints.iter().filter(move |ep| filter.matches(ep))
    }

    /// Count of endpoints in CONFLICT, not of conflict records.
    pub fn conflicts_count(&self) -> usize {
        self.count_with_status(EndpointStatus::Conflict)
    }

    pub fn synced_count(&self) -> usize {
        self.count_with_status(EndpointStatus::Synced)
    }

    pub fn count_with_status(&self, status: EndpointStatus) -> usize {
        self.endpoints
            .iter()
            .filter(|ep| ep.status == status)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Endpoint;

    fn endpoint(path: &str, method: HttpMethod, status: EndpointStatus) -> Endpoint {
        let mut ep = Endpoint::new(
            "project-1".to_string(),
            path.to_string(),
            method,
            Some(format!("{} {}", method.as_str(), path)),
            Some("sample endpoint".to_string()),
        );
        ep.status = status;
        ep
    }

    fn workspace() -> Workspace {
        Workspace::new(vec![
            endpoint("/users", HttpMethod::Get, EndpointStatus::Synced),
            endpoint("/users", HttpMethod::Post, EndpointStatus::Conflict),
            endpoint("/orders/{id}", HttpMethod::Get, EndpointStatus::Pending),
            endpoint("/orders", HttpMethod::Delete, EndpointStatus::Conflict),
            endpoint("/health", HttpMethod::Get, EndpointStatus::Undefined),
        ])
    }

    #[test]
    fn empty_filter_passes_everything() {
        let ws = workspace();
        assert_eq!(ws.filtered(&EndpointFilter::default()).count(), 5);
    }

    #[test]
    fn filters_are_anded_across_categories() {
        let ws = workspace();
        let filter = EndpointFilter {
            statuses: vec![EndpointStatus::Conflict],
            methods: vec![HttpMethod::Post],
            search: None,
        };
        let hits: Vec<_> = ws.filtered(&filter).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].method, HttpMethod::Post);
    }

    #[test]
    fn values_within_a_category_are_ored() {
        let ws = workspace();
        let filter = EndpointFilter {
            statuses: vec![EndpointStatus::Synced, EndpointStatus::Pending],
            ..Default::default()
        };
        assert_eq!(ws.filtered(&filter).count(), 2);
    }

    #[test]
    fn search_is_case_insensitive_over_name_path_description() {
        let ws = workspace();
        let filter = EndpointFilter {
            search: Some("ORDERS".to_string()),
            ..Default::default()
        };
        assert_eq!(ws.filtered(&filter).count(), 2);

        let filter = EndpointFilter {
            search: Some("sample".to_string()),
            ..Default::default()
        };
        // Every fixture carries the description.
        assert_eq!(ws.filtered(&filter).count(), 5);

        let filter = EndpointFilter {
            search: Some("no-such-thing".to_string()),
            ..Default::default()
        };
        assert_eq!(ws.filtered(&filter).count(), 0);
    }

    #[test]
    fn blank_search_matches_everything() {
        let ws = workspace();
        let filter = EndpointFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(ws.filtered(&filter).count(), 5);
    }

    #[test]
    fn counts_are_per_endpoint_not_per_conflict() {
        let ws = workspace();
        assert_eq!(ws.conflicts_count(), 2);
        assert_eq!(ws.synced_count(), 1);
        assert_eq!(ws.count_with_status(EndpointStatus::Pending), 1);
        assert_eq!(ws.count_with_status(EndpointStatus::Undefined), 1);
    }
}
