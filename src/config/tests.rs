//! Configuration Module Tests
//!
//! Validates registry invariants and the parsing of command-line shaped values.

#[cfg(test)]
mod tests {
    use crate::config::{
        BATCH_SIZE, Cluster, ClusterName, ClusterRegistry, Collection, RetryPolicy, ScanConfig,
        Wiki,
    };
    use crate::error::CheckError;
    use std::time::Duration;

    fn cluster(name: &str) -> Cluster {
        Cluster::new(name, &format!("http://{}.search.local:9200", name)).unwrap()
    }

    // ============================================================
    // CLUSTER REGISTRY
    // ============================================================

    #[test]
    fn test_registry_first_entry_is_reference() {
        let registry =
            ClusterRegistry::new(vec![cluster("eqiad"), cluster("codfw"), cluster("cloudelastic")])
                .unwrap();

        assert_eq!(registry.reference().name, ClusterName::new("eqiad"));
        let others: Vec<_> = registry.others().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(others, vec!["codfw", "cloudelastic"]);
    }

    #[test]
    fn test_registry_requires_two_clusters() {
        let result = ClusterRegistry::new(vec![cluster("eqiad")]);

        assert!(matches!(result, Err(CheckError::Config(_))));
    }

    #[test]
    fn test_registry_rejects_duplicate_names() {
        let result = ClusterRegistry::new(vec![cluster("eqiad"), cluster("eqiad")]);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate cluster name"));
    }

    #[test]
    fn test_registry_names_keep_registry_order() {
        let registry = ClusterRegistry::new(vec![cluster("codfw"), cluster("eqiad")]).unwrap();

        assert_eq!(
            registry.names(),
            vec![ClusterName::new("codfw"), ClusterName::new("eqiad")]
        );
    }

    // ============================================================
    // PARSING
    // ============================================================

    #[test]
    fn test_cluster_parses_name_equals_url() {
        let parsed: Cluster = "codfw=https://search.svc.codfw.wmnet:9243".parse().unwrap();

        assert_eq!(parsed.name.as_str(), "codfw");
        assert_eq!(parsed.endpoint.port(), Some(9243));
    }

    #[test]
    fn test_cluster_rejects_missing_separator_and_bad_scheme() {
        assert!("codfw".parse::<Cluster>().is_err());
        assert!("codfw=ftp://search.local".parse::<Cluster>().is_err());
        assert!("=http://search.local".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_wiki_validation() {
        assert!("enwiki".parse::<Wiki>().is_ok());
        assert!("zh_min_nanwiki".parse::<Wiki>().is_ok());
        assert!("EnWiki".parse::<Wiki>().is_err());
        assert!("enwiki/_search".parse::<Wiki>().is_err());
        assert!("".parse::<Wiki>().is_err());
    }

    #[test]
    fn test_deserialized_names_are_validated() {
        let wiki: Wiki = serde_json::from_str("\"enwiki\"").unwrap();
        assert_eq!(wiki.as_str(), "enwiki");
        assert!(serde_json::from_str::<Wiki>("\"Bad Wiki\"").is_err());

        let collection: Collection = serde_json::from_str("\"general\"").unwrap();
        assert_eq!(collection, Collection::new("general"));
        assert!(serde_json::from_str::<Collection>("\"../_all\"").is_err());
    }

    #[test]
    fn test_collection_index_name() {
        let wiki: Wiki = "enwiki".parse().unwrap();

        let names: Vec<String> = Collection::defaults()
            .iter()
            .map(|c| c.index_name(&wiki))
            .collect();

        assert_eq!(names, vec!["enwiki_content", "enwiki_general"]);
    }

    // ============================================================
    // SCAN CONFIG / RETRY POLICY
    // ============================================================

    #[test]
    fn test_scan_config_defaults() {
        let config = ScanConfig::new("enwiki".parse().unwrap());

        assert_eq!(config.batch_size, BATCH_SIZE);
        assert_eq!(config.min_work_unit, 20_000);
        assert_eq!(config.retry.attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scan_config_rejects_empty_collections_and_zero_workers() {
        let config = ScanConfig::new("enwiki".parse().unwrap()).with_collections(vec![]);
        assert!(config.validate().is_err());

        let config = ScanConfig::new("enwiki".parse().unwrap()).with_worker_cap(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_config_rejects_zero_timeout() {
        let config =
            ScanConfig::new("enwiki".parse().unwrap()).with_request_timeout(Duration::ZERO);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, CheckError::Config(_)));
        assert!(err.to_string().contains("request timeout"));
    }

    #[test]
    fn test_retry_policy_without_backoff_is_immediate() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_after(0), Duration::ZERO);
        assert_eq!(policy.delay_after(5), Duration::ZERO);
    }

    #[test]
    fn test_retry_policy_backoff_doubles_and_caps() {
        let policy = RetryPolicy::with_backoff(Duration::from_millis(150));

        let first = policy.delay_after(0);
        let second = policy.delay_after(1);
        let late = policy.delay_after(10);

        assert!(first >= Duration::from_millis(150) && first < Duration::from_millis(200));
        assert!(second >= Duration::from_millis(300) && second < Duration::from_millis(350));
        assert!(late >= policy.max_delay && late < policy.max_delay + Duration::from_millis(50));
        assert_eq!(policy.attempts, 3);
    }
}
