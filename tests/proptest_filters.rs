//! Property-based tests using proptest
//!
//! These tests verify name resolution, query building and the small
//! string helpers used by the proxies and the scenario runner.

use awx_proxy::proxies::project::{find_playbook_project, ProjectPlaybooks};
use awx_proxy::proxies::role::normalize_role_name;
use awx_proxy::resource::proxy::find_first_named;
use awx_proxy::resource::{ListQuery, Resource};
use awx_proxy::scenario::{host_limit, project_name_from_url};
use proptest::prelude::*;
use serde_json::json;

/// Generate a list of resources with names drawn from a small alphabet so
/// duplicates are common
fn arb_resources() -> impl Strategy<Value = Vec<Resource>> {
    prop::collection::vec(prop_oneof!["alpha", "beta", "gamma", "delta"], 0..30).prop_map(|names| {
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Resource::from_value(json!({"id": i as i64 + 1, "name": name})).unwrap())
            .collect()
    })
}

mod name_resolution_tests {
    use super::*;

    proptest! {
        /// The resolved resource is the first one carrying the name
        #[test]
        fn first_match_wins(
            items in arb_resources(),
            name in prop_oneof!["alpha", "beta", "gamma", "delta", "omega"]
        ) {
            let expected = items.iter().find(|r| r.name() == Some(name.as_str())).map(|r| r.id);
            let found = find_first_named(items, "name", &name).map(|r| r.id);
            prop_assert_eq!(found, expected);
        }

        /// Names never present are not resolved
        #[test]
        fn absent_name_not_found(items in arb_resources()) {
            prop_assert!(find_first_named(items, "name", "omega").is_none());
        }
    }
}

mod list_query_tests {
    use super::*;

    proptest! {
        /// A repeated key keeps one entry with the latest value
        #[test]
        fn repeated_filter_replaces(
            key in "[a-z_]{1,12}",
            first in "[a-zA-Z0-9]{0,10}",
            second in "[a-zA-Z0-9]{0,10}"
        ) {
            let query = ListQuery::new().filter(&key, &first).filter(&key, &second);
            prop_assert_eq!(query.get(&key), Some(second.as_str()));
            prop_assert_eq!(query.to_query_string().matches('=').count(), 1);
        }

        /// Applying a query adds exactly one `?` separator
        #[test]
        fn apply_adds_one_separator(
            value in "[a-zA-Z0-9 &=?]{1,20}",
            page in 1u32..100
        ) {
            let url = ListQuery::new()
                .filter("name", &value)
                .page_size(page)
                .apply("http://awx.local/api/v2/hosts/");
            prop_assert_eq!(url.matches('?').count(), 1);
            let expected_suffix = format!("page_size={}", page);
            prop_assert!(url.ends_with(&expected_suffix));
        }

        /// Empty queries leave the URL untouched
        #[test]
        fn empty_query_is_identity(path in "[a-z/]{0,30}") {
            let url = format!("http://awx.local/{}", path);
            prop_assert_eq!(ListQuery::new().apply(&url), url);
        }
    }
}

mod playbook_tests {
    use super::*;

    fn index(projects: &[(String, Vec<String>)]) -> Vec<ProjectPlaybooks> {
        projects
            .iter()
            .map(|(project, playbooks)| ProjectPlaybooks {
                project: project.clone(),
                playbooks: playbooks.clone(),
            })
            .collect()
    }

    proptest! {
        /// A playbook nested in a directory is found by its base name
        #[test]
        fn nested_playbook_found(
            dir in "[a-z]{1,8}",
            playbook in "[a-z]{1,8}\\.yml",
            others in prop::collection::vec("[a-z]{1,8}\\.yaml", 0..5)
        ) {
            let projects = vec![
                ("first".to_string(), others.clone()),
                ("second".to_string(), vec![format!("{}/{}", dir, playbook)]),
            ];
            let index = index(&projects);
            prop_assert_eq!(find_playbook_project(&index, &playbook), Some("second"));
        }

        /// When several projects offer the playbook the first one is returned
        #[test]
        fn first_project_wins(playbook in "[a-z]{1,8}\\.yml") {
            let projects = vec![
                ("a".to_string(), vec![playbook.clone()]),
                ("b".to_string(), vec![playbook.clone()]),
            ];
            let index = index(&projects);
            prop_assert_eq!(find_playbook_project(&index, &playbook), Some("a"));
        }

        /// Partial base-name matches do not count
        #[test]
        fn suffix_must_follow_separator(stem in "[a-z]{1,8}") {
            let projects = vec![("a".to_string(), vec![format!("x{}.yml", stem)])];
            let target = format!("{}.yml", stem);
            let index = index(&projects);
            prop_assert_eq!(find_playbook_project(&index, &target), None);
        }
    }
}

mod string_helper_tests {
    use super::*;

    proptest! {
        /// Role names normalize to lowercase without spaces or underscores
        #[test]
        fn role_names_normalized(name in "[A-Za-z _]{0,20}") {
            let normalized = normalize_role_name(&name);
            prop_assert!(!normalized.contains(' '));
            prop_assert!(!normalized.contains('_'));
            prop_assert_eq!(normalized.to_lowercase(), normalized.clone());
            prop_assert_eq!(normalize_role_name(&normalized), normalized);
        }

        /// Host limits are comma separated with no blanks
        #[test]
        fn host_limit_joins_tokens(hosts in prop::collection::vec("[a-z0-9.-]{1,10}", 1..6)) {
            let limit = host_limit(&hosts.join("  "));
            prop_assert!(!limit.contains(' '));
            prop_assert_eq!(limit.split(',').count(), hosts.len());
            prop_assert_eq!(limit, hosts.join(","));
        }

        /// Project names come from the last url segment
        #[test]
        fn project_name_from_repository_url(
            owner in "[a-z]{1,10}",
            repo in "[a-z][a-z0-9_-]{0,15}"
        ) {
            let url = format!("https://github.com/{}/{}.git", owner, repo);
            prop_assert_eq!(project_name_from_url(&url), repo);
        }
    }
}
