//! Parsing of `docker image ls` / `docker ps` output.

use serde::{Deserialize, Deserializer};

use crate::container::{ContainerId, ContainerSpec};
use crate::driver::ContainerState;
use crate::error::EngineError;

/// One line of `docker ps --format '{{json .}}'`. Unused fields are ignored.
///
/// Podman emits `Id` and a `Names` array instead of docker's `ID` and
/// comma-joined `Names`; both shapes are accepted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ContainerSummary {
    #[serde(rename = "ID", alias = "Id")]
    pub id: String,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Names", default, deserialize_with = "joined_names")]
    pub names: String,
    #[serde(rename = "State", default)]
    pub state: String,
}

impl ContainerSummary {
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names
            .split(',')
            .any(|n| n.trim().trim_start_matches('/') == name)
    }
}

fn joined_names<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Names {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Names>::deserialize(deserializer)? {
        Some(Names::Joined(names)) => names,
        Some(Names::List(names)) => names.join(","),
        None => String::new(),
    })
}

/// True if any `repository:tag` line names `spec`'s image.
pub fn image_listed(stdout: &str, spec: &ContainerSpec) -> bool {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .any(|l| spec.image().matches(l))
}

pub fn parse_containers(stdout: &str) -> Result<Vec<ContainerSummary>, EngineError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            serde_json::from_str(l)
                .map_err(|e| EngineError::Malformed(format!("container listing: {e}")))
        })
        .collect()
}

/// Pick the container for `spec` among all listed containers.
///
/// Candidates are those running `spec`'s image. A candidate with the
/// spec's name wins, then any running candidate, then the first listed.
pub fn select_container(containers: &[ContainerSummary], spec: &ContainerSpec) -> ContainerState {
    let candidates: Vec<&ContainerSummary> = containers
        .iter()
        .filter(|c| spec.image().matches(&c.image))
        .collect();

    let chosen = candidates
        .iter()
        .find(|c| c.has_name(spec.name()))
        .or_else(|| candidates.iter().find(|c| c.is_running()))
        .or_else(|| candidates.first());

    match chosen {
        None => ContainerState::Absent,
        Some(c) if c.is_running() => ContainerState::Running(ContainerId::new(c.id.clone())),
        Some(c) => ContainerState::Created(ContainerId::new(c.id.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS: &str = r#"
{"Command":"\"docker-entrypoint.s…\"","ID":"aaa","Image":"mysql:5.7","Names":"other_db","State":"exited","Status":"Exited (0) 2 days ago"}
{"Command":"\"tini -- fluentd\"","ID":"bbb","Image":"fluent/fluentd:v0.12.32","Names":"charon_test","State":"running","Status":"Up 3 minutes"}
{"Command":"\"docker-entrypoint.s…\"","ID":"ccc","Image":"mysql:5.7","Names":"papua_test","State":"created","Status":"Created"}
"#;

    fn mysql() -> ContainerSpec {
        ContainerSpec::new("mysql:5.7", "papua_test")
    }

    #[test]
    fn parses_docker_ps_json_lines() {
        let containers = parse_containers(PS).unwrap();
        assert_eq!(containers.len(), 3);
        assert_eq!(containers[1].id, "bbb");
        assert!(containers[1].is_running());
        assert!(!containers[0].is_running());
    }

    #[test]
    fn parses_podman_ps_json_lines() {
        let line = r#"{"Id":"abc","Image":"docker.io/library/mysql:5.7","Names":["papua_test","db"],"State":"running"}"#;
        let containers = parse_containers(line).unwrap();
        assert_eq!(containers[0].id, "abc");
        assert_eq!(containers[0].names, "papua_test,db");
        assert!(containers[0].has_name("db"));
        assert_eq!(
            select_container(&containers, &mysql()),
            ContainerState::Running("abc".into())
        );
    }

    #[test]
    fn null_names_are_empty() {
        let containers = parse_containers(r#"{"ID":"abc","Image":"mysql:5.7","Names":null}"#).unwrap();
        assert_eq!(containers[0].names, "");
    }

    #[test]
    fn malformed_line_is_an_error() {
        let err = parse_containers("not json").unwrap_err();
        assert!(matches!(err, EngineError::Malformed(_)));
    }

    #[test]
    fn empty_listing_means_absent() {
        assert_eq!(parse_containers("\n").unwrap(), Vec::new());
        assert_eq!(select_container(&[], &mysql()), ContainerState::Absent);
    }

    #[test]
    fn name_match_wins_among_same_image() {
        let containers = parse_containers(PS).unwrap();
        assert_eq!(
            select_container(&containers, &mysql()),
            ContainerState::Created("ccc".into())
        );
    }

    #[test]
    fn running_container_preferred_without_name_match() {
        let mut containers = parse_containers(PS).unwrap();
        containers.push(ContainerSummary {
            id: "ddd".into(),
            image: "mysql:5.7".into(),
            names: "third".into(),
            state: "running".into(),
        });
        let spec = ContainerSpec::new("mysql:5.7", "unnamed");
        assert_eq!(
            select_container(&containers, &spec),
            ContainerState::Running("ddd".into())
        );
    }

    #[test]
    fn other_images_are_ignored() {
        let containers = parse_containers(PS).unwrap();
        let spec = ContainerSpec::new("postgres:16", "papua_test");
        assert_eq!(select_container(&containers, &spec), ContainerState::Absent);
    }

    #[test]
    fn image_listing_matches_normalised_reference() {
        let listing = "mysql:5.7\nfluent/fluentd:v0.12.32\n<none>:<none>\n";
        assert!(image_listed(listing, &mysql()));
        assert!(image_listed(
            listing,
            &ContainerSpec::new("fluent/fluentd:v0.12.32", "charon_test")
        ));
        assert!(!image_listed(listing, &ContainerSpec::new("mysql", "x")));
    }
}
