//! Value objects describing the container a fixture manages.

use std::fmt;

/// Image reference of the form `name[:tag]` or `name@digest`.
///
/// A reference without tag or digest means `latest`, which is how the engine
/// lists it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    name: String,
    reference: Reference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reference {
    Tag(String),
    Digest(String),
}

const DEFAULT_TAG: &str = "latest";

impl ImageRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some((name, digest)) = raw.split_once('@') {
            // A tag in front of a digest is ignored by the engine.
            let name = split_tag(name).0;
            return Self {
                name: name.to_string(),
                reference: Reference::Digest(digest.to_string()),
            };
        }

        let (name, tag) = split_tag(raw);
        Self {
            name: name.to_string(),
            reference: Reference::Tag(tag.unwrap_or(DEFAULT_TAG).to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.reference {
            Reference::Tag(tag) => Some(tag),
            Reference::Digest(_) => None,
        }
    }

    /// Reference prefixed with `namespace` when it names an official image.
    ///
    /// Only single-component names (`mysql:5.7`) are qualified; anything with
    /// a namespace or registry host is returned as is.
    pub fn qualified(&self, namespace: &str) -> String {
        if self.name.contains('/') || namespace.is_empty() {
            return self.to_string();
        }
        format!("{}/{}", namespace.trim_end_matches('/'), self)
    }

    /// True if `listed`, as reported by the engine, names this image.
    pub fn matches(&self, listed: &str) -> bool {
        let other = ImageRef::parse(listed);
        short_name(&self.name) == short_name(&other.name) && self.reference == other.reference
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Reference::Tag(tag) => write!(f, "{}:{}", self.name, tag),
            Reference::Digest(digest) => write!(f, "{}@{}", self.name, digest),
        }
    }
}

/// Split `name:tag`, ignoring a colon that belongs to a registry port.
/// A trailing `:` with no tag is dropped.
fn split_tag(raw: &str) -> (&str, Option<&str>) {
    match raw.rsplit_once(':') {
        Some((name, "")) => (name, None),
        Some((name, tag)) if !tag.contains('/') => (name, Some(tag)),
        _ => (raw, None),
    }
}

fn short_name(name: &str) -> &str {
    let name = name.strip_prefix("docker.io/").unwrap_or(name);
    name.strip_prefix("library/").unwrap_or(name)
}

/// Opaque engine-assigned container identifier. Empty until known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ContainerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single TCP port published from the container to `host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host: String,
    pub exposed: u16,
    pub container: u16,
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}/tcp", self.host, self.exposed, self.container)
    }
}

/// What to run. Built once, read by the reconciler and the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    image: ImageRef,
    name: String,
    port: Option<PortBinding>,
    env: Vec<String>,
}

impl ContainerSpec {
    pub fn new(image: &str, name: impl Into<String>) -> Self {
        Self {
            image: ImageRef::parse(image),
            name: name.into(),
            port: None,
            env: Vec::new(),
        }
    }

    /// Publish `container` on `host:exposed`.
    pub fn publish(mut self, host: impl Into<String>, exposed: u16, container: u16) -> Self {
        self.port = Some(PortBinding {
            host: host.into(),
            exposed,
            container,
        });
        self
    }

    /// Append a `KEY=VALUE` assignment. Duplicates are kept in order.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{key}={value}"));
        self
    }

    /// Append pre-formatted `KEY=VALUE` assignments.
    pub fn envs<I, S>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.extend(assignments.into_iter().map(Into::into));
        self
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> Option<&PortBinding> {
        self.port.as_ref()
    }

    pub fn env_assignments(&self) -> &[String] {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tag_means_latest() {
        let image = ImageRef::parse("mysql");
        assert_eq!(image.name(), "mysql");
        assert_eq!(image.tag(), Some("latest"));
        assert_eq!(image.to_string(), "mysql:latest");
    }

    #[test]
    fn empty_tag_falls_back_to_latest() {
        let image = ImageRef::parse("mysql:");
        assert_eq!(image.name(), "mysql");
        assert_eq!(image.tag(), Some("latest"));
        assert_eq!(image.to_string(), "mysql:latest");

        let digest = ImageRef::parse("redis:@sha256:abc");
        assert_eq!(digest.name(), "redis");
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let image = ImageRef::parse("localhost:5000/team/db");
        assert_eq!(image.name(), "localhost:5000/team/db");
        assert_eq!(image.tag(), Some("latest"));

        let tagged = ImageRef::parse("localhost:5000/team/db:1.2");
        assert_eq!(tagged.name(), "localhost:5000/team/db");
        assert_eq!(tagged.tag(), Some("1.2"));
    }

    #[test]
    fn digest_reference_has_no_tag() {
        let image = ImageRef::parse("redis:7@sha256:abc");
        assert_eq!(image.name(), "redis");
        assert_eq!(image.tag(), None);
        assert_eq!(image.to_string(), "redis@sha256:abc");
    }

    #[test]
    fn qualifies_only_official_images() {
        let ns = "docker.io/library/";
        assert_eq!(
            ImageRef::parse("mysql:5.7").qualified(ns),
            "docker.io/library/mysql:5.7"
        );
        assert_eq!(
            ImageRef::parse("fluent/fluentd:v0.12.32").qualified(ns),
            "fluent/fluentd:v0.12.32"
        );
        assert_eq!(ImageRef::parse("mysql:5.7").qualified(""), "mysql:5.7");
    }

    #[test]
    fn matches_ignores_default_namespace() {
        let image = ImageRef::parse("mysql:5.7");
        assert!(image.matches("mysql:5.7"));
        assert!(image.matches("docker.io/library/mysql:5.7"));
        assert!(!image.matches("mysql:8"));
        assert!(!image.matches("mariadb:5.7"));
        assert!(ImageRef::parse("mysql").matches("mysql"));
    }

    #[test]
    fn port_binding_renders_docker_form() {
        let spec = ContainerSpec::new("mysql:5.7", "db").publish("127.0.0.1", 33060, 3306);
        assert_eq!(spec.port().unwrap().to_string(), "127.0.0.1:33060:3306/tcp");
    }

    #[test]
    fn env_keeps_order_and_duplicates() {
        let spec = ContainerSpec::new("mysql:5.7", "db")
            .env("MYSQL_USER", "user")
            .envs(["MYSQL_USER=other"]);
        assert_eq!(
            spec.env_assignments(),
            &["MYSQL_USER=user".to_string(), "MYSQL_USER=other".to_string()]
        );
    }

    #[test]
    fn container_id_defaults_to_empty() {
        assert!(ContainerId::default().is_empty());
        assert_eq!(ContainerId::from("cid").as_str(), "cid");
    }
}
