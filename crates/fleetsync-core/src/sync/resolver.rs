//! Template and destination discovery from friendly-name markers.
//!
//! A template carries `-TEMPLATE <GROUP>-` in its friendly name, destinations
//! carry `-<GROUP>-`. Matching is case-insensitive and tolerates spaces inside
//! the template marker (`- template ark -`).

use regex::Regex;
use std::sync::OnceLock;

use fleetsync_types::models::Instance;
use fleetsync_types::ResolutionError;

static TEMPLATE_MARKER: OnceLock<Regex> = OnceLock::new();

fn template_marker_regex() -> &'static Regex {
    TEMPLATE_MARKER.get_or_init(|| {
        Regex::new(r"(?i)-\s*template\s+([^-]+?)\s*-").expect("Template marker regex is valid")
    })
}

/// Group named by a template marker in `friendly_name`, if any.
pub fn template_group(friendly_name: &str) -> Option<String> {
    template_marker_regex()
        .captures(friendly_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|g| !g.is_empty())
}

/// Whether `friendly_name` contains the destination marker `-<group>-`.
pub fn has_destination_marker(friendly_name: &str, group: &str) -> bool {
    friendly_name.to_lowercase().contains(&format!("-{}-", group.to_lowercase()))
}

fn same_group(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Resolved membership of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembers {
    pub group: String,
    pub template: Instance,
    /// Reachable destinations, ordered by instance name
    pub destinations: Vec<Instance>,
    /// Destinations whose instance is down; reported and skipped
    pub offline: Vec<Instance>,
}

impl GroupMembers {
    /// Template first, then destinations in order.
    pub fn online_instances(&self) -> impl Iterator<Item = &Instance> {
        std::iter::once(&self.template).chain(self.destinations.iter())
    }
}

/// Source of group membership. The friendly-name convention is the default;
/// tags or a directory service can stand in without touching sync logic.
pub trait Resolver {
    fn resolve(&self, instances: &[Instance], group: &str) -> Result<GroupMembers, ResolutionError>;

    /// Pick a group when none was requested.
    fn discover_group(&self, instances: &[Instance]) -> Result<String, ResolutionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FriendlyNameResolver;

impl Resolver for FriendlyNameResolver {
    fn resolve(&self, instances: &[Instance], group: &str) -> Result<GroupMembers, ResolutionError> {
        let candidates: Vec<&Instance> = instances
            .iter()
            .filter(|i| !i.is_controller())
            .filter(|i| template_group(&i.friendly_name).is_some_and(|g| same_group(&g, group)))
            .collect();

        let template = match candidates.as_slice() {
            [] => return Err(ResolutionError::MissingTemplate { group: group.to_string() }),
            [single] => (*single).clone(),
            many => {
                let mut names: Vec<String> = many.iter().map(|i| i.label()).collect();
                names.sort();
                return Err(ResolutionError::AmbiguousTemplate {
                    group: group.to_string(),
                    candidates: names,
                });
            }
        };

        let mut members: Vec<Instance> = instances
            .iter()
            .filter(|i| !i.is_controller())
            .filter(|i| template_group(&i.friendly_name).is_none())
            .filter(|i| has_destination_marker(&i.friendly_name, group))
            .cloned()
            .collect();
        members.sort_by(|a, b| a.instance_name.cmp(&b.instance_name).then(a.id.cmp(&b.id)));

        let (destinations, offline): (Vec<Instance>, Vec<Instance>) =
            members.into_iter().partition(|i| i.running);

        for instance in &offline {
            tracing::warn!("Skipping {}: instance unavailable/offline", instance.label());
        }
        tracing::debug!(
            "Group '{}': template {} with {} destination(s)",
            group,
            template.label(),
            destinations.len()
        );

        Ok(GroupMembers { group: group.to_string(), template, destinations, offline })
    }

    fn discover_group(&self, instances: &[Instance]) -> Result<String, ResolutionError> {
        let mut templates: Vec<(&Instance, String)> = instances
            .iter()
            .filter(|i| !i.is_controller())
            .filter_map(|i| template_group(&i.friendly_name).map(|g| (i, g)))
            .collect();
        templates.sort_by(|(a, _), (b, _)| a.instance_name.cmp(&b.instance_name));

        let (first, group) = templates.first().ok_or(ResolutionError::NoTemplates)?;
        let distinct = templates.iter().filter(|(_, g)| !same_group(g, group)).count();
        if distinct > 0 {
            tracing::warn!(
                "Several template groups present; using '{}' from {} (pass --group to choose)",
                group,
                first.label()
            );
        }
        Ok(group.clone())
    }
}
