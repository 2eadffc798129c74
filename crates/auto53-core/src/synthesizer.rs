//! Desired-state synthesis
//!
//! Turns the current members of the auto-scaling groups and the naming rules
//! into the address records the zones should contain.
//!
//! Every rule renders its template once per instance of its group. Instances
//! whose rendered names coincide within a zone share one record (fan-in);
//! instances rendering distinct names get one record each (fan-out).

use crate::error::{Error, Result};
use crate::model::{AutoScalingGroup, Record};
use crate::rule::NamingRule;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, warn};

/// Synthesize the desired records
///
/// Addresses are appended to a record in encounter order (rule order, then
/// instance order) and are not deduplicated. The order of the returned
/// records is unspecified.
///
/// # Errors
///
/// - [`Error::Config`] if `groups` or `rules` is absent, or a rule names a
///   group missing from `groups`.
/// - [`Error::Template`] if a name cannot be rendered for an instance.
pub fn synthesize(
    groups: Option<&HashMap<String, AutoScalingGroup>>,
    rules: Option<&[NamingRule]>,
) -> Result<Vec<Record>> {
    let groups = groups.ok_or_else(|| Error::config("auto-scaling groups must be provided"))?;
    let rules = rules.ok_or_else(|| Error::config("naming rules must be provided"))?;

    let mut working: HashMap<String, Record> = HashMap::new();

    for rule in rules {
        let group = groups.get(rule.group()).ok_or_else(|| {
            Error::config(format!(
                "rule '{}' references unknown auto-scaling group '{}'",
                rule.template(),
                rule.group()
            ))
        })?;

        for instance in &group.instances {
            let Some(address) = rule.address().select(instance) else {
                warn!(
                    "Instance {} in group {} has no {:?} address, skipping",
                    instance.id,
                    group.name,
                    rule.address()
                );
                continue;
            };

            let name = rule.render_name(instance)?;
            let key = format!("{}.{}", name, rule.zone().id);

            match working.entry(key) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().ips.push(address.to_string());
                }
                Entry::Vacant(entry) => {
                    entry.insert(Record::new(
                        rule.zone().clone(),
                        name,
                        vec![address.to_string()],
                    ));
                }
            }
        }
    }

    debug!(
        "Synthesized {} record(s) from {} rule(s)",
        working.len(),
        rules.len()
    );

    Ok(working.into_values().collect())
}
