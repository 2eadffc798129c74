//! Compiled naming rules
//!
//! A [`NamingRule`] is a [`RuleConfig`] whose template has been compiled.
//! Building one is the only place a template can fail to parse, so a rule
//! set that compiles is guaranteed to be usable for every pass.

use crate::config::RuleConfig;
use crate::error::{Error, Result};
use crate::model::{Instance, Zone};
use crate::template::NameTemplate;

/// Which instance address a rule publishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressSelection {
    /// Private address (default)
    #[default]
    Private,
    /// Public address
    Public,
}

impl AddressSelection {
    /// Pick the selected address of an instance, if it has one
    pub fn select<'a>(&self, instance: &'a Instance) -> Option<&'a str> {
        match self {
            AddressSelection::Private => instance.private_ip.as_deref(),
            AddressSelection::Public => instance.public_ip.as_deref(),
        }
    }
}

/// Group-to-zone binding with a compiled name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingRule {
    group: String,
    zone: Zone,
    template: NameTemplate,
    address: AddressSelection,
}

impl NamingRule {
    /// Build and compile a rule
    pub fn new(
        group: impl Into<String>,
        zone: Zone,
        template: &str,
        address: AddressSelection,
    ) -> Result<Self> {
        let group = group.into();
        let template = NameTemplate::compile(template).map_err(|e| match e {
            Error::Template(msg) => Error::template(format!("rule for group '{}': {}", group, msg)),
            other => other,
        })?;

        Ok(Self {
            group,
            zone,
            template,
            address,
        })
    }

    /// Compile a rule from its configuration
    pub fn compile(config: &RuleConfig) -> Result<Self> {
        config.validate()?;

        let address = if config.public {
            AddressSelection::Public
        } else {
            AddressSelection::Private
        };

        Self::new(
            config.auto_scaling_group.clone(),
            config.zone.clone(),
            &config.record,
            address,
        )
    }

    /// Compile every rule, failing on the first invalid one
    pub fn compile_all(configs: &[RuleConfig]) -> Result<Vec<Self>> {
        configs.iter().map(Self::compile).collect()
    }

    /// Bound group name
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Target zone
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Compiled name template
    pub fn template(&self) -> &NameTemplate {
        &self.template
    }

    /// Address selection
    pub fn address(&self) -> AddressSelection {
        self.address
    }

    /// Render the record name for an instance
    pub fn render_name(&self, instance: &Instance) -> Result<String> {
        self.template.render(instance)
    }
}
