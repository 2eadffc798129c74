//! Record name templates
//!
//! A deliberately small template language for naming records after the
//! instances that back them. Text outside `{{ ... }}` is copied verbatim;
//! each action names exactly one instance field:
//!
//! | Action                      | Value                        |
//! |-----------------------------|------------------------------|
//! | `{{ .Id }}`                 | instance id                  |
//! | `{{ .PublicIp }}`           | public address               |
//! | `{{ .PrivateIp }}`          | private address              |
//! | `{{ .Running }}`            | `true` / `false`             |
//! | `{{ .Tags.Name }}`          | value of tag `Name`          |
//! | `{{ index .Tags "a:b" }}`   | value of tag `a:b`           |
//!
//! Templates are compiled once, when a naming rule is built. Rendering fails
//! when the instance does not carry the referenced field (a missing address
//! or tag), never silently producing an empty label.

use crate::error::{Error, Result};
use crate::model::Instance;
use std::borrow::Cow;
use std::fmt;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Instance field referenced by a template action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// `.Id`
    Id,
    /// `.PublicIp`
    PublicIp,
    /// `.PrivateIp`
    PrivateIp,
    /// `.Running`
    Running,
    /// `.Tags.<key>` or `index .Tags "<key>"`
    Tag(String),
}

impl Field {
    /// Resolve a dotted field path such as `.Id` or `.Tags.Name`
    fn from_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix('.')?;
        match path {
            "Id" => Some(Field::Id),
            "PublicIp" => Some(Field::PublicIp),
            "PrivateIp" => Some(Field::PrivateIp),
            "Running" => Some(Field::Running),
            _ => {
                let key = path.strip_prefix("Tags.")?;
                (!key.is_empty()).then(|| Field::Tag(key.to_string()))
            }
        }
    }

    /// Look the field up on an instance
    fn lookup<'a>(&self, instance: &'a Instance) -> Option<Cow<'a, str>> {
        match self {
            Field::Id => Some(Cow::Borrowed(instance.id.as_str())),
            Field::PublicIp => instance.public_ip.as_deref().map(Cow::Borrowed),
            Field::PrivateIp => instance.private_ip.as_deref().map(Cow::Borrowed),
            Field::Running => Some(Cow::Owned(instance.running.to_string())),
            Field::Tag(key) => instance.tags.get(key).map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Id => write!(f, ".Id"),
            Field::PublicIp => write!(f, ".PublicIp"),
            Field::PrivateIp => write!(f, ".PrivateIp"),
            Field::Running => write!(f, ".Running"),
            Field::Tag(key) => write!(f, "index .Tags {:?}", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A compiled record name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NameTemplate {
    /// Compile a template
    ///
    /// # Errors
    ///
    /// [`Error::Template`] for an unterminated or empty action, an unknown
    /// field, or a malformed `index` expression.
    pub fn compile(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut segments = Vec::new();
        let mut rest = source.as_str();

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let after_open = &rest[start + OPEN.len()..];
            let end = after_open.find(CLOSE).ok_or_else(|| {
                Error::template(format!(
                    "unterminated action in template '{}': missing '{}'",
                    source, CLOSE
                ))
            })?;

            let field = parse_action(&after_open[..end]).map_err(|reason| {
                Error::template(format!("invalid template '{}': {}", source, reason))
            })?;
            segments.push(Segment::Field(field));

            rest = &after_open[end + CLOSE.len()..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { source, segments })
    }

    /// Template text as written in configuration
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template renders the same name for every instance
    pub fn is_constant(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// Fields referenced by the template, in order of appearance
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(field) => Some(field),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template against an instance
    ///
    /// # Errors
    ///
    /// [`Error::Template`] when the instance does not carry a referenced field.
    pub fn render(&self, instance: &Instance) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    let value = field.lookup(instance).ok_or_else(|| {
                        Error::template(format!(
                            "failed to render template '{}' for instance {}: field {} is not set",
                            self.source, instance.id, field
                        ))
                    })?;
                    out.push_str(&value);
                }
            }
        }

        Ok(out)
    }
}

impl fmt::Display for NameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse the inside of one `{{ ... }}` action
fn parse_action(action: &str) -> std::result::Result<Field, String> {
    let action = action.trim();
    if action.is_empty() {
        return Err("empty action".to_string());
    }

    if let Some(args) = action.strip_prefix("index ") {
        let args = args.trim_start();
        let key = args
            .strip_prefix(".Tags")
            .map(str::trim)
            .and_then(|quoted| quoted.strip_prefix('"'))
            .and_then(|quoted| quoted.strip_suffix('"'))
            .ok_or_else(|| format!("malformed index expression '{}'", action))?;

        if key.is_empty() || key.contains('"') {
            return Err(format!("malformed index expression '{}'", action));
        }
        return Ok(Field::Tag(key.to_string()));
    }

    Field::from_path(action).ok_or_else(|| format!("unknown field '{}'", action))
}
