//! Built-in driver table
//!
//! Driver naming conventions are declared in `drivers.toml` and compiled into
//! a [`Registry`] at startup, so supporting another driver is a table entry
//! rather than new parsing code.

use config::{Config, File, FileFormat};
use log::debug;
use serde::Deserialize;

use crate::collectors::queues::errors::{QueueError, QueueResult};
use crate::collectors::queues::registry::{CaptureRoles, DriverPattern, Fallback, Registry, RoleSource};
use crate::collectors::queues::stats::{CounterKind, Direction};

const DRIVER_TABLE: &str = include_str!("drivers.toml");

/// One `[[driver]]` entry of the table
#[derive(Debug, Clone, Deserialize)]
pub struct DriverSpec {
    pub name: String,
    pub drivers: Vec<String>,
    pub pattern: String,
    pub queue: usize,
    #[serde(default)]
    pub direction: Option<usize>,
    #[serde(default)]
    pub kind: Option<usize>,
    #[serde(default)]
    pub fixed_direction: Option<String>,
    #[serde(default)]
    pub fixed_kind: Option<String>,
    #[serde(default)]
    pub fallback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriverTable {
    #[serde(default)]
    driver: Vec<DriverSpec>,
}

impl DriverSpec {
    fn roles(&self) -> QueueResult<CaptureRoles> {
        let direction = match (self.direction, self.fixed_direction.as_deref()) {
            (Some(group), None) => RoleSource::Group(group),
            (None, Some(text)) => RoleSource::Fixed(
                Direction::from_literal(text).ok_or_else(|| self.invalid(format!("unknown direction '{}'", text)))?,
            ),
            _ => return Err(self.invalid("exactly one of direction / fixed_direction is required".to_string())),
        };

        let kind = match (self.kind, self.fixed_kind.as_deref()) {
            (Some(group), None) => RoleSource::Group(group),
            (None, Some(text)) => RoleSource::Fixed(CounterKind::from_literal(text)),
            _ => return Err(self.invalid("exactly one of kind / fixed_kind is required".to_string())),
        };

        Ok(CaptureRoles {
            direction,
            kind,
            queue: self.queue,
        })
    }

    fn fallback(&self) -> QueueResult<Fallback> {
        match self.fallback.as_deref() {
            None | Some("none") => Ok(Fallback::NoMatch),
            Some("prefixed") => Ok(Fallback::Prefixed),
            Some(other) => Err(self.invalid(format!("unknown fallback '{}'", other))),
        }
    }

    /// Compiles the entry into a pattern
    pub fn compile(&self) -> QueueResult<(Fallback, DriverPattern)> {
        if self.drivers.is_empty() {
            return Err(self.invalid("no driver names listed".to_string()));
        }
        let pattern = DriverPattern::new(&self.name, &self.pattern, self.roles()?)?;
        Ok((self.fallback()?, pattern))
    }

    fn invalid(&self, message: String) -> QueueError {
        QueueError::InvalidPattern {
            driver: self.name.clone(),
            message,
        }
    }
}

/// Parses a driver table in TOML form
pub fn load_driver_specs(table: &str) -> QueueResult<Vec<DriverSpec>> {
    let table: DriverTable = Config::builder()
        .add_source(File::from_str(table, FileFormat::Toml))
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| QueueError::InvalidDriverTable {
            message: e.to_string(),
        })?;
    Ok(table.driver)
}

/// Compiles `specs` into `registry`, in table order
pub fn register_all(registry: &mut Registry, specs: &[DriverSpec]) -> QueueResult<()> {
    for spec in specs {
        let (fallback, pattern) = spec.compile()?;
        registry.register(spec.drivers.iter().cloned(), fallback, pattern);
    }
    Ok(())
}

impl Registry {
    /// Registry populated with the built-in driver table
    pub fn builtin() -> QueueResult<Self> {
        let specs = load_driver_specs(DRIVER_TABLE)?;
        let mut registry = Registry::new();
        register_all(&mut registry, &specs)?;

        debug!(
            "Loaded {} built-in counter patterns covering {} drivers",
            registry.len(),
            registry.drivers().len()
        );
        Ok(registry)
    }
}
