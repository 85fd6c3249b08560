//! Driver pattern registry
//!
//! Every driver family names its per-queue counters differently. A
//! [`DriverPattern`] captures one family's convention as a regular expression
//! plus the role of each capture group, and the [`Registry`] maps driver
//! names (including aliases) to the pattern that decodes them.

use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeSet;

use crate::collectors::queues::errors::{QueueError, QueueResult};
use crate::collectors::queues::stats::{CounterKind, Direction};

/// Where a semantic field comes from when a counter name matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource<T> {
    /// Read from the numbered capture group
    Group(usize),
    /// Fixed by the pattern's literal text
    Fixed(T),
}

/// Mapping from capture group number to semantic role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRoles {
    pub direction: RoleSource<Direction>,
    pub kind: RoleSource<CounterKind>,
    pub queue: usize,
}

impl CaptureRoles {
    /// Roles where direction, kind and queue number are all captured
    pub fn groups(direction: usize, kind: usize, queue: usize) -> Self {
        Self {
            direction: RoleSource::Group(direction),
            kind: RoleSource::Group(kind),
            queue,
        }
    }

    fn captured_groups(&self) -> Vec<usize> {
        let mut groups = vec![self.queue];
        if let RoleSource::Group(group) = self.direction {
            groups.push(group);
        }
        if let RoleSource::Group(group) = self.kind {
            groups.push(group);
        }
        groups
    }
}

/// What happens to a counter name the primary pattern rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    /// The name is not a per-queue counter
    #[default]
    NoMatch,
    /// Retry with the `rx-N.` / `tx-N.` prefix decoder
    Prefixed,
}

/// Compiled counter-name rule for one driver family
#[derive(Debug, Clone)]
pub struct DriverPattern {
    name: String,
    matcher: Option<Regex>,
    roles: CaptureRoles,
    fallback: Fallback,
}

impl DriverPattern {
    /// Compiles `pattern` and checks that every role points at a distinct,
    /// existing capture group
    pub fn new(name: &str, pattern: &str, roles: CaptureRoles) -> QueueResult<Self> {
        let matcher = Regex::new(pattern).map_err(|e| QueueError::InvalidPattern {
            driver: name.to_string(),
            message: e.to_string(),
        })?;

        // captures_len() counts the implicit whole-match group 0
        let group_count = matcher.captures_len() - 1;
        let groups = roles.captured_groups();

        for group in &groups {
            if *group == 0 || *group > group_count {
                return Err(QueueError::InvalidPattern {
                    driver: name.to_string(),
                    message: format!(
                        "capture group {} does not exist (pattern has {} groups)",
                        group, group_count
                    ),
                });
            }
        }

        let distinct: BTreeSet<_> = groups.iter().collect();
        if distinct.len() != groups.len() {
            return Err(QueueError::InvalidPattern {
                driver: name.to_string(),
                message: "a capture group is assigned more than one role".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            matcher: Some(matcher),
            roles,
            fallback: Fallback::NoMatch,
        })
    }

    /// Pattern that matches nothing, selected for unsupported drivers
    pub fn null(name: &str) -> Self {
        Self {
            name: name.to_string(),
            matcher: None,
            roles: CaptureRoles::groups(1, 2, 3),
            fallback: Fallback::NoMatch,
        }
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }

    pub fn roles(&self) -> &CaptureRoles {
        &self.roles
    }

    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Whether this is the null pattern
    pub fn is_null(&self) -> bool {
        self.matcher.is_none() && self.fallback == Fallback::NoMatch
    }
}

#[derive(Debug)]
struct RegistryEntry {
    drivers: BTreeSet<String>,
    pattern: DriverPattern,
}

/// Lookup table from driver name to counter-name pattern
///
/// Built once at startup and only read afterwards. There is no removal.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    unsupported: DriverPattern,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            unsupported: DriverPattern::null("unsupported"),
        }
    }

    /// Registers `pattern` for every name in `drivers`
    ///
    /// When a driver name is already registered the earlier entry keeps it.
    pub fn register<I, S>(&mut self, drivers: I, fallback: Fallback, pattern: DriverPattern)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let drivers: BTreeSet<String> = drivers.into_iter().map(Into::into).collect();

        for driver in &drivers {
            if self.lookup(driver).is_some() {
                warn!(
                    "Driver '{}' is already registered; pattern '{}' will not be used for it",
                    driver,
                    pattern.name()
                );
            }
        }

        debug!(
            "Registered counter pattern '{}' for drivers {:?} (fallback={:?})",
            pattern.name(),
            drivers,
            fallback
        );

        self.entries.push(RegistryEntry {
            drivers,
            pattern: pattern.with_fallback(fallback),
        });
    }

    /// Returns the pattern for `driver`, or the null pattern if none is registered
    pub fn select(&self, driver: &str) -> &DriverPattern {
        match self.lookup(driver) {
            Some(pattern) => pattern,
            None => {
                debug!("No counter pattern registered for driver '{}'", driver);
                &self.unsupported
            }
        }
    }

    pub fn supports(&self, driver: &str) -> bool {
        self.lookup(driver).is_some()
    }

    /// All registered driver names, sorted
    pub fn drivers(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .entries
            .iter()
            .flat_map(|entry| entry.drivers.iter().map(String::as_str))
            .collect();
        names.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, driver: &str) -> Option<&DriverPattern> {
        self.entries
            .iter()
            .find(|entry| entry.drivers.contains(driver))
            .map(|entry| &entry.pattern)
    }
}
