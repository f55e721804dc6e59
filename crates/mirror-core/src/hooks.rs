//! Hook points of the unit-of-work boundary
//!
//! A host (request server, command runner) calls the coordinator at two
//! points around every unit of work it processes.

use std::fmt;

use crate::coordinator::SyncCoordinator;
use crate::error::Result;

/// Points at which the host hands control to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before the unit of work may start
    BeforeUnitOfWork,
    /// After the unit of work has finished
    AfterUnitOfWork,
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeUnitOfWork => write!(f, "before-unit-of-work"),
            Self::AfterUnitOfWork => write!(f, "after-unit-of-work"),
        }
    }
}

impl HookPoint {
    /// Parse a hook point from its kebab-case name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "before-unit-of-work" | "before" => Some(Self::BeforeUnitOfWork),
            "after-unit-of-work" | "after" => Some(Self::AfterUnitOfWork),
            _ => None,
        }
    }

    /// Both points, in the order a host invokes them
    pub fn all() -> [Self; 2] {
        [Self::BeforeUnitOfWork, Self::AfterUnitOfWork]
    }
}

impl SyncCoordinator {
    /// Entry point for hosts that register one callback per hook point.
    ///
    /// Only the before point can fail; the after point absorbs every
    /// failure into its cycle report and logs.
    pub fn dispatch(&mut self, point: HookPoint) -> Result<()> {
        tracing::trace!(%point, "Hook dispatched");
        match point {
            HookPoint::BeforeUnitOfWork => self.before_unit_of_work().map(|_| ()),
            HookPoint::AfterUnitOfWork => {
                self.after_unit_of_work();
                Ok(())
            }
        }
    }
}
