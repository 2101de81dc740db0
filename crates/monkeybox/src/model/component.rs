use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an application screen: the owning package plus the screen class.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ComponentName {
    pub package: String,
    pub class_name: String,
}

impl ComponentName {
    #[must_use]
    pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class_name: class_name.into(),
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class_name)
    }
}

/// User-supplied intent override carried on cold launches.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LaunchIntent {
    pub action: String,
    pub data: String,
}
