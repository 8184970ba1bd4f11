//! Node paths and per-call wrap parameters.

use std::borrow::Cow;
use std::fmt;

const fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

/// `"TZPW"`, the application root of every path.
pub const TZPW: u32 = fourcc(b"TZPW");
/// `"ULCK"`, the outer vault key.
pub const ULCK: u32 = fourcc(b"ULCK");
/// `"GRUP"`, individual password values.
pub const GRUP: u32 = fourcc(b"GRUP");
/// `"BKUP"`, the backup ephemeral key.
pub const BKUP: u32 = fourcc(b"BKUP");

/// Label shown on the device when the outer vault key is unwrapped.
pub const OUTER_KEY_LABEL: &str = "Decrypt master key?";
/// Label shown on the device when the backup key is unwrapped.
pub const BACKUP_KEY_LABEL: &str = "Decrypt backup key?";

/// A fixed derivation path on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePath(&'static [u32]);

impl NodePath {
    pub const OUTER_KEY: Self = Self(&[TZPW, ULCK]);
    pub const GROUP: Self = Self(&[TZPW, GRUP]);
    pub const BACKUP: Self = Self(&[TZPW, BKUP]);

    #[must_use]
    pub const fn new(indices: &'static [u32]) -> Self {
        Self(indices)
    }

    #[must_use]
    pub const fn indices(&self) -> &'static [u32] {
        self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            let bytes = index.to_be_bytes();
            if bytes.iter().all(u8::is_ascii_alphanumeric) {
                for b in bytes {
                    write!(f, "{}", char::from(b))?;
                }
            } else {
                write!(f, "{index:#010x}")?;
            }
        }
        Ok(())
    }
}

/// Everything the device needs besides the data: where, what to display, and when to ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapContext<'a> {
    node: NodePath,
    label: Cow<'a, str>,
    confirm_on_wrap: bool,
    confirm_on_unwrap: bool,
}

impl<'a> WrapContext<'a> {
    /// A context that asks for confirmation on unwrap only.
    #[must_use]
    pub fn new(node: NodePath, label: impl Into<Cow<'a, str>>) -> Self {
        Self { node, label: label.into(), confirm_on_wrap: false, confirm_on_unwrap: true }
    }

    /// Context of the outer vault key.
    #[must_use]
    pub fn outer_key() -> WrapContext<'static> {
        WrapContext::new(NodePath::OUTER_KEY, OUTER_KEY_LABEL)
    }

    /// Context of the password values of `group`; the group name is the label.
    #[must_use]
    pub fn group(name: &'a str) -> Self {
        Self::new(NodePath::GROUP, name)
    }

    /// Context of the backup ephemeral key.
    #[must_use]
    pub fn backup_key() -> WrapContext<'static> {
        WrapContext::new(NodePath::BACKUP, BACKUP_KEY_LABEL)
    }

    #[must_use]
    pub const fn with_confirmation(mut self, on_wrap: bool, on_unwrap: bool) -> Self {
        self.confirm_on_wrap = on_wrap;
        self.confirm_on_unwrap = on_unwrap;
        self
    }

    #[must_use]
    pub const fn node(&self) -> NodePath {
        self.node
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn confirm_on_wrap(&self) -> bool {
        self.confirm_on_wrap
    }

    #[must_use]
    pub const fn confirm_on_unwrap(&self) -> bool {
        self.confirm_on_unwrap
    }

    /// Detaches the label from its borrow.
    #[must_use]
    pub fn into_owned(self) -> WrapContext<'static> {
        WrapContext {
            node: self.node,
            label: Cow::Owned(self.label.into_owned()),
            confirm_on_wrap: self.confirm_on_wrap,
            confirm_on_unwrap: self.confirm_on_unwrap,
        }
    }
}
