//! Allow-list of identities eligible for admin privileges.

use std::collections::BTreeSet;

use crate::Email;

/// Emails allowed to sign in and be flagged as admins.
///
/// Built once from configuration and handed to the sign-in service. An empty
/// list means nobody can sign in.
///
/// ```
/// use woodshop_core::{AdminAllowList, Email};
///
/// let list = AdminAllowList::from_csv("one@x.com, Two@X.com,,not-an-email");
/// assert_eq!(list.len(), 2);
/// assert!(list.contains(&Email::parse("two@x.com").unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: BTreeSet<Email>,
}

impl AdminAllowList {
    /// Build an allow-list from explicit emails.
    #[must_use]
    pub fn new(emails: impl IntoIterator<Item = Email>) -> Self {
        Self {
            emails: emails.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list, skipping blank and malformed entries.
    #[must_use]
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(',').filter_map(|entry| Email::parse(entry).ok()))
    }

    /// Whether `email` may become an admin.
    #[must_use]
    pub fn contains(&self, email: &Email) -> bool {
        self.emails.contains(email)
    }

    /// Number of allowed emails.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Whether nobody is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Iterate allowed emails in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Email> {
        self.emails.iter()
    }
}
