//! Insertion-ordered set of admitted identities

/// The set of identities permitted to push and be queried.
///
/// Enumeration follows insertion order. The list itself is not synchronised;
/// it lives inside the registry state and is only touched under the
/// registry lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    identities: Vec<String>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `identity` if it is not present yet.
    ///
    /// Returns `true` if the identity was newly added.
    pub fn insert(&mut self, identity: &str) -> bool {
        if self.contains(identity) {
            return false;
        }

        self.identities.push(identity.to_string());
        true
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.identities.iter().any(|known| known == identity)
    }

    /// Remove `identity`, keeping the relative order of the others.
    ///
    /// Returns `true` if the identity was present.
    pub fn remove(&mut self, identity: &str) -> bool {
        let Some(position) = self.identities.iter().position(|known| known == identity) else {
            return false;
        };

        self.identities.remove(position);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.identities.clone()
    }
}

impl<S: AsRef<str>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = AllowList::new();
        for identity in iter {
            list.insert(identity.as_ref());
        }
        list
    }
}
