use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Directed graph of role implications (`ROLE_ADMIN` implies `ROLE_USER`, ...)
///
/// Cycles are tolerated; expansion visits every role at most once.
#[derive(Debug, Clone, Default)]
pub struct RoleHierarchy {
    implied: HashMap<String, Vec<String>>,
}

impl RoleHierarchy {
    pub fn new(implied: HashMap<String, Vec<String>>) -> Self {
        Self { implied }
    }

    /// Declare the roles `role` directly implies
    pub fn with_role<I, S>(mut self, role: &str, implies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implied
            .entry(role.to_string())
            .or_default()
            .extend(implies.into_iter().map(Into::into));
        self
    }

    pub fn implied_roles(&self, role: &str) -> &[String] {
        self.implied.get(role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Transitive closure of `roles`, sorted and deduplicated; empty roles are dropped
    pub fn expand_roles<S: AsRef<str>>(&self, roles: &[S]) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = roles
            .iter()
            .map(|r| r.as_ref().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        while let Some(role) = queue.pop_front() {
            if !visited.insert(role.clone()) {
                continue;
            }
            for implied in self.implied_roles(&role) {
                if !implied.is_empty() && !visited.contains(implied) {
                    queue.push_back(implied.clone());
                }
            }
        }

        visited.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitive_expansion() {
        let hierarchy = RoleHierarchy::default()
            .with_role("ROLE_SUPER_ADMIN", ["ROLE_ADMIN"])
            .with_role("ROLE_ADMIN", ["ROLE_EDITOR", "ROLE_USER"])
            .with_role("ROLE_EDITOR", ["ROLE_USER"]);

        assert_eq!(
            hierarchy.expand_roles(&["ROLE_SUPER_ADMIN"]),
            vec!["ROLE_ADMIN", "ROLE_EDITOR", "ROLE_SUPER_ADMIN", "ROLE_USER"]
        );
        assert_eq!(hierarchy.expand_roles(&["ROLE_USER"]), vec!["ROLE_USER"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let hierarchy = RoleHierarchy::default()
            .with_role("A", ["B"])
            .with_role("B", ["C"])
            .with_role("C", ["A"]);
        assert_eq!(hierarchy.expand_roles(&["B"]), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_roles_are_skipped() {
        let hierarchy = RoleHierarchy::default().with_role("A", ["", "B"]);
        assert_eq!(hierarchy.expand_roles(&["", "A"]), vec!["A", "B"]);
        assert!(hierarchy.expand_roles::<&str>(&[]).is_empty());
    }
}
