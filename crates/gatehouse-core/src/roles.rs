//! Role algebra: a total order over role identifiers.
//!
//! Privilege comparison between principals reduces to comparing
//! numeric ranks. Multi-role strings (comma-joined) compare by the
//! maximum rank among their tokens. Comparing against an unparseable
//! role yields an explicit `None` rather than a silent `false`.

use serde::{Deserialize, Serialize};

/// Closed set of roles, ordered by privilege.
///
/// Variant order matches rank order, so the derived `Ord` agrees with
/// [`Role::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    AdminSale,
    AdminIt,
    Admin,
}

pub const ADMIN_ROLES: [Role; 3] = [Role::Admin, Role::AdminSale, Role::AdminIt];

impl Role {
    /// Numeric privilege rank.
    pub fn rank(self) -> i32 {
        match self {
            Role::User => 1,
            Role::AdminSale => 10,
            Role::AdminIt => 20,
            Role::Admin => 30,
        }
    }

    /// Parse a single role identifier. Unrecognized input yields
    /// `None`, never a panic or a default.
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim() {
            "USER" => Some(Role::User),
            "SALE_ADMIN" => Some(Role::AdminSale),
            "IT_ADMIN" => Some(Role::AdminIt),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::AdminSale => "SALE_ADMIN",
            Role::AdminIt => "IT_ADMIN",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_admin(self) -> bool {
        ADMIN_ROLES.contains(&self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum rank across a comma-joined role list.
///
/// Returns `None` when the list is empty or any token is
/// unrecognized, making incomparability explicit for callers.
pub fn max_rank(roles: &str) -> Option<i32> {
    let mut max = None;
    for token in roles.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let rank = Role::parse(token)?.rank();
        max = Some(max.map_or(rank, |m: i32| m.max(rank)));
    }
    max
}

/// Compare two comma-joined role lists by maximum rank.
///
/// `Some(d)` with `d > 0` means `a` outranks `b`, `d < 0` the
/// reverse, `d == 0` equal privilege. `None` means the sides are
/// incomparable (either list failed to parse); callers must branch on
/// that case explicitly.
pub fn compare(a: &str, b: &str) -> Option<i32> {
    Some(max_rank(a)? - max_rank(b)?)
}

/// True when any token of the list is an admin role.
pub fn is_admin(roles: &str) -> bool {
    roles
        .split(',')
        .filter_map(Role::parse)
        .any(Role::is_admin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_matches_derived_ord() {
        assert!(Role::User < Role::AdminSale);
        assert!(Role::AdminSale < Role::AdminIt);
        assert!(Role::AdminIt < Role::Admin);
        assert_eq!(Role::Admin.rank(), 30);
        assert_eq!(Role::User.rank(), 1);
    }

    #[test]
    fn compare_is_antisymmetric() {
        let all = ["USER", "SALE_ADMIN", "IT_ADMIN", "ADMIN"];
        for a in all {
            for b in all {
                let ab = compare(a, b).unwrap();
                let ba = compare(b, a).unwrap();
                assert_eq!(ab, -ba, "compare({a},{b})");
            }
            assert_eq!(compare(a, a), Some(0));
        }
    }

    #[test]
    fn multi_role_uses_max_rank() {
        assert_eq!(max_rank("USER,IT_ADMIN"), Some(20));
        assert_eq!(compare("USER,ADMIN", "IT_ADMIN"), Some(10));
        assert_eq!(compare("USER", "USER,SALE_ADMIN"), Some(-9));
    }

    #[test]
    fn unknown_roles_are_incomparable() {
        assert_eq!(Role::parse("ROOT"), None);
        assert_eq!(max_rank("USER,ROOT"), None);
        assert_eq!(compare("USER", "ROOT"), None);
        assert_eq!(compare("", "USER"), None);
    }

    #[test]
    fn admin_membership() {
        assert!(Role::Admin.is_admin());
        assert!(Role::AdminIt.is_admin());
        assert!(Role::AdminSale.is_admin());
        assert!(!Role::User.is_admin());
        assert!(is_admin("USER,SALE_ADMIN"));
        assert!(!is_admin("USER"));
        assert!(!is_admin("ROOT"));
    }
}
