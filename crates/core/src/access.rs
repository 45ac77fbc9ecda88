//! Role-based page authorization, independent of any routing framework.

use crate::model::Role;

/// Screens served to signed-in users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    AdminDashboard,
    AdminResults,
    AdminTopics,
    AdminCalendar,
    AdminUsers,
    UserDashboard,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::AdminDashboard,
        Resource::AdminResults,
        Resource::AdminTopics,
        Resource::AdminCalendar,
        Resource::AdminUsers,
        Resource::UserDashboard,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Resource::AdminDashboard => "/admin/dashboard",
            Resource::AdminResults => "/admin/results",
            Resource::AdminTopics => "/admin/topics",
            Resource::AdminCalendar => "/admin/calendar",
            Resource::AdminUsers => "/admin/users",
            Resource::UserDashboard => "/user/dashboard",
        }
    }

    /// Resolve a request path; a trailing slash is ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        Self::ALL.into_iter().find(|r| r.path() == path)
    }

    /// The single role allowed to open this resource.
    #[must_use]
    pub fn required_role(self) -> Role {
        match self {
            Resource::UserDashboard => Role::User,
            _ => Role::Admin,
        }
    }
}

#[must_use]
pub fn is_allowed(role: Role, resource: Resource) -> bool {
    resource.required_role() == role
}

/// Where a user lands after signing in.
#[must_use]
pub fn landing_resource(role: Role) -> Resource {
    match role {
        Role::Admin => Resource::AdminDashboard,
        Role::User => Resource::UserDashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_only_see_admin_pages() {
        for resource in Resource::ALL {
            let admin_page = resource.path().starts_with("/admin/");
            assert_eq!(is_allowed(Role::Admin, resource), admin_page, "{resource:?}");
            assert_eq!(is_allowed(Role::User, resource), !admin_page, "{resource:?}");
        }
    }

    #[test]
    fn paths_resolve() {
        assert_eq!(
            Resource::from_path("/admin/calendar/"),
            Some(Resource::AdminCalendar)
        );
        assert_eq!(Resource::from_path("/user/dashboard"), Some(Resource::UserDashboard));
        assert_eq!(Resource::from_path("/login"), None);
        assert_eq!(Resource::from_path("/"), None);
    }

    #[test]
    fn landing_matches_role() {
        assert!(is_allowed(Role::Admin, landing_resource(Role::Admin)));
        assert!(is_allowed(Role::User, landing_resource(Role::User)));
    }
}
