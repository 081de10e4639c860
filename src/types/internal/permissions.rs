use crate::types::db::{page, role_permission, user_permission_override};

/// The four actions a permission check can be scoped to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fully resolved permissions for one page. Every field is a concrete
/// boolean; there is no "unknown" at this level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub view: bool,
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
}

impl PermissionSet {
    pub const NONE: PermissionSet = PermissionSet {
        view: false,
        create: false,
        edit: false,
        delete: false,
    };

    pub const ALL: PermissionSet = PermissionSet {
        view: true,
        create: true,
        edit: true,
        delete: true,
    };

    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }
}

impl From<&role_permission::Model> for PermissionSet {
    fn from(grant: &role_permission::Model) -> Self {
        PermissionSet {
            view: grant.can_view,
            create: grant.can_create,
            edit: grant.can_edit,
            delete: grant.can_delete,
        }
    }
}

/// Tri-state user override for one page. `None` defers to the role grant
/// for that action only; `Some` replaces it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OverrideSet {
    pub view: Option<bool>,
    pub create: Option<bool>,
    pub edit: Option<bool>,
    pub delete: Option<bool>,
}

impl OverrideSet {
    pub const INHERIT: OverrideSet = OverrideSet {
        view: None,
        create: None,
        edit: None,
        delete: None,
    };

    /// Merge this override onto a role-level base, per action.
    pub fn apply_over(&self, base: PermissionSet) -> PermissionSet {
        PermissionSet {
            view: self.view.unwrap_or(base.view),
            create: self.create.unwrap_or(base.create),
            edit: self.edit.unwrap_or(base.edit),
            delete: self.delete.unwrap_or(base.delete),
        }
    }
}

impl From<&user_permission_override::Model> for OverrideSet {
    fn from(row: &user_permission_override::Model) -> Self {
        OverrideSet {
            view: row.can_view,
            create: row.can_create,
            edit: row.can_edit,
            delete: row.can_delete,
        }
    }
}

/// Resolved permissions for one active page, in menu display order.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectivePermissions {
    pub page_id: i32,
    pub page_name: String,
    pub display_name: String,
    pub route: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub permissions: PermissionSet,
}

impl EffectivePermissions {
    pub fn new(page: &page::Model, permissions: PermissionSet) -> Self {
        EffectivePermissions {
            page_id: page.id,
            page_name: page.name.clone(),
            display_name: page.display_name.clone(),
            route: page.route.clone(),
            icon: page.icon.clone(),
            sort_order: page.sort_order,
            permissions,
        }
    }
}
