//! Role-scoped menu table.
//!
//! One static declarative table maps each console surface to its labels and
//! the roles allowed to enter it. The `menu` command and command gating both
//! consult [`visible`]; nothing builds menu entries ad hoc.

use crate::identity::RoleKind;

const OFFICE: &[RoleKind] = &[RoleKind::Administrator, RoleKind::Staff];
const OFFICE_AND_CLIENT: &[RoleKind] =
    &[RoleKind::Administrator, RoleKind::Staff, RoleKind::Client];
const EVERYONE: &[RoleKind] = &[
    RoleKind::Administrator,
    RoleKind::Staff,
    RoleKind::Client,
    RoleKind::Visitor,
];

#[derive(Debug)]
pub struct MenuItem {
    pub id: &'static str,
    pub icon: &'static str,
    label: &'static str,
    /// The client role sees possessive wording on shared surfaces.
    client_label: Option<&'static str>,
    allowed: &'static [RoleKind],
}

impl MenuItem {
    pub fn label(&self, role: RoleKind) -> &'static str {
        match role {
            RoleKind::Client => self.client_label.unwrap_or(self.label),
            _ => self.label,
        }
    }

    pub fn allows(&self, role: RoleKind) -> bool {
        self.allowed.contains(&role)
    }
}

pub static MENU: &[MenuItem] = &[
    MenuItem {
        id: "cases",
        icon: "⚖",
        label: "القضايا",
        client_label: Some("قضاياي"),
        allowed: OFFICE_AND_CLIENT,
    },
    MenuItem {
        id: "archive",
        icon: "🗄",
        label: "أرشيف القضايا",
        client_label: None,
        allowed: &[RoleKind::Administrator],
    },
    MenuItem {
        id: "clients",
        icon: "👥",
        label: "الموكلون",
        client_label: Some("ملفي الشخصي"),
        allowed: OFFICE_AND_CLIENT,
    },
    MenuItem {
        id: "ledger",
        icon: "💰",
        label: "الحسابات",
        client_label: Some("فواتيري"),
        allowed: OFFICE_AND_CLIENT,
    },
    MenuItem {
        id: "drafts",
        icon: "📄",
        label: "تحرير المستندات",
        client_label: None,
        allowed: OFFICE,
    },
    MenuItem {
        id: "library",
        icon: "📚",
        label: "المكتبة القانونية",
        client_label: None,
        allowed: EVERYONE,
    },
    MenuItem {
        id: "advisory",
        icon: "🤖",
        label: "المستشار الذكي",
        client_label: None,
        allowed: EVERYONE,
    },
];

/// The table rows `role` may enter, in table order.
pub fn visible(role: RoleKind) -> Vec<&'static MenuItem> {
    MENU.iter().filter(|item| item.allows(role)).collect()
}

/// Whether `role` may enter the surface with this menu id. Unknown ids are
/// closed to everyone.
pub fn allows(id: &str, role: RoleKind) -> bool {
    MENU.iter().any(|item| item.id == id && item.allows(role))
}

#[cfg(test)]
mod tests {
    use super::{MENU, allows, visible};
    use crate::identity::RoleKind;

    #[test]
    fn menu_ids_are_unique() {
        let mut ids: Vec<&str> = MENU.iter().map(|item| item.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), MENU.len());
    }

    #[test]
    fn visitor_browses_only_the_public_surfaces() {
        let ids: Vec<&str> = visible(RoleKind::Visitor)
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec!["library", "advisory"]);
    }

    #[test]
    fn client_sees_possessive_labels_on_shared_surfaces() {
        let items = visible(RoleKind::Client);
        let labels: Vec<&str> = items
            .iter()
            .map(|item| item.label(RoleKind::Client))
            .collect();
        assert!(labels.contains(&"قضاياي"));
        assert!(labels.contains(&"فواتيري"));
        assert!(!labels.contains(&"القضايا"));
        assert!(items.iter().all(|item| item.id != "archive"));
    }

    #[test]
    fn archive_is_administrator_only() {
        assert!(allows("archive", RoleKind::Administrator));
        assert!(!allows("archive", RoleKind::Staff));
        assert!(!allows("archive", RoleKind::Client));
        assert!(!allows("unknown-surface", RoleKind::Administrator));
    }

    #[test]
    fn administrator_sees_the_whole_table() {
        assert_eq!(visible(RoleKind::Administrator).len(), MENU.len());
    }

    #[test]
    fn office_labels_are_shared_by_administrator_and_staff() {
        for item in MENU {
            assert_eq!(
                item.label(RoleKind::Administrator),
                item.label(RoleKind::Staff)
            );
        }
    }
}
