use crate::models::{Capability, Role};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

static VIEWER_GRANTS: Lazy<BTreeSet<Capability>> = Lazy::new(BTreeSet::new);

static ANALYST_GRANTS: Lazy<BTreeSet<Capability>> = Lazy::new(|| {
    let mut grants = VIEWER_GRANTS.clone();
    grants.extend([Capability::DataExport, Capability::AlertsConfigure]);
    grants
});

static OPERATOR_GRANTS: Lazy<BTreeSet<Capability>> = Lazy::new(|| {
    let mut grants = ANALYST_GRANTS.clone();
    grants.extend([
        Capability::WidgetCreate,
        Capability::WidgetResize,
        Capability::DataImport,
        Capability::AlertsDismiss,
    ]);
    grants
});

static ADMIN_GRANTS: Lazy<BTreeSet<Capability>> = Lazy::new(|| {
    let mut grants = OPERATOR_GRANTS.clone();
    grants.extend([Capability::WidgetDelete, Capability::UsersManage]);
    grants
});

static PERMISSION_MATRIX: Lazy<BTreeMap<Role, &'static BTreeSet<Capability>>> = Lazy::new(|| {
    BTreeMap::from([
        (Role::Viewer, &*VIEWER_GRANTS),
        (Role::Analyst, &*ANALYST_GRANTS),
        (Role::Operator, &*OPERATOR_GRANTS),
        (Role::Admin, &*ADMIN_GRANTS),
    ])
});

pub fn grants_for(role: Role) -> &'static BTreeSet<Capability> {
    PERMISSION_MATRIX
        .get(&role)
        .copied()
        .unwrap_or(&VIEWER_GRANTS)
}

pub fn has_capability(role: Role, capability: Capability) -> bool {
    grants_for(role).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::{grants_for, has_capability};
    use crate::models::{Capability, Role};

    const TIER_ORDER: [Role; 4] = [Role::Viewer, Role::Analyst, Role::Operator, Role::Admin];

    #[test]
    fn grant_sets_are_monotonic_supersets() {
        for pair in TIER_ORDER.windows(2) {
            let lower = grants_for(pair[0]);
            let higher = grants_for(pair[1]);
            assert!(
                lower.is_subset(higher),
                "{} grants should be a subset of {} grants",
                pair[0].as_str(),
                pair[1].as_str()
            );
            assert!(pair[0].tier() < pair[1].tier());
        }
    }

    #[test]
    fn viewer_has_no_grants() {
        assert!(grants_for(Role::Viewer).is_empty());
    }

    #[test]
    fn tier_specific_additions() {
        assert!(has_capability(Role::Analyst, Capability::DataExport));
        assert!(!has_capability(Role::Analyst, Capability::WidgetCreate));
        assert!(has_capability(Role::Operator, Capability::AlertsDismiss));
        assert!(!has_capability(Role::Operator, Capability::UsersManage));
        assert!(has_capability(Role::Admin, Capability::WidgetDelete));
    }
}
