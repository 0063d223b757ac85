use crate::platform::{RoleId, UserId};
use crate::store::models::GroupConfig;

/// The member performing an action, as delivered with a command or reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role_ids: Vec<RoleId>,
}

impl Actor {
    pub fn new(user_id: impl Into<UserId>, role_ids: Vec<RoleId>) -> Self {
        Self {
            user_id: user_id.into(),
            role_ids,
        }
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|r| r == role_id)
    }
}

/// The single moderator role that unlocks every group action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRole(pub RoleId);

impl ModRole {
    pub fn is_mod(&self, actor: &Actor) -> bool {
        actor.has_role(&self.0)
    }

    /// Owner of the group or request, or a moderator.
    pub fn may_manage(&self, actor: &Actor, group: &GroupConfig) -> bool {
        is_owner(actor, group) || self.is_mod(actor)
    }
}

pub fn is_owner(actor: &Actor, group: &GroupConfig) -> bool {
    group.owner_id == actor.user_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(owner: &str) -> GroupConfig {
        GroupConfig {
            owner_id: owner.into(),
            course: "1142".into(),
            name: "x".into(),
            semester: "sose22".into(),
            is_open: true,
            channel_id: None,
            last_rename: None,
        }
    }

    #[test]
    fn test_mod_role() {
        let mods = ModRole("900".into());
        assert!(mods.is_mod(&Actor::new("1", vec!["5".into(), "900".into()])));
        assert!(!mods.is_mod(&Actor::new("1", vec!["5".into()])));
        assert!(!mods.is_mod(&Actor::new("1", vec![])));
    }

    #[test]
    fn test_may_manage() {
        let mods = ModRole("900".into());
        let g = group("7");
        assert!(mods.may_manage(&Actor::new("7", vec![]), &g));
        assert!(mods.may_manage(&Actor::new("8", vec!["900".into()]), &g));
        assert!(!mods.may_manage(&Actor::new("8", vec![]), &g));
    }
}
