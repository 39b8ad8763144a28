use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
}

/// Full replacement of a group's member list. Members not listed here are
/// removed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembershipUpdate {
    pub group_id: i64,
    pub member_user_ids: BTreeSet<i64>,
    pub group_name: Option<String>,
}

impl GroupMembershipUpdate {
    pub fn new(group_id: i64, member_user_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            group_id,
            member_user_ids: member_user_ids.into_iter().collect(),
            group_name: None,
        }
    }
}
