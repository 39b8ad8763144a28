#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub admin: Option<bool>,
    pub status: Option<String>,
}
