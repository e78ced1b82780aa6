use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: Uuid::new_v4(),
            email: format!("{username}@example.com"),
            username,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_name: String,
    pub amount: i64,
}

impl Order {
    pub fn for_user(user: &User, product_name: impl Into<String>, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            product_name: product_name.into(),
            amount,
        }
    }
}
