use sqlx::Row;
use uuid::Uuid;

use handyman::{Executor, TransactionResult};

use super::entities::{Order, User};

/// User Repository running inside a unit of work
#[derive(Clone)]
pub struct UserRepository {
    executor: Executor,
}

impl UserRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn create(&self, user: &User) -> TransactionResult<()> {
        let mut tx = self.executor.acquire().await?;
        sqlx::query("INSERT INTO users (id, username, email) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> TransactionResult<Option<User>> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query("SELECT id, username, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            username: r.get("username"),
            email: r.get("email"),
        }))
    }
}

/// Order Repository running inside a unit of work
#[derive(Clone)]
pub struct OrderRepository {
    executor: Executor,
}

impl OrderRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn create(&self, order: &Order) -> TransactionResult<()> {
        let mut tx = self.executor.acquire().await?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, product_name, amount) VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.product_name)
        .bind(order.amount)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
