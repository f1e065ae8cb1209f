use crate::entities::profile_entity as profiles;
use crate::error::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait};

/// 管理员鉴权：登录态由中间件校验，这里只查询 profiles.is_admin
#[derive(Clone)]
pub struct AuthorizationService {
    pool: DatabaseConnection,
}

impl AuthorizationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 返回调用者的 profile，非管理员返回 `Forbidden`
    pub async fn require_admin(&self, user_id: i64) -> AppResult<profiles::Model> {
        match profiles::Entity::find_by_id(user_id).one(&self.pool).await? {
            Some(profile) if profile.is_admin => Ok(profile),
            Some(_) => {
                log::warn!("User {user_id} attempted an admin operation without admin rights");
                Err(AppError::Forbidden)
            }
            None => {
                log::warn!("Admin operation requested by unknown profile {user_id}");
                Err(AppError::Forbidden)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_test_db;
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Set};

    async fn insert_profile(pool: &DatabaseConnection, is_admin: bool) -> i64 {
        profiles::ActiveModel {
            full_name: Set(Some("Test User".to_string())),
            email: Set(None),
            is_admin: Set(is_admin),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_require_admin() {
        let pool = connect_test_db().await;
        let admin = insert_profile(&pool, true).await;
        let customer = insert_profile(&pool, false).await;
        let service = AuthorizationService::new(pool);

        assert_eq!(service.require_admin(admin).await.unwrap().id, admin);
        assert!(matches!(
            service.require_admin(customer).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service.require_admin(9999).await,
            Err(AppError::Forbidden)
        ));
    }
}
