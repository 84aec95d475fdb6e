//! Authorization declarations for every protected operation.
//!
//! Each marker type is used as `Authorized<Marker>` in its handler's signature.

use super::{
    Operation,
    pipeline::{OwnershipCheck, Requirements},
};
use crate::models::UserRole;

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

/// `GET /users`
pub struct ListUsers;

impl Operation for ListUsers {
    const NAME: &'static str = "list_users";
    const REQUIREMENTS: Requirements = Requirements::authenticated().with_roles(ADMIN_ONLY);
}

/// `PUT /users/{id}`
pub struct UpdateUser;

impl Operation for UpdateUser {
    const NAME: &'static str = "update_user";
    const REQUIREMENTS: Requirements = Requirements::authenticated()
        .with_ownership(OwnershipCheck::SelfRecord { param: "id" });
}

/// `PUT /users/{id}/role`
pub struct UpdateUserRole;

impl Operation for UpdateUserRole {
    const NAME: &'static str = "update_user_role";
    const REQUIREMENTS: Requirements = Requirements::authenticated().with_roles(ADMIN_ONLY);
}

/// `DELETE /users/{id}`
pub struct DeleteUser;

impl Operation for DeleteUser {
    const NAME: &'static str = "delete_user";
    const REQUIREMENTS: Requirements = Requirements::authenticated().with_roles(ADMIN_ONLY);
}

/// `POST /blogs`
pub struct CreateBlogEntry;

impl Operation for CreateBlogEntry {
    const NAME: &'static str = "create_blog_entry";
    const REQUIREMENTS: Requirements = Requirements::authenticated();
}

/// `PUT /blogs/{id}`
pub struct UpdateBlogEntry;

impl Operation for UpdateBlogEntry {
    const NAME: &'static str = "update_blog_entry";
    const REQUIREMENTS: Requirements = Requirements::authenticated()
        .with_ownership(OwnershipCheck::AuthoredEntry { param: "id" });
}

/// `DELETE /blogs/{id}`
pub struct DeleteBlogEntry;

impl Operation for DeleteBlogEntry {
    const NAME: &'static str = "delete_blog_entry";
    const REQUIREMENTS: Requirements = Requirements::authenticated()
        .with_ownership(OwnershipCheck::AuthoredEntry { param: "id" });
}
