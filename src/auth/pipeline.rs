use chrono::Utc;
use std::collections::HashMap;

use super::guards::{self, Authorship};
use super::token::TokenService;
use crate::{
    config::Env,
    errors::AuthError,
    models::{BlogEntry, User, UserRole},
    repository::RepositoryState,
};

/// OwnershipCheck
///
/// The two ownership shapes an operation can declare. `param` names the path
/// parameter carrying the target id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipCheck {
    /// The target is the identity's own record (`identity.id == target`).
    SelfRecord { param: &'static str },
    /// The target is a blog entry that must have been authored by the identity.
    AuthoredEntry { param: &'static str },
}

/// Requirements
///
/// The static authorization declaration of one operation. Declaring a role set or an
/// ownership check implies authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    authenticate: bool,
    roles: Option<&'static [UserRole]>,
    ownership: Option<OwnershipCheck>,
}

impl Requirements {
    pub const fn public() -> Self {
        Self {
            authenticate: false,
            roles: None,
            ownership: None,
        }
    }

    pub const fn authenticated() -> Self {
        Self {
            authenticate: true,
            roles: None,
            ownership: None,
        }
    }

    pub const fn with_roles(self, roles: &'static [UserRole]) -> Self {
        Self {
            authenticate: true,
            roles: Some(roles),
            ownership: self.ownership,
        }
    }

    pub const fn with_ownership(self, check: OwnershipCheck) -> Self {
        Self {
            authenticate: true,
            roles: self.roles,
            ownership: Some(check),
        }
    }

    pub fn requires_authentication(&self) -> bool {
        self.authenticate
    }

    pub fn roles(&self) -> Option<&'static [UserRole]> {
        self.roles
    }

    pub fn ownership(&self) -> Option<OwnershipCheck> {
        self.ownership
    }
}

/// Everything the transport hands the pipeline for one request.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    /// Operation name, used only for logging.
    pub operation: &'a str,
    /// The raw bearer token, if the request carried one.
    pub token: Option<&'a str>,
    pub params: &'a HashMap<String, String>,
}

/// What an allowed request carries on to its handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grant {
    /// `None` only for operations that do not require authentication.
    pub identity: Option<User>,
    /// The entry loaded by an `AuthoredEntry` check.
    pub entry: Option<BlogEntry>,
}

/// Decision
///
/// Produced fresh for every request and never cached.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow(Grant),
    Deny(AuthError),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn reason(&self) -> Option<AuthError> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }
}

/// Stage
///
/// How far a request got through the pipeline; recorded on every denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Authenticated,
    RoleChecked,
    OwnershipChecked,
}

/// AuthPipeline
///
/// Runs, strictly in order: credential verification, identity resolution, the role
/// check, the ownership check. The first failure ends the run; later checks are never
/// started.
#[derive(Clone)]
pub struct AuthPipeline {
    repo: RepositoryState,
    tokens: TokenService,
    env: Env,
}

impl AuthPipeline {
    pub fn new(repo: RepositoryState, tokens: TokenService, env: Env) -> Self {
        Self { repo, tokens, env }
    }

    pub async fn authorize(
        &self,
        requirements: &Requirements,
        request: &AccessRequest<'_>,
    ) -> Decision {
        self.authorize_at(requirements, request, Utc::now().timestamp())
            .await
    }

    /// authorize_at
    ///
    /// Same as `authorize`, evaluating token expiry against `now` (Unix seconds).
    ///
    /// # Panics
    /// In `Env::Local`, panics when an ownership check names a path parameter the
    /// request does not carry. In `Env::Production` that case is logged and denied as
    /// `Forbidden`.
    pub async fn authorize_at(
        &self,
        requirements: &Requirements,
        request: &AccessRequest<'_>,
        now: i64,
    ) -> Decision {
        match self.evaluate(requirements, request, now).await {
            Ok(grant) => Decision::Allow(grant),
            Err((stage, AuthError::MisconfiguredRequirement)) => {
                tracing::error!(
                    operation = request.operation,
                    ?stage,
                    ownership = ?requirements.ownership,
                    "ownership check declared but its path parameter is missing"
                );
                if self.env == Env::Local {
                    panic!(
                        "operation `{}` declares {:?} but the request has no such path parameter",
                        request.operation, requirements.ownership
                    );
                }
                Decision::Deny(AuthError::Forbidden)
            }
            Err((stage, reason)) => {
                tracing::debug!(operation = request.operation, ?stage, %reason, "access denied");
                Decision::Deny(reason)
            }
        }
    }

    async fn evaluate(
        &self,
        requirements: &Requirements,
        request: &AccessRequest<'_>,
        now: i64,
    ) -> Result<Grant, (Stage, AuthError)> {
        if !requirements.authenticate {
            return Ok(Grant::default());
        }

        // START -> AUTHENTICATED
        let at = |stage: Stage| move |reason: AuthError| (stage, reason);
        let token = request
            .token
            .ok_or((Stage::Start, AuthError::Unauthenticated))?;
        let verified = self.tokens.verify_at(token, now).map_err(at(Stage::Start))?;
        let identity = self
            .resolve(verified.subject_id)
            .await
            .map_err(at(Stage::Start))?;

        // AUTHENTICATED -> ROLE_CHECKED
        if let Some(roles) = requirements.roles {
            if !guards::has_role(&identity, roles) {
                return Err((Stage::Authenticated, AuthError::Forbidden));
            }
        }

        // ROLE_CHECKED -> OWNERSHIP_CHECKED
        let entry = match requirements.ownership {
            Some(check) => self
                .check_ownership(check, &identity, request.params)
                .await
                .map_err(at(Stage::RoleChecked))?,
            None => None,
        };

        tracing::trace!(
            operation = request.operation,
            stage = ?Stage::OwnershipChecked,
            user_id = identity.id,
            "access allowed"
        );
        Ok(Grant {
            identity: Some(identity),
            entry,
        })
    }

    /// resolve
    ///
    /// Maps a verified subject id to its live identity. A missing identity (deleted after
    /// the token was issued, or an unreachable store) is `Unauthenticated`, never
    /// `NotFound`.
    pub async fn resolve(&self, subject_id: i64) -> Result<User, AuthError> {
        self.repo
            .get_user(subject_id)
            .await
            .ok_or(AuthError::Unauthenticated)
    }

    async fn check_ownership(
        &self,
        check: OwnershipCheck,
        identity: &User,
        params: &HashMap<String, String>,
    ) -> Result<Option<BlogEntry>, AuthError> {
        match check {
            OwnershipCheck::SelfRecord { param } => {
                // An id that is not an integer cannot be the identity's own.
                let Ok(target_id) = path_param(params, param)?.parse::<i64>() else {
                    return Err(AuthError::Forbidden);
                };
                if guards::is_self(self.repo.as_ref(), identity, target_id).await? {
                    Ok(None)
                } else {
                    Err(AuthError::Forbidden)
                }
            }
            OwnershipCheck::AuthoredEntry { param } => {
                let Ok(entry_id) = path_param(params, param)?.parse::<i64>() else {
                    return Err(AuthError::NotFound);
                };
                match guards::is_author(self.repo.as_ref(), identity, entry_id).await? {
                    Authorship::Author(entry) => Ok(Some(entry)),
                    Authorship::NotAuthor => Err(AuthError::Forbidden),
                }
            }
        }
    }
}

fn path_param<'a>(
    params: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, AuthError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or(AuthError::MisconfiguredRequirement)
}
