/// Router Module Index
///
/// Groups the routes by who can reach them. Access control itself is not applied at
/// the router level: every protected handler takes an `Authorized<Operation>` argument,
/// so the declaration travels with the handler and not with the router it is mounted on.

/// Routes accessible to anyone, with or without a token.
pub mod public;

/// Routes that require a valid token, plus self/author ownership where declared.
pub mod authenticated;

/// Routes restricted to the `admin` role.
pub mod admin;
